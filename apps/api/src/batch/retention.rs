//! Session directory retention.
//!
//! Every upload leaves a `<output_root>/<uuid>/` directory behind for the download
//! endpoint. A background task removes the ones older than the configured window.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Deletes session directories under `root` last modified at least `max_age` ago.
///
/// Only entries named like a session id are considered. Returns how many were removed.
pub async fn sweep_expired(root: &Path, max_age: Duration) -> Result<usize, AppError> {
    let unavailable =
        |e: std::io::Error| AppError::ResourceUnavailable(format!("{}: {e}", root.display()));

    let mut entries = tokio::fs::read_dir(root).await.map_err(unavailable)?;
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
        let name = entry.file_name();
        let is_session = name
            .to_str()
            .is_some_and(|n| Uuid::parse_str(n).is_ok());
        if !is_session {
            continue;
        }
        let metadata = entry.metadata().await.map_err(unavailable)?;
        if !metadata.is_dir() {
            continue;
        }
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => {
                debug!(session = ?name, age_secs = age.as_secs(), "Expired session removed");
                removed += 1;
            }
            Err(e) => warn!(session = ?name, "Cannot remove expired session: {e}"),
        }
    }
    Ok(removed)
}

/// Sweeps `root` at startup and then every `SWEEP_INTERVAL`.
pub async fn retention_task(root: PathBuf, max_age: Duration) {
    let mut ticker = time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        match sweep_expired(&root, max_age).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Expired payslip sessions removed"),
            Err(e) => error!("Session sweep failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn session_dir(root: &Path) -> PathBuf {
        let dir = root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("Amit_Kumar_December.pdf"), b"%PDF-")
            .await
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_sessions_only() {
        let root = tempfile::tempdir().unwrap();
        let session = session_dir(root.path()).await;
        let unrelated = root.path().join("keep-me");
        tokio::fs::create_dir_all(&unrelated).await.unwrap();
        let stray_file = root.path().join(Uuid::new_v4().to_string());
        tokio::fs::write(&stray_file, b"not a session").await.unwrap();

        let removed = sweep_expired(root.path(), Duration::ZERO).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!session.exists());
        assert!(unrelated.exists());
        assert!(stray_file.exists());
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_sessions() {
        let root = tempfile::tempdir().unwrap();
        let session = session_dir(root.path()).await;

        let removed = sweep_expired(root.path(), Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(removed, 0);
        assert!(session.join("Amit_Kumar_December.pdf").exists());
    }

    #[tokio::test]
    async fn test_sweep_of_missing_root_is_resource_unavailable() {
        let root = tempfile::tempdir().unwrap();
        let err = sweep_expired(&root.path().join("gone"), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable(_)));
    }
}
