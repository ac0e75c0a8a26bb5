//! In-memory zip packaging of a rendered batch.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::AppError;
use crate::layout::RenderedDocument;

pub const ARCHIVE_NAME: &str = "payslips.zip";

/// Packs documents into a zip archive. Entries keep input order; for colliding
/// file names only the last document is stored, matching what lands on disk.
///
/// Refuses to build an archive with no entries.
pub fn build_archive(documents: &[RenderedDocument]) -> Result<Vec<u8>, AppError> {
    if documents.is_empty() {
        return Err(AppError::Validation(
            "Refusing to build an empty archive".to_string(),
        ));
    }

    let last_index: HashMap<&str, usize> = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| (doc.file_name.as_str(), i))
        .collect();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (i, doc) in documents.iter().enumerate() {
        if last_index.get(doc.file_name.as_str()) != Some(&i) {
            continue;
        }
        zip.start_file(doc.file_name.as_str(), options)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("zip entry {}: {e}", doc.file_name)))?;
        zip.write_all(&doc.bytes)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("zip write {}: {e}", doc.file_name)))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("zip finish: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Read;
    use zip::ZipArchive;

    fn doc(name: &str, bytes: &[u8]) -> RenderedDocument {
        RenderedDocument {
            row: 6,
            employee: name.to_string(),
            basic_salary: Decimal::ZERO,
            net: Decimal::ZERO,
            file_name: format!("{name}_May.pdf"),
            bytes: bytes.to_vec(),
        }
    }

    fn entries(archive: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).unwrap();
                (file.name().to_string(), bytes)
            })
            .collect()
    }

    #[test]
    fn test_archive_keeps_input_order() {
        let archive = build_archive(&[doc("Amit", b"a"), doc("Ravi", b"r")]).unwrap();
        let names: Vec<String> = entries(archive).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Amit_May.pdf", "Ravi_May.pdf"]);
    }

    #[test]
    fn test_archive_collision_keeps_last_document() {
        let archive = build_archive(&[doc("Amit", b"first"), doc("Amit", b"second")]).unwrap();
        let entries = entries(archive);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, b"second".to_vec());
    }

    #[test]
    fn test_empty_archive_is_refused() {
        assert!(matches!(build_archive(&[]), Err(AppError::Validation(_))));
    }
}
