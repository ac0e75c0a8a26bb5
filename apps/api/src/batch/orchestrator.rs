//! Batch orchestration: records in, rendered documents and a report out.
//!
//! # Policy
//! Adapter-level structural errors (`MalformedInput`) always abort the batch before
//! anything renders. Row-level `InvalidValue` and per-record `Render` errors abort the
//! batch in fail-fast mode and become failure entries in isolate mode.
//!
//! # Ordering
//! Renders fan out onto the blocking pool, bounded by a semaphore, but the join
//! handles are awaited in input order, so output order never depends on completion
//! order. Files are written afterwards, sequentially, which makes colliding output
//! names resolve to the last record in input order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::layout::{render_payslip, RenderedDocument, Theme};
use crate::payroll::models::{EmployeeRecord, PayPeriod};

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Maximum renders in flight at once. Clamped to at least 1.
    pub concurrency: usize,
    pub fail_fast: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fail_fast: false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Report types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub row: usize,
    pub employee: String,
    pub file_name: String,
    pub basic_salary: Decimal,
    pub net: Decimal,
}

impl From<&RenderedDocument> for DocumentSummary {
    fn from(doc: &RenderedDocument) -> Self {
        Self {
            row: doc.row,
            employee: doc.employee.clone(),
            file_name: doc.file_name.clone(),
            basic_salary: doc.basic_salary,
            net: doc.net,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRecord {
    #[serde(skip)]
    pub row: usize,
    /// `"row N"` or `"row N (Name)"`.
    pub record: String,
    pub error: ErrorBody,
}

impl FailedRecord {
    fn new(row: usize, record: String, err: &AppError) -> Self {
        Self {
            row,
            record,
            error: ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Partial-failure report. `succeeded` and `failed` are each in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<DocumentSummary>,
    pub failed: Vec<FailedRecord>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    /// Successfully rendered documents, in input order.
    pub documents: Vec<RenderedDocument>,
    pub report: BatchReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Renders every record, preserving input order in both documents and report.
///
/// Each record gets its own canvas and cursor inside its own blocking task; only the
/// theme and pay period are shared, read-only.
pub async fn render_batch(
    records: Vec<EmployeeRecord>,
    period: PayPeriod,
    theme: Arc<Theme>,
    options: BatchOptions,
) -> Result<BatchOutcome, AppError> {
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let period = Arc::new(period);

    let mut handles = Vec::with_capacity(records.len());
    for record in records {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("render semaphore closed: {e}")))?;
        let row = record.row;
        let identifier = record.identifier();
        let theme = theme.clone();
        let period = period.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            render_payslip(record, &period, &theme)
        });
        handles.push((row, identifier, handle));
    }

    let mut outcome = BatchOutcome {
        documents: Vec::with_capacity(handles.len()),
        report: BatchReport::default(),
    };
    for (row, identifier, handle) in handles {
        let result = handle.await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed rendering {identifier}: {e}"))
        })?;
        match result {
            Ok(doc) => {
                outcome.report.succeeded.push(DocumentSummary::from(&doc));
                outcome.documents.push(doc);
            }
            Err(e) if options.fail_fast => return Err(e),
            Err(e) => {
                warn!(row, employee = %identifier, "Payslip render failed: {e}");
                outcome.report.failed.push(FailedRecord::new(row, identifier, &e));
            }
        }
    }
    Ok(outcome)
}

/// Drains the adapter, applies the batch policy to row errors, then renders.
///
/// Every row is read before the first render starts, so a structural error found
/// late in the sheet still means nothing was produced.
pub async fn process_rows<I>(
    rows: I,
    period: PayPeriod,
    theme: Arc<Theme>,
    options: BatchOptions,
) -> Result<BatchOutcome, AppError>
where
    I: IntoIterator<Item = Result<EmployeeRecord, AppError>>,
{
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for row in rows {
        match row {
            Ok(record) => records.push(record),
            Err(AppError::InvalidValue { row, column, value }) if !options.fail_fast => {
                let err = AppError::InvalidValue { row, column, value };
                warn!(row, "Row rejected: {err}");
                rejected.push(FailedRecord::new(row, format!("row {row}"), &err));
            }
            Err(e) => return Err(e),
        }
    }

    if records.is_empty() && rejected.is_empty() {
        return Err(AppError::MalformedInput(
            "No employee rows found below the header".to_string(),
        ));
    }

    let mut outcome = render_batch(records, period, theme, options).await?;
    outcome.report.failed.extend(rejected);
    outcome.report.failed.sort_by_key(|f| f.row);

    info!(
        total = outcome.report.total(),
        succeeded = outcome.report.succeeded.len(),
        failed = outcome.report.failed.len(),
        "Batch rendered"
    );
    Ok(outcome)
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

/// Writes documents into `dir` in order. A later document with the same file name
/// overwrites an earlier one.
pub async fn write_documents(
    dir: &Path,
    documents: &[RenderedDocument],
) -> Result<Vec<PathBuf>, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::ResourceUnavailable(format!("{}: {e}", dir.display())))?;

    let mut paths = Vec::with_capacity(documents.len());
    for doc in documents {
        let path = dir.join(&doc.file_name);
        tokio::fs::write(&path, &doc.bytes)
            .await
            .map_err(|e| AppError::ResourceUnavailable(format!("{}: {e}", path.display())))?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeOptions;
    use crate::payroll::{AdapterOptions, Cell, RecordReader, Table};

    fn theme() -> Arc<Theme> {
        Arc::new(Theme::from_options(&ThemeOptions::default()).unwrap())
    }

    fn period() -> PayPeriod {
        PayPeriod::new("December", "2024", None)
    }

    fn record(row: usize, name: &str, net: i64) -> EmployeeRecord {
        EmployeeRecord {
            row,
            name: name.to_string(),
            phone: None,
            basic_salary: Decimal::from(net),
            advance: Decimal::ZERO,
            deduction: Decimal::ZERO,
            net: Decimal::from(net),
        }
    }

    /// Four metadata rows, the header, then three employees; the second has SALARY "abc".
    fn three_row_sheet() -> Table {
        let mut rows: Vec<Vec<Cell>> = (0..4)
            .map(|i| vec![Cell::text(&format!("metadata {i}"))])
            .collect();
        rows.push(
            ["NAME", "mobile no", "SALARY", "ADVANCE", "DEDUCTION", "NET"]
                .into_iter()
                .map(Cell::text)
                .collect(),
        );
        rows.push(vec![
            Cell::text("Amit Kumar"),
            Cell::Number(9876543210.0),
            Cell::Number(20000.0),
            Cell::Number(3000.0),
            Cell::Number(2000.0),
            Cell::Number(15000.0),
        ]);
        rows.push(vec![
            Cell::text("Priya Sharma"),
            Cell::Empty,
            Cell::text("abc"),
            Cell::Number(0.0),
            Cell::Number(0.0),
            Cell::Number(18000.0),
        ]);
        rows.push(vec![
            Cell::text("Ravi Verma"),
            Cell::Empty,
            Cell::Number(12000.0),
            Cell::Empty,
            Cell::Number(500.0),
            Cell::Number(11500.0),
        ]);
        Table::new(rows)
    }

    fn reader() -> RecordReader {
        RecordReader::new(three_row_sheet(), AdapterOptions::default()).unwrap()
    }

    // ── policy scenarios ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fail_fast_aborts_with_invalid_value_citing_row() {
        let options = BatchOptions {
            fail_fast: true,
            ..BatchOptions::default()
        };
        let err = process_rows(reader(), period(), theme(), options)
            .await
            .unwrap_err();
        match err {
            AppError::InvalidValue { row, column, .. } => {
                assert_eq!(row, 7);
                assert_eq!(column, "SALARY");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_isolate_returns_two_documents_and_one_failure() {
        let outcome = process_rows(reader(), period(), theme(), BatchOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.report.succeeded.len(), 2);
        assert_eq!(outcome.report.failed.len(), 1);
        assert_eq!(outcome.report.failed[0].record, "row 7");
        assert_eq!(outcome.report.failed[0].error.code, "INVALID_VALUE");
        assert!(!outcome.report.is_complete());
        assert_eq!(outcome.documents[0].file_name, "Amit_Kumar_December.pdf");
        assert_eq!(outcome.documents[1].file_name, "Ravi_Verma_December.pdf");
    }

    #[tokio::test]
    async fn test_malformed_input_aborts_even_when_isolating() {
        let rows = vec![
            Ok(record(6, "Amit Kumar", 100)),
            Err(AppError::MalformedInput("broken".into())),
        ];
        let err = process_rows(rows, period(), theme(), BatchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let rows: Vec<Result<EmployeeRecord, AppError>> = vec![];
        let err = process_rows(rows, period(), theme(), BatchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }

    #[tokio::test]
    async fn test_render_failure_is_isolated() {
        let records = vec![
            record(6, "Amit Kumar", 100),
            record(7, "\u{905}\u{92e}\u{93f}\u{924} \u{915}\u{941}\u{92e}\u{93e}\u{930}", 200),
            record(8, "Ravi Verma", 300),
        ];
        let outcome = render_batch(records, period(), theme(), BatchOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.report.failed.len(), 1);
        assert_eq!(outcome.report.failed[0].row, 7);
        assert_eq!(outcome.report.failed[0].error.code, "RENDER_ERROR");
    }

    #[tokio::test]
    async fn test_render_failure_aborts_in_fail_fast_mode() {
        let records = vec![
            record(6, "Amit Kumar", 100),
            record(7, "\u{905}\u{92e}\u{93f}\u{924} \u{915}\u{941}\u{92e}\u{93e}\u{930}", 200),
        ];
        let options = BatchOptions {
            fail_fast: true,
            ..BatchOptions::default()
        };
        let err = render_batch(records, period(), theme(), options)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Render { .. }));
    }

    // ── ordering ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_output_order_matches_input_order() {
        let records: Vec<EmployeeRecord> = (0..12)
            .map(|i| record(6 + i, &format!("Employee {i}"), 1000 + i as i64))
            .collect();
        let options = BatchOptions {
            concurrency: 3,
            fail_fast: false,
        };
        let outcome = render_batch(records, period(), theme(), options)
            .await
            .unwrap();
        let rows: Vec<usize> = outcome.documents.iter().map(|d| d.row).collect();
        assert_eq!(rows, (6..18).collect::<Vec<_>>());
        let summary_rows: Vec<usize> = outcome.report.succeeded.iter().map(|d| d.row).collect();
        assert_eq!(summary_rows, rows);
    }

    // ── output ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_colliding_names_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record(6, "amit kumar", 100), record(7, "AMIT  KUMAR", 200)];
        let outcome = render_batch(records, period(), theme(), BatchOptions::default())
            .await
            .unwrap();
        let paths = write_documents(dir.path(), &outcome.documents)
            .await
            .unwrap();
        assert_eq!(paths[0], paths[1]);

        let on_disk = std::fs::read(&paths[0]).unwrap();
        assert_eq!(on_disk, outcome.documents[1].bytes);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();
        let outcome = render_batch(
            vec![record(6, "Amit Kumar", 100)],
            period(),
            theme(),
            BatchOptions::default(),
        )
        .await
        .unwrap();
        let err = write_documents(&blocker.join("session"), &outcome.documents)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_report_serialises_without_row_index() {
        let report = BatchReport {
            succeeded: vec![],
            failed: vec![FailedRecord::new(
                7,
                "row 7".to_string(),
                &AppError::Validation("x".into()),
            )],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"][0]["record"], "row 7");
        assert_eq!(json["failed"][0]["error"]["code"], "VALIDATION_ERROR");
        assert!(json["failed"][0].get("row").is_none());
    }
}
