use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::batch::archive::{build_archive, ARCHIVE_NAME};
use crate::batch::orchestrator::{process_rows, write_documents, BatchOptions};
use crate::errors::AppError;
use crate::layout::{Palette, RenderedDocument};
use crate::payroll::workbook::read_table;
use crate::payroll::{AdapterOptions, EmployeeRecord, PayPeriod, RecordReader};
use crate::state::AppState;

/// What a successful upload returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `payslips.zip` with every document.
    #[default]
    Archive,
    /// JSON descriptors pointing at the download endpoint.
    List,
}

impl FromStr for ResponseFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" | "zip" => Ok(ResponseFormat::Archive),
            "list" | "json" => Ok(ResponseFormat::List),
            other => Err(AppError::Validation(format!(
                "Unknown format '{other}'; expected 'archive' or 'list'"
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDescriptor {
    pub id: usize,
    pub name: String,
    pub salary: Decimal,
    pub net: Decimal,
    pub document_url: String,
}

#[derive(Debug, Serialize)]
pub struct PayslipListResponse {
    pub session_id: Uuid,
    pub documents: Vec<DocumentDescriptor>,
}

struct UploadForm {
    file: Bytes,
    period: PayPeriod,
    palette: Option<Palette>,
    format: ResponseFormat,
}

/// POST /api/v1/payslips
///
/// Multipart fields: `file`, `month`, `year`, optional `pay_date`, `palette`, `format`.
pub async fn handle_generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;

    let theme = match form.palette {
        Some(palette) if palette != state.theme.palette => {
            Arc::new(state.theme.with_palette(palette))
        }
        _ => state.theme.clone(),
    };
    let adapter_options = AdapterOptions {
        header_rows: state.config.header_rows,
        net_policy: state.config.net_policy,
    };
    let batch_options = BatchOptions {
        concurrency: state.config.concurrency,
        fail_fast: state.config.fail_fast,
    };

    // Workbook parsing is CPU-bound.
    let file = form.file;
    let rows = tokio::task::spawn_blocking(move || {
        let table = read_table(&file)?;
        let rows: Vec<Result<EmployeeRecord, AppError>> =
            RecordReader::new(table, adapter_options)?.collect();
        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed parsing upload: {e}")))??;

    let outcome = process_rows(rows, form.period, theme, batch_options).await?;
    if !outcome.report.is_complete() {
        return Err(AppError::BatchFailed(outcome.report));
    }

    let session_id = Uuid::new_v4();
    let session_dir = state.config.output_root.join(session_id.to_string());
    write_documents(&session_dir, &outcome.documents).await?;
    info!(
        %session_id,
        documents = outcome.documents.len(),
        "Payslips stored"
    );

    match form.format {
        ResponseFormat::Archive => {
            let documents = outcome.documents;
            let archive = tokio::task::spawn_blocking(move || build_archive(&documents))
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("spawn_blocking failed zipping: {e}"))
                })??;
            Ok((
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{ARCHIVE_NAME}\""),
                    ),
                ],
                archive,
            )
                .into_response())
        }
        ResponseFormat::List => Ok(Json(PayslipListResponse {
            session_id,
            documents: describe(session_id, &outcome.documents),
        })
        .into_response()),
    }
}

/// GET /api/v1/payslips/:session_id/:file_name
pub async fn handle_download(
    State(state): State<AppState>,
    Path((session_id, file_name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let session_id = Uuid::parse_str(&session_id)
        .map_err(|_| AppError::Validation(format!("'{session_id}' is not a session id")))?;
    if !is_plain_pdf_name(&file_name) {
        return Err(AppError::Validation(format!(
            "'{file_name}' is not a payslip file name"
        )));
    }

    let path = state
        .config
        .output_root
        .join(session_id.to_string())
        .join(&file_name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "Payslip {file_name} not found in session {session_id}"
            )))
        }
        Err(e) => {
            return Err(AppError::ResourceUnavailable(format!(
                "{}: {e}",
                path.display()
            )))
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file = None;
    let mut month = None;
    let mut year = None;
    let mut pay_date = None;
    let mut palette = None;
    let mut format = ResponseFormat::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            file = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?,
            );
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read field '{name}': {e}")))?;
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "month" => month = Some(value),
            "year" => year = Some(value),
            "pay_date" => pay_date = Some(value),
            "palette" => palette = Some(value.parse::<Palette>()?),
            "format" => format = value.parse()?,
            _ => {}
        }
    }

    let file = file
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::Validation("Missing spreadsheet in field 'file'".to_string()))?;
    let month = month.ok_or_else(|| AppError::Validation("Missing field 'month'".to_string()))?;
    let year = year.ok_or_else(|| AppError::Validation("Missing field 'year'".to_string()))?;

    Ok(UploadForm {
        file,
        period: PayPeriod::new(month, year, pay_date),
        palette,
        format,
    })
}

fn describe(session_id: Uuid, documents: &[RenderedDocument]) -> Vec<DocumentDescriptor> {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| DocumentDescriptor {
            id: i + 1,
            name: doc.employee.clone(),
            salary: doc.basic_salary,
            net: doc.net,
            document_url: format!("/api/v1/payslips/{session_id}/{}", doc.file_name),
        })
        .collect()
}

/// A single `.pdf` path component.
fn is_plain_pdf_name(name: &str) -> bool {
    name.ends_with(".pdf")
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && !name.starts_with('.')
}
