//! # Ledger Export Service
//!
//! This module provides the `POST /api/export-to-excel` endpoint, which folds
//! the staged scans into the master workbook and returns the result.
//!
//! ## Workflow:
//!
//! 1.  **Precondition**: the template must exist at the configured path;
//!     otherwise the request fails with `400` and nothing is written.
//!
//! 2.  **Snapshot**: the staged records are copied out of the `StagingStore`.
//!     Scans that arrive while the export runs are not part of it.
//!
//! 3.  **Background Processing**: `tokio::task::spawn_blocking` runs
//!     `export_blocking`, which loads the template, appends one row per staged
//!     record to the target sheet and writes `Master_<unix-ms>.xlsm` into the
//!     export directory. The template itself is only read.
//!
//! 4.  **Response**: the written bytes are returned as an attachment with the
//!     macro-enabled workbook content type. Staged records are kept; clearing
//!     them is a separate call.
//!
//! Any failure in step 3 is reported as `500 {error: "Export failed", details}`.

use crate::config::AppConfig;
use crate::error::LedgerError;
use crate::ledger::{self, LedgerExport, TargetSheet};
use crate::staging::StagingStore;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::scan::ScanRecord;
use log::{error, info};
use std::path::PathBuf;

/// The Actix web handler for `POST /api/export-to-excel`.
pub(crate) async fn process(
    store: web::Data<StagingStore>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, LedgerError> {
    let export = match run_export(&store, &config).await {
        Ok(export) => export,
        Err(err) => {
            error!("Export failed: {}", err);
            return Err(err);
        }
    };

    let summary = &export.summary;
    info!(
        "Exported {} to {} (sheet {:?}: {} existing + {} staged = {} rows, {} sheet(s), macros: {})",
        export.file_name,
        export.path.display(),
        summary.sheet,
        summary.existing_rows,
        summary.appended_rows,
        summary.total_rows,
        summary.sheet_count,
        summary.has_macros
    );

    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(export.file_name)],
    };
    Ok(HttpResponse::Ok()
        .content_type(ledger::XLSM_CONTENT_TYPE)
        .insert_header(disposition)
        .body(export.bytes))
}

async fn run_export(
    store: &StagingStore,
    config: &AppConfig,
) -> Result<LedgerExport, LedgerError> {
    let template = config.template_path();
    if !template.is_file() {
        return Err(LedgerError::TemplateMissing(template));
    }

    let records = store.list().await;
    let export_dir = config.export_dir.clone();
    let target = config.target_sheet.clone();
    let now_ms = Utc::now().timestamp_millis();

    let handle = tokio::task::spawn_blocking(move || {
        export_blocking(template, export_dir, target, records, now_ms)
    });
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(LedgerError::Export(format!("Task join error: {}", e))),
    }
}

/// The synchronous half of the export, run via `spawn_blocking`.
fn export_blocking(
    template: PathBuf,
    export_dir: PathBuf,
    target: TargetSheet,
    records: Vec<ScanRecord>,
    now_ms: i64,
) -> Result<LedgerExport, LedgerError> {
    std::fs::create_dir_all(&export_dir)
        .map_err(|e| LedgerError::Export(format!("{}: {}", export_dir.display(), e)))?;
    ledger::export_ledger(&template, &export_dir, &target, &records, now_ms)
        .map_err(LedgerError::from)
}
