//! # Template Upload Service
//!
//! ## Workflow:
//!
//! 1.  **Multipart**: `process` walks the form fields looking for `template`.
//!     Other fields are skipped.
//! 2.  **Name check**: the uploaded file name must end in `.xlsm`
//!     (any case).
//! 3.  **Spooling**: the bytes are streamed into a temporary file inside the
//!     upload directory while an MD5 digest is computed for the log.
//! 4.  **Verification**: on a blocking thread the spooled file is opened as a
//!     workbook. A file that is not a readable workbook package is rejected
//!     and the temporary file is discarded.
//! 5.  **Persist**: the temporary file is renamed over the template path, so
//!     readers see either the old template or the new one, never a partial
//!     write.

use crate::config::AppConfig;
use crate::error::LedgerError;
use crate::ledger::Workbook;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::responses::TemplateStored;
use futures_util::StreamExt;
use log::{info, warn};
use md5::Context;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const FIELD_NAME: &str = "template";
const TEMPLATE_EXTENSION: &str = ".xlsm";
pub const TEMPLATE_REQUIRED: &str = "template file required";

/// The Actix web handler for `POST /api/upload-template`.
///
/// - On success: `200 OK` with `{ok: true, path}`.
/// - On a rejected upload: `400 Bad Request` with `{error}`.
/// - When the server cannot store it: `500 Internal Server Error`.
pub(crate) async fn process(
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> Result<HttpResponse, LedgerError> {
    match upload_template(&config, payload).await {
        Ok(path) => {
            info!("Template stored at {}", path.display());
            Ok(HttpResponse::Ok().json(TemplateStored {
                ok: true,
                path: path.display().to_string(),
            }))
        }
        Err(err) => {
            warn!("Template upload rejected: {}", err);
            Err(err)
        }
    }
}

/// Spools, verifies and stores the uploaded template.
///
/// # Returns
/// The path the template was stored at.
async fn upload_template(
    config: &AppConfig,
    mut payload: Multipart,
) -> Result<PathBuf, LedgerError> {
    let mut spooled: Option<NamedTempFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| LedgerError::validation(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        if name.as_deref() != Some(FIELD_NAME) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| LedgerError::validation(e.to_string()))?;
            }
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(TEMPLATE_EXTENSION) {
            return Err(LedgerError::InvalidTemplate(format!(
                "Template must be an {} file, got {:?}",
                TEMPLATE_EXTENSION, filename
            )));
        }

        fs::create_dir_all(&config.upload_dir).map_err(store_failed)?;
        let mut file = NamedTempFile::new_in(&config.upload_dir).map_err(store_failed)?;
        let mut md5_hasher = Context::new();
        let mut size = 0usize;

        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| LedgerError::validation(e.to_string()))?;
            md5_hasher.consume(&chunk);
            size += chunk.len();
            file.write_all(&chunk).map_err(store_failed)?;
        }
        file.flush().map_err(store_failed)?;

        info!(
            "Received template {:?} ({} bytes, md5 {:x})",
            filename,
            size,
            md5_hasher.finalize()
        );
        spooled = Some(file);
    }

    let file = spooled.ok_or_else(|| LedgerError::validation(TEMPLATE_REQUIRED))?;
    let target = config.template_path();

    let handle = tokio::task::spawn_blocking(move || store_blocking(file, target));
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(LedgerError::Storage(format!(
            "template check did not finish: {}",
            e
        ))),
    }
}

/// Verifies the spooled upload and moves it into place.
fn store_blocking(file: NamedTempFile, target: PathBuf) -> Result<PathBuf, LedgerError> {
    let workbook = Workbook::open(file.path())
        .map_err(|e| LedgerError::InvalidTemplate(format!("Not a readable workbook: {}", e)))?;
    if !workbook.has_macros() {
        warn!("Uploaded template carries no macro project");
    }

    file.persist(&target).map_err(|e| store_failed(e.error))?;
    Ok(target)
}

fn store_failed(err: std::io::Error) -> LedgerError {
    LedgerError::Storage(err.to_string())
}
