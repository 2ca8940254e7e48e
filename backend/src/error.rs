//! Request-level failures and their HTTP rendering.

use crate::ledger::WorkbookError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::responses::ErrorBody;
use std::path::PathBuf;

pub const EXPORT_FAILED: &str = "Export failed";

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The request itself is unusable, e.g. a scan without a serial.
    #[error("{0}")]
    Validation(String),

    #[error("Template not found at {}. Upload a template first.", .0.display())]
    TemplateMissing(PathBuf),

    #[error("{0}")]
    InvalidTemplate(String),

    #[error("Export failed: {0}")]
    Export(String),

    /// The server could not write an accepted upload to disk.
    #[error("Could not store template: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }
}

impl From<WorkbookError> for LedgerError {
    fn from(err: WorkbookError) -> Self {
        LedgerError::Export(err.to_string())
    }
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_)
            | LedgerError::TemplateMissing(_)
            | LedgerError::InvalidTemplate(_) => StatusCode::BAD_REQUEST,
            LedgerError::Export(_) | LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            LedgerError::Export(details) => ErrorBody::with_details(EXPORT_FAILED, details),
            other => ErrorBody::new(other.to_string()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: LedgerError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn validation_is_a_bad_request() {
        let (status, body) = body_of(LedgerError::validation("serial required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "serial required" }));
    }

    #[actix_web::test]
    async fn missing_template_names_the_path() {
        let (status, body) =
            body_of(LedgerError::TemplateMissing(PathBuf::from("uploads/template.xlsm"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("uploads/template.xlsm"));
    }

    #[actix_web::test]
    async fn export_failures_carry_details() {
        let err: LedgerError = WorkbookError::NoSheets.into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], EXPORT_FAILED);
        assert!(body["details"].is_string());
    }

    #[actix_web::test]
    async fn storage_failures_are_server_errors() {
        let (status, body) = body_of(LedgerError::Storage("disk full".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Could not store template: disk full");
    }
}
