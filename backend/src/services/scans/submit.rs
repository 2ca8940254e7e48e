//! # Scan Submission Service
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: `process` receives a `ScanSubmission` JSON body.
//! 2.  **Validation**: a missing, empty or whitespace-only `serial` is rejected
//!     with `400 {error: "serial required"}` and nothing is staged.
//! 3.  **Defaulting**: `canonicalize` fills `stage`, `operator` and `timestamp`
//!     when they are absent or empty. The timestamp default is the server's
//!     clock in RFC 3339 UTC with milliseconds.
//! 4.  **Staging**: the record is appended to the shared `StagingStore` and
//!     echoed back as `{ok: true, record}`.

use crate::error::LedgerError;
use crate::staging::StagingStore;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, SecondsFormat, Utc};
use common::model::scan::{ScanRecord, DEFAULT_OPERATOR, DEFAULT_STAGE};
use common::requests::ScanSubmission;
use common::responses::ScanAccepted;
use log::{info, warn};

pub const SERIAL_REQUIRED: &str = "serial required";

/// The Actix web handler for `POST /api/scan`.
pub(crate) async fn process(
    store: web::Data<StagingStore>,
    payload: web::Json<ScanSubmission>,
) -> Result<HttpResponse, LedgerError> {
    let record = match canonicalize(payload.into_inner(), Utc::now()) {
        Ok(record) => record,
        Err(err) => {
            warn!("Scan rejected: {}", err);
            return Err(err);
        }
    };

    let record = store.append(record).await;
    info!(
        "Staged serial {} (stage={}, operator={}, {} staged)",
        record.serial,
        record.stage,
        record.operator,
        store.len().await
    );

    Ok(HttpResponse::Ok().json(ScanAccepted { ok: true, record }))
}

/// Applies validation and defaulting to a submission.
///
/// # Arguments
/// * `submission` - The raw client payload.
/// * `now` - Ingestion time used when the submission carries no timestamp.
///
/// # Returns
/// The canonical record, or `LedgerError::Validation` when `serial` is unusable.
pub fn canonicalize(
    submission: ScanSubmission,
    now: DateTime<Utc>,
) -> Result<ScanRecord, LedgerError> {
    let serial = submission
        .serial
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| LedgerError::validation(SERIAL_REQUIRED))?;

    Ok(ScanRecord {
        serial,
        stage: or_default(submission.stage, || DEFAULT_STAGE.to_string()),
        operator: or_default(submission.operator, || DEFAULT_OPERATOR.to_string()),
        timestamp: or_default(submission.timestamp, || {
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        }),
        load_id: submission.load_id,
        wagon1: submission.wagon1,
        wagon2: submission.wagon2,
        wagon3: submission.wagon3,
    })
}

fn or_default(value: Option<String>, default: impl FnOnce() -> String) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_else(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::TimeZone;

    fn ingestion_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 14, 8, 15, 2).unwrap() + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn bare_serial_gets_defaults() {
        let record = canonicalize(ScanSubmission::with_serial("NPS-00123"), ingestion_time()).unwrap();
        assert_eq!(record.serial, "NPS-00123");
        assert_eq!(record.stage, "received");
        assert_eq!(record.operator, "unknown");
        assert_eq!(record.timestamp, "2025-09-14T08:15:02.123Z");
        assert!(!record.has_context());
    }

    #[test]
    fn supplied_values_are_kept() {
        let submission = ScanSubmission {
            stage: Some("shipped".into()),
            operator: Some("Clerk A".into()),
            timestamp: Some("2025-01-01T00:00:00.000Z".into()),
            load_id: Some("L-1".into()),
            wagon2: Some("W-2".into()),
            ..ScanSubmission::with_serial(" NPS-7 ")
        };
        let record = canonicalize(submission, ingestion_time()).unwrap();
        assert_eq!(record.serial, " NPS-7 ");
        assert_eq!(record.stage, "shipped");
        assert_eq!(record.operator, "Clerk A");
        assert_eq!(record.timestamp, "2025-01-01T00:00:00.000Z");
        assert_eq!(record.load_id.as_deref(), Some("L-1"));
        assert_eq!(record.wagon2.as_deref(), Some("W-2"));
    }

    #[test]
    fn empty_strings_fall_back_to_defaults() {
        let submission = ScanSubmission {
            stage: Some(String::new()),
            operator: Some(String::new()),
            timestamp: Some(String::new()),
            ..ScanSubmission::with_serial("NPS-1")
        };
        let record = canonicalize(submission, ingestion_time()).unwrap();
        assert_eq!(record.stage, DEFAULT_STAGE);
        assert_eq!(record.operator, DEFAULT_OPERATOR);
        assert_eq!(record.timestamp, "2025-09-14T08:15:02.123Z");
    }

    #[test]
    fn unusable_serials_are_rejected() {
        for serial in [None, Some(""), Some("   ")] {
            let submission = ScanSubmission {
                serial: serial.map(str::to_string),
                ..ScanSubmission::default()
            };
            let err = canonicalize(submission, ingestion_time()).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(ref m) if m == SERIAL_REQUIRED));
        }
    }

    #[actix_web::test]
    async fn accepted_scan_is_staged_and_echoed() {
        let store = StagingStore::new();
        let app = test_app!(store.clone(), AppConfig::default());

        let req = actix_test::TestRequest::post()
            .uri("/api/scan")
            .set_json(serde_json::json!({ "serial": "NPS-00123", "loadId": "L-9" }))
            .to_request();
        let body: ScanAccepted = actix_test::call_and_read_body_json(&app, req).await;

        assert!(body.ok);
        assert_eq!(body.record.serial, "NPS-00123");
        assert_eq!(body.record.stage, "received");
        assert_eq!(body.record.load_id.as_deref(), Some("L-9"));
        assert!(body.record.timestamp.ends_with('Z'));
        assert_eq!(store.list().await, vec![body.record]);
    }

    #[actix_web::test]
    async fn rejected_scan_leaves_store_untouched() {
        let store = StagingStore::new();
        let app = test_app!(store.clone(), AppConfig::default());

        let req = actix_test::TestRequest::post()
            .uri("/api/scan")
            .set_json(serde_json::json!({ "stage": "received" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], SERIAL_REQUIRED);
        assert_eq!(store.len().await, 0);
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let store = StagingStore::new();
        let app = test_app!(store.clone(), AppConfig::default());

        let req = actix_test::TestRequest::post()
            .uri("/api/scan")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.len().await, 0);
    }

    #[actix_web::test]
    async fn duplicates_are_both_staged() {
        let store = StagingStore::new();
        let app = test_app!(store.clone(), AppConfig::default());

        for _ in 0..2 {
            let req = actix_test::TestRequest::post()
                .uri("/api/scan")
                .set_json(serde_json::json!({ "serial": "NPS-1" }))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }
        assert_eq!(store.len().await, 2);
    }
}
