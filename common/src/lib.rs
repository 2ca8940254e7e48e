//! Types shared by the ledger backend and the operator frontend.
//!
//! - `model`: the canonical `ScanRecord`.
//! - `requests` / `responses`: JSON bodies exchanged over `/api/*`.
//! - `capture`: the detection-event vocabulary and the `Debouncer` applied to
//!   the continuous barcode stream on the client.

pub mod capture;
pub mod model;
pub mod requests;
pub mod responses;
