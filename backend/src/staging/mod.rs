//! In-memory staging of accepted scans.
//!
//! Records live only for the lifetime of the process. The store is created in
//! `main.rs` and handed to the HTTP services as `web::Data`; every export reads
//! a snapshot of it without clearing it.

mod store;

pub use store::StagingStore;
