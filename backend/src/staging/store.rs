use common::model::scan::ScanRecord;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A clonable, thread-safe handle to the ordered list of staged scans.
///
/// All clones share the same list. Each operation takes the lock only for the
/// in-memory step, so no lock is ever held across file I/O.
#[derive(Clone, Default)]
pub struct StagingStore {
    records: Arc<RwLock<Vec<ScanRecord>>>,
}

impl StagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record` at the end and returns the stored copy.
    pub async fn append(&self, record: ScanRecord) -> ScanRecord {
        self.records.write().await.push(record.clone());
        record
    }

    /// All staged records in insertion order.
    pub async fn list(&self) -> Vec<ScanRecord> {
        self.records.read().await.clone()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
