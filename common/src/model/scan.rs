use serde::{Deserialize, Serialize};

/// Lifecycle tag applied when a submission does not name one.
pub const DEFAULT_STAGE: &str = "received";

/// Operator recorded when a submission does not identify who scanned.
pub const DEFAULT_OPERATOR: &str = "unknown";

/// The canonical unit of inventory evidence held by the staging store.
///
/// A record is produced by the backend's scan ingestion service after the
/// defaulting rules have been applied, so `stage`, `operator` and `timestamp`
/// are always populated. The contextual fields (`load_id`, `wagon1..3`) are
/// carried through unchanged and are omitted from JSON when absent.
///
/// Records are never mutated once staged; the frontend replaces its optimistic
/// copy with the one returned by `POST /api/scan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub serial: String,
    pub stage: String,
    pub operator: String,
    /// ISO-8601 instant, either caller supplied or the server's ingestion time.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wagon1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wagon2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wagon3: Option<String>,
}

impl ScanRecord {
    /// True when any of the load / wagon correlation fields is set.
    pub fn has_context(&self) -> bool {
        [&self.load_id, &self.wagon1, &self.wagon2, &self.wagon3]
            .iter()
            .any(|f| f.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ScanRecord {
        ScanRecord {
            serial: "NPS-00123".to_string(),
            stage: DEFAULT_STAGE.to_string(),
            operator: DEFAULT_OPERATOR.to_string(),
            timestamp: "2025-09-14T08:15:02.123Z".to_string(),
            load_id: None,
            wagon1: None,
            wagon2: None,
            wagon3: None,
        }
    }

    #[test]
    fn absent_context_fields_are_not_serialized() {
        let json = serde_json::to_value(record()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(!obj.contains_key("loadId"));
        assert!(!record().has_context());
    }

    #[test]
    fn load_id_uses_camel_case_on_the_wire() {
        let mut rec = record();
        rec.load_id = Some("L-2025-09-001".to_string());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["loadId"], "L-2025-09-001");
        assert!(rec.has_context());

        let back: ScanRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}
