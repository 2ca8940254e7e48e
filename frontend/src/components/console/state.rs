//! Console state: the current screen, the context fields applied to new
//! scans, and the client's copy of the staged list.

use super::messages::{Field, View};
use crate::helpers::local_date_time;
use common::capture::Debouncer;
use common::model::scan::ScanRecord;
use common::requests::ScanSubmission;
use gloo_timers::callback::Interval;

pub const READY: &str = "Ready";
pub const DEFAULT_OPERATOR_NAME: &str = "Clerk A";

pub struct Console {
    pub view: View,
    pub status: String,
    pub operator: String,
    pub load_id: String,
    pub wagons: [String; 3],
    /// Staged records as last confirmed by the server.
    pub staged: Vec<ScanRecord>,
    /// Submission-layer duplicate filter.
    pub submissions: Debouncer,
    /// Locale date and time shown on the start page.
    pub clock: (String, String),
    /// Keeps the start page clock ticking while the console is mounted.
    pub ticker: Option<Interval>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            view: View::Home,
            status: READY.to_string(),
            operator: DEFAULT_OPERATOR_NAME.to_string(),
            load_id: String::new(),
            wagons: Default::default(),
            staged: Vec::new(),
            submissions: Debouncer::default(),
            clock: local_date_time(),
            ticker: None,
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Operator => &self.operator,
            Field::LoadId => &self.load_id,
            Field::Wagon1 => &self.wagons[0],
            Field::Wagon2 => &self.wagons[1],
            Field::Wagon3 => &self.wagons[2],
        }
    }

    pub fn set_field(&mut self, field: Field, value: String) {
        match field {
            Field::Operator => self.operator = value,
            Field::LoadId => self.load_id = value,
            Field::Wagon1 => self.wagons[0] = value,
            Field::Wagon2 => self.wagons[1] = value,
            Field::Wagon3 => self.wagons[2] = value,
        }
    }

    /// The submission for a detected serial, stamped with the current context.
    pub fn submission(&self, serial: String, timestamp: String) -> ScanSubmission {
        let filled = |v: &str| Some(v.trim().to_string()).filter(|v| !v.is_empty());
        ScanSubmission {
            serial: Some(serial),
            stage: Some(common::model::scan::DEFAULT_STAGE.to_string()),
            operator: filled(&self.operator),
            timestamp: Some(timestamp),
            load_id: filled(&self.load_id),
            wagon1: filled(&self.wagons[0]),
            wagon2: filled(&self.wagons[1]),
            wagon3: filled(&self.wagons[2]),
        }
    }
}
