use common::model::scan::ScanRecord;

/// Which screen the console shows.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Scan,
}

/// Editable context fields stamped onto each submission.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Operator,
    LoadId,
    Wagon1,
    Wagon2,
    Wagon3,
}

pub enum Msg {
    Show(View),
    Tick,
    Edit(Field, String),
    Detected(String),
    ScanSaved(ScanRecord),
    StagedLoaded(Vec<ScanRecord>),
    Export,
    Exported(String),
    Clear,
    Cleared,
    Failed(String),
}
