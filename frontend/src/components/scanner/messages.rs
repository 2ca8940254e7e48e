use crate::capture::ScanSession;
use common::capture::{CaptureError, CaptureEvent, DeviceInfo};

pub enum Msg {
    DevicesLoaded(Result<Vec<DeviceInfo>, CaptureError>),
    SelectDevice(String),
    Toggle,
    Started(ScanSession),
    StartFailed(CaptureError),
    Captured(CaptureEvent),
    ToggleTorch,
    TorchChanged(Result<bool, CaptureError>),
}
