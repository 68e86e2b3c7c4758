use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    PunchIn,
    CorrectiveMaintenance,
    PreventiveMaintenance,
    ChangeRequest,
    GpLiveCheck,
    PatrollerTask,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::PunchIn,
        RecordType::CorrectiveMaintenance,
        RecordType::PreventiveMaintenance,
        RecordType::ChangeRequest,
        RecordType::GpLiveCheck,
        RecordType::PatrollerTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::PunchIn => "punch_in",
            RecordType::CorrectiveMaintenance => "corrective_maintenance",
            RecordType::PreventiveMaintenance => "preventive_maintenance",
            RecordType::ChangeRequest => "change_request",
            RecordType::GpLiveCheck => "gp_live_check",
            RecordType::PatrollerTask => "patroller_task",
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("Invalid record type: {value}"))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
