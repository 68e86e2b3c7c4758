use crate::domain::value_objects::{GpsCoordinates, Photo, RecordType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A technician submission, keyed by its `type` discriminator.
///
/// Every variant keeps unknown fields in `extra` so the payload sent to the
/// records API is the one the form produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldRecord {
    PunchIn(PunchInRecord),
    CorrectiveMaintenance(CorrectiveMaintenanceRecord),
    PreventiveMaintenance(PreventiveMaintenanceRecord),
    ChangeRequest(ChangeRequestRecord),
    GpLiveCheck(GpLiveCheckRecord),
    PatrollerTask(PatrollerTaskRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchInRecord {
    #[serde(default)]
    pub technician_name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punch_in_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punch_out_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<GpsCoordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectiveMaintenanceRecord {
    pub location: String,
    pub issue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_description: Option<String>,
    pub tt_number: String,
    pub damage_reason: String,
    #[serde(rename = "restorationPossibleAsPerSLA", default)]
    pub restoration_possible_as_per_sla: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintenance_photos: Vec<Photo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cut_location_photos: Vec<Photo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsCoordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreventiveMaintenanceRecord {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsCoordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestRecord {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsCoordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpLiveCheckRecord {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_found: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsCoordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrollerTaskRecord {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsCoordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PunchInRecord {
    pub fn new(technician_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            technician_name: technician_name.into(),
            location: location.into(),
            notes: None,
            status: None,
            punch_in_time: None,
            punch_out_time: None,
            gps_coordinates: None,
            photos: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl FieldRecord {
    pub fn record_type(&self) -> RecordType {
        match self {
            FieldRecord::PunchIn(_) => RecordType::PunchIn,
            FieldRecord::CorrectiveMaintenance(_) => RecordType::CorrectiveMaintenance,
            FieldRecord::PreventiveMaintenance(_) => RecordType::PreventiveMaintenance,
            FieldRecord::ChangeRequest(_) => RecordType::ChangeRequest,
            FieldRecord::GpLiveCheck(_) => RecordType::GpLiveCheck,
            FieldRecord::PatrollerTask(_) => RecordType::PatrollerTask,
        }
    }

    /// Parses and validates a raw submission body.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value.get("type").and_then(Value::as_str) {
            Some(kind) => {
                kind.parse::<RecordType>()?;
            }
            None => return Err("Record type required".to_string()),
        }
        let record: FieldRecord =
            serde_json::from_value(value).map_err(|e| format!("Malformed record: {e}"))?;
        record.validate()?;
        Ok(record)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            FieldRecord::PunchIn(r) => {
                require("location", &r.location)?;
                validate_gps(r.gps_coordinates.as_ref())
            }
            FieldRecord::CorrectiveMaintenance(r) => {
                require("location", &r.location)?;
                require("issue", &r.issue)?;
                require("ttNumber", &r.tt_number)?;
                require("damageReason", &r.damage_reason)?;
                validate_gps(r.gps_location.as_ref())
            }
            FieldRecord::PreventiveMaintenance(r) => {
                require("location", &r.location)?;
                validate_gps(r.gps_location.as_ref())
            }
            FieldRecord::ChangeRequest(r) => {
                require("location", &r.location)?;
                validate_gps(r.gps_location.as_ref())
            }
            FieldRecord::GpLiveCheck(r) => {
                require("location", &r.location)?;
                validate_gps(r.gps_location.as_ref())
            }
            FieldRecord::PatrollerTask(r) => {
                require("location", &r.location)?;
                validate_gps(r.gps_location.as_ref())
            }
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("Field `{field}` is required"));
    }
    Ok(())
}

fn validate_gps(gps: Option<&GpsCoordinates>) -> Result<(), String> {
    gps.map(GpsCoordinates::validate).unwrap_or(Ok(()))
}
