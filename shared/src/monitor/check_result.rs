use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a check. Travels as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceState {
    #[default]
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    pub fn from_value(value: i64) -> ServiceState {
        match value {
            0 => ServiceState::Ok,
            1 => ServiceState::Warning,
            2 => ServiceState::Critical,
            _ => ServiceState::Unknown,
        }
    }

    pub fn to_value(self) -> i64 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl Serialize for ServiceState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_value())
    }
}

impl<'de> Deserialize<'de> for ServiceState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(ServiceState::from_value(value as i64))
    }
}

/// How an acknowledgement sticks to state changes. Integer-encoded on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcknowledgementType {
    #[default]
    None,
    Normal,
    Sticky,
}

impl AcknowledgementType {
    pub fn from_value(value: i64) -> AcknowledgementType {
        match value {
            1 => AcknowledgementType::Normal,
            2 => AcknowledgementType::Sticky,
            _ => AcknowledgementType::None,
        }
    }

    pub fn to_value(self) -> i64 {
        match self {
            AcknowledgementType::None => 0,
            AcknowledgementType::Normal => 1,
            AcknowledgementType::Sticky => 2,
        }
    }
}

/// A single structured performance-data sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfdataValue {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub counter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Result of one check execution.
///
/// `performance_data` entries are kept as already-serialized values:
/// structured samples are dictionaries, legacy samples plain strings. The
/// receiving side discriminates on the shape.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckResult {
    #[serde(default)]
    pub state: ServiceState,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub performance_data: Vec<Value>,
    #[serde(default)]
    pub schedule_start: f64,
    #[serde(default)]
    pub schedule_end: f64,
    #[serde(default)]
    pub execution_start: f64,
    #[serde(default)]
    pub execution_end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_source: Option<String>,
}

impl CheckResult {
    pub fn new(state: ServiceState, output: impl Into<String>) -> CheckResult {
        CheckResult {
            state,
            output: output.into(),
            ..CheckResult::default()
        }
    }
}
