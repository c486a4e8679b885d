use serde::{Deserialize, Serialize};

/// An operator comment attached to a checkable, keyed by its identifier in
/// the owning object's comment map.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entry_type: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub expire_time: f64,
}
