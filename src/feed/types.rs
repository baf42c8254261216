use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One upstream element as decoded, before any field is projected.
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub id: Option<String>,
    pub line: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// GPS report time in epoch milliseconds, 0 when unknown.
    pub timestamp: i64,
}
