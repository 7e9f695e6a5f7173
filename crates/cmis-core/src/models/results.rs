//! Query rows and change-log entries.

use super::object::Properties;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a CMIS query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Values keyed by query name.
    pub properties: Properties,
}

impl QueryResult {
    pub fn property_value(&self, query_name: &str) -> Option<&Value> {
        self.properties.get(query_name)
    }
}

/// Kind of change recorded in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
    Security,
}

/// One change-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub object_id: String,
    pub change_type: ChangeType,
    #[serde(default)]
    pub change_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: Properties,
}
