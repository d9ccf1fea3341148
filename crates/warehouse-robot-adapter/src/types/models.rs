/*
[INPUT]:  Engine task snapshots (JSON) and serde requirements
[OUTPUT]: Typed task and robot state structs
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::TaskStatus;

/// Robot position and load as seen by the engine.
///
/// The engine has shipped both snake_case and Go-style capitalised keys, so
/// both are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotState {
    #[serde(alias = "X")]
    pub x: u32,
    #[serde(alias = "Y")]
    pub y: u32,
    #[serde(default, alias = "HasCrate")]
    pub has_crate: bool,
}

/// Snapshot of one command batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    #[serde(default)]
    pub robot_id: String,
    #[serde(default)]
    pub commands: String,
    pub status: TaskStatus,
    #[serde(default, alias = "current_position", skip_serializing_if = "Option::is_none")]
    pub current_state: Option<RobotState>,
    #[serde(default, deserialize_with = "serde_helpers::empty_string_as_none")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Informational; unreadable values decode as `None`.
    #[serde(default, alias = "create_at", deserialize_with = "serde_helpers::lenient_timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "update_at", deserialize_with = "serde_helpers::lenient_timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

mod serde_helpers {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }

    /// RFC 3339, or `YYYY-MM-DD HH:MM:SS` taken as UTC. Anything else is `None`.
    pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(Value::String(raw)) = Option::<Value>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(parsed.with_timezone(&Utc)));
        }
        Ok(NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc()))
    }
}
