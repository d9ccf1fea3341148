/*
[INPUT]:  Engine status strings and serde requirements
[OUTPUT]: Typed task status enum with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When the engine adds or renames task statuses
*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// Task status as reported by the remote engine.
///
/// The engine never reports an idle state; "no task" is a local concern of
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    #[serde(alias = "CANCELED")]
    Cancelled,
}

impl TaskStatus {
    /// Terminal statuses never change again for the same task.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
