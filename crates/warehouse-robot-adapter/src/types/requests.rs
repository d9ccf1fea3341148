/*
[INPUT]:  Caller-side command batches
[OUTPUT]: Typed request bodies for the engine
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub commands: String,
}
