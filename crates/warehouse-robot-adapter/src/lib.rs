/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public warehouse robot adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod api;
pub mod http;
pub mod types;

pub use api::{MockCall, MockTaskApi, TaskApi};

// Re-export commonly used types from http
pub use http::{ClientConfig, DEFAULT_BASE_URL, ErrorKind, Result, RobotError, WarehouseClient};

// Re-export all types
pub use types::*;
