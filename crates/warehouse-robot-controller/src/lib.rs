/*
[INPUT]:  Public API exports for warehouse-robot-controller crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod command;
pub mod config;
pub mod controller;
pub mod display;
pub mod session;

// Re-export main types for convenience
pub use command::{CommandBuffer, Direction, ParseDirectionError};
pub use config::{ConfigError, ControllerConfig};
pub use controller::{
    CancelOutcome, ControllerError, HoldTicket, PollOutcome, PollPolicy, PollTicket,
    TaskController,
};
pub use display::{
    DisplayState, DisplayStatus, GridRenderer, Notice, NoticeLevel, Position,
    PresentationSink, RecordingSink,
};
pub use session::{Session, SessionCommand};
