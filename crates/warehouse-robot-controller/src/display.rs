/*
[INPUT]:  Controller-owned display state and user notices
[OUTPUT]: Rendered grid frames and notices (terminal or recorded)
[POS]:    Presentation layer - read-only sink for controller state
[UPDATE]: When display fields, grid size, or notice levels change
*/

use std::fmt;
use std::io::Write;

use console::style;
use warehouse_robot_adapter::{RobotState, TaskStatus};

/// Grid edge length; coordinates are 0-indexed.
pub const GRID_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl From<RobotState> for Position {
    fn from(state: RobotState) -> Self {
        Self {
            x: state.x,
            y: state.y,
        }
    }
}

/// Locally displayed status; `Idle` means no task exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayStatus {
    #[default]
    Idle,
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl DisplayStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DisplayStatus::Completed | DisplayStatus::Failed | DisplayStatus::Cancelled
        )
    }
}

impl From<TaskStatus> for DisplayStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending | TaskStatus::Running => DisplayStatus::Pending,
            TaskStatus::Completed => DisplayStatus::Completed,
            TaskStatus::Failed => DisplayStatus::Failed,
            TaskStatus::Cancelled => DisplayStatus::Cancelled,
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DisplayStatus::Idle => "IDLE",
            DisplayStatus::Pending => "PENDING",
            DisplayStatus::Completed => "COMPLETED",
            DisplayStatus::Failed => "FAILED",
            DisplayStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Everything a renderer is allowed to see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub position: Position,
    pub status: DisplayStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives state after every change. Implementations must not feed
/// anything back into the controller.
pub trait PresentationSink {
    fn render(&mut self, state: &DisplayState);
    fn notify(&mut self, notice: &Notice);
}

/// Draws the grid as text, top row is `y = GRID_SIZE - 1`.
pub struct GridRenderer<W: Write> {
    out: W,
}

impl<W: Write> GridRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn frame(state: &DisplayState) -> String {
        let mut frame = String::new();
        for y in (0..GRID_SIZE).rev() {
            frame.push_str(&format!("{y:>2} "));
            for x in 0..GRID_SIZE {
                let here = state.position.x == x && state.position.y == y;
                frame.push_str(if here { "[R]" } else { " . " });
            }
            frame.push('\n');
        }
        frame.push_str("   ");
        for x in 0..GRID_SIZE {
            frame.push_str(&format!(" {x} "));
        }
        frame.push('\n');
        frame
    }

    fn status_label(status: DisplayStatus) -> String {
        let label = status.to_string();
        match status {
            DisplayStatus::Idle => style(label).dim().to_string(),
            DisplayStatus::Pending => style(label).yellow().to_string(),
            DisplayStatus::Completed => style(label).green().to_string(),
            DisplayStatus::Failed => style(label).red().bold().to_string(),
            DisplayStatus::Cancelled => style(label).magenta().to_string(),
        }
    }
}

impl<W: Write> PresentationSink for GridRenderer<W> {
    fn render(&mut self, state: &DisplayState) {
        let mut text = Self::frame(state);
        text.push_str(&format!(
            "robot ({}, {})  status {}\n",
            state.position.x,
            state.position.y,
            Self::status_label(state.status)
        ));
        if state.position.x >= GRID_SIZE || state.position.y >= GRID_SIZE {
            text.push_str("robot is outside the visible grid\n");
        }
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %err, "failed to render grid");
        }
    }

    fn notify(&mut self, notice: &Notice) {
        let line = match notice.level {
            NoticeLevel::Info => format!("{}\n", style(&notice.message).cyan()),
            NoticeLevel::Error => format!("{} {}\n", style("error:").red().bold(), notice.message),
        };
        if let Err(err) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %err, "failed to write notice");
        }
    }
}

/// Keeps every frame and notice; used by tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub frames: Vec<DisplayState>,
    pub notices: Vec<Notice>,
}

impl RecordingSink {
    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(|notice| notice.level == NoticeLevel::Error)
    }
}

impl PresentationSink for RecordingSink {
    fn render(&mut self, state: &DisplayState) {
        self.frames.push(*state);
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}
