/*
[INPUT]:  Command batches, TaskApi responses, poll/hold tickets
[OUTPUT]: Active-task slot, reconciled DisplayState, typed outcomes
[POS]:    Lifecycle layer - single-task state machine (run -> poll -> terminal/cancel)
[UPDATE]: When transition rules, stale-response checks, or poll policy change
*/

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use warehouse_robot_adapter::{RobotError, Task, TaskApi, TaskStatus};

use crate::display::{DisplayState, DisplayStatus, Position};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 5;
pub const DEFAULT_CANCEL_HOLD: Duration = Duration::from_secs(3);

/// Poll cadence and failure budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_consecutive_failures: u32,
    /// How long CANCELLED stays on screen before falling back to IDLE.
    pub cancel_hold: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            cancel_hold: DEFAULT_CANCEL_HOLD,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("command buffer is empty")]
    EmptyCommands,
    #[error("task {task_id} is still active")]
    TaskActive { task_id: String },
    #[error("failed to create task: {0}")]
    Create(#[source] RobotError),
    #[error("failed to cancel task: {0}")]
    Cancel(#[source] RobotError),
}

/// Identity a poll response must match to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub task_id: String,
    pub generation: u64,
}

/// Identity of the cancel that started a display hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldTicket {
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Response belongs to a task that is no longer active; dropped.
    Stale,
    /// Non-terminal snapshot applied; keep polling.
    Progress,
    /// Terminal snapshot applied; slot cleared.
    Terminal(TaskStatus),
    /// Engine no longer knows the task; slot cleared, shown as FAILED.
    Vanished,
    /// Poll failed; slot kept.
    Transient { failures: u32 },
    /// Failure budget exhausted; slot cleared, shown as FAILED.
    Abandoned { failures: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Nothing was active; no request was sent.
    NoActiveTask,
    Cancelled { task_id: String, hold: HoldTicket },
}

#[derive(Debug, Clone)]
struct ActiveTask {
    task_id: String,
    commands: String,
    generation: u64,
    consecutive_failures: u32,
}

/// Owns the single active task and everything derived from it.
///
/// All methods take `&mut self`; callers serialise events, so no handler
/// ever observes a half-applied transition.
pub struct TaskController<A> {
    api: Arc<A>,
    robot_id: String,
    policy: PollPolicy,
    active: Option<ActiveTask>,
    last_snapshot: Option<Task>,
    display: DisplayState,
    generation: u64,
}

impl<A: TaskApi> TaskController<A> {
    pub fn new(api: Arc<A>, robot_id: impl Into<String>, policy: PollPolicy) -> Self {
        Self {
            api,
            robot_id: robot_id.into(),
            policy,
            active: None,
            last_snapshot: None,
            display: DisplayState::default(),
            generation: 0,
        }
    }

    pub fn api(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    pub fn robot_id(&self) -> &str {
        &self.robot_id
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.active.as_ref().map(|task| task.task_id.as_str())
    }

    /// Commands submitted for the active task, verbatim.
    pub fn active_commands(&self) -> Option<&str> {
        self.active.as_ref().map(|task| task.commands.as_str())
    }

    pub fn last_snapshot(&self) -> Option<&Task> {
        self.last_snapshot.as_ref()
    }

    /// IDLE -> PENDING. Nothing local changes unless the engine accepts.
    pub async fn run(&mut self, commands: &str) -> Result<PollTicket, ControllerError> {
        let commands = commands.trim();
        if commands.is_empty() {
            return Err(ControllerError::EmptyCommands);
        }
        if let Some(active) = &self.active {
            return Err(ControllerError::TaskActive {
                task_id: active.task_id.clone(),
            });
        }

        let task = match self.api.create_task(&self.robot_id, commands).await {
            Ok(task) => task,
            Err(err) => {
                tracing::warn!(robot_id = %self.robot_id, error = %err, "create task failed");
                self.display.status = DisplayStatus::Idle;
                return Err(ControllerError::Create(err));
            }
        };

        self.generation += 1;
        let ticket = PollTicket {
            task_id: task.task_id.clone(),
            generation: self.generation,
        };
        self.active = Some(ActiveTask {
            task_id: task.task_id.clone(),
            commands: commands.to_string(),
            generation: self.generation,
            consecutive_failures: 0,
        });
        tracing::info!(
            task_id = %ticket.task_id,
            generation = ticket.generation,
            commands,
            "task created"
        );

        self.display.status = DisplayStatus::Pending;
        self.reconcile(task);
        Ok(ticket)
    }

    /// What to poll next, if anything.
    pub fn poll_ticket(&self) -> Option<PollTicket> {
        self.active.as_ref().map(|task| PollTicket {
            task_id: task.task_id.clone(),
            generation: task.generation,
        })
    }

    /// Apply one poll response. Responses for anything but the current
    /// active task are dropped without touching display state.
    pub fn apply_poll(&mut self, ticket: &PollTicket, result: Result<Task, RobotError>) -> PollOutcome {
        let Some(active) = self.active.as_mut() else {
            tracing::debug!(task_id = %ticket.task_id, "dropping poll response, no active task");
            return PollOutcome::Stale;
        };
        if active.task_id != ticket.task_id || active.generation != ticket.generation {
            tracing::debug!(
                task_id = %ticket.task_id,
                generation = ticket.generation,
                active_generation = active.generation,
                "dropping stale poll response"
            );
            return PollOutcome::Stale;
        }

        match result {
            Ok(task) if task.task_id == active.task_id => {
                active.consecutive_failures = 0;
                let status = task.status;
                if self.reconcile(task) {
                    PollOutcome::Terminal(status)
                } else {
                    PollOutcome::Progress
                }
            }
            // Current ticket, wrong snapshot: the engine is misbehaving, not late.
            Ok(task) => {
                tracing::warn!(
                    expected = %active.task_id,
                    received = %task.task_id,
                    "snapshot for a different task"
                );
                self.record_poll_failure(ticket)
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(task_id = %ticket.task_id, error = %err, "task vanished from engine");
                self.finish(DisplayStatus::Failed);
                PollOutcome::Vanished
            }
            Err(err) => {
                tracing::warn!(task_id = %ticket.task_id, error = %err, "poll failed");
                self.record_poll_failure(ticket)
            }
        }
    }

    /// Count one failed poll against the active task's budget.
    fn record_poll_failure(&mut self, ticket: &PollTicket) -> PollOutcome {
        let Some(active) = self.active.as_mut() else {
            return PollOutcome::Stale;
        };
        active.consecutive_failures += 1;
        let failures = active.consecutive_failures;
        if failures < self.policy.max_consecutive_failures {
            return PollOutcome::Transient { failures };
        }
        tracing::error!(
            task_id = %ticket.task_id,
            failures,
            "poll failure budget exhausted, abandoning task"
        );
        self.finish(DisplayStatus::Failed);
        PollOutcome::Abandoned { failures }
    }

    /// Fetch and apply one snapshot for the active task.
    pub async fn poll_once(&mut self) -> Option<PollOutcome> {
        let ticket = self.poll_ticket()?;
        let result = self.api.get_task_status(&ticket.task_id).await;
        Some(self.apply_poll(&ticket, result))
    }

    /// PENDING -> CANCELLED. On failure the task stays active and polled.
    pub async fn cancel(&mut self) -> Result<CancelOutcome, ControllerError> {
        let Some(task_id) = self.active_task_id().map(str::to_string) else {
            return Ok(CancelOutcome::NoActiveTask);
        };

        if let Err(err) = self.api.cancel_task(&task_id).await {
            tracing::warn!(task_id = %task_id, error = %err, "cancel failed, task left active");
            return Err(ControllerError::Cancel(err));
        }

        self.finish(DisplayStatus::Cancelled);
        tracing::info!(task_id = %task_id, "task cancelled");
        Ok(CancelOutcome::Cancelled {
            task_id,
            hold: HoldTicket {
                generation: self.generation,
            },
        })
    }

    /// End of the CANCELLED display hold. Ignored if a newer task started.
    pub fn expire_hold(&mut self, hold: HoldTicket) -> bool {
        if hold.generation != self.generation
            || self.active.is_some()
            || self.display.status != DisplayStatus::Cancelled
        {
            return false;
        }
        self.display.status = DisplayStatus::Idle;
        true
    }

    /// Copy a snapshot into display state. Returns true if it was terminal.
    fn reconcile(&mut self, task: Task) -> bool {
        if let Some(state) = task.current_state {
            self.display.position = Position::from(state);
        }
        let terminal = task.status.is_terminal();
        let status = DisplayStatus::from(task.status);
        tracing::debug!(
            task_id = %task.task_id,
            status = %task.status,
            x = self.display.position.x,
            y = self.display.position.y,
            "snapshot applied"
        );
        if let Some(error) = &task.error {
            tracing::warn!(task_id = %task.task_id, "engine reported: {error}");
        }
        self.last_snapshot = Some(task);

        if terminal {
            self.finish(status);
        } else {
            self.display.status = status;
        }
        terminal
    }

    fn finish(&mut self, status: DisplayStatus) {
        if let Some(task) = self.active.take() {
            tracing::info!(task_id = %task.task_id, status = %status, "task finished");
        }
        self.display.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;
    use warehouse_robot_adapter::{MockCall, MockTaskApi};

    fn controller(api: &MockTaskApi) -> TaskController<MockTaskApi> {
        TaskController::new(Arc::new(api.clone()), "0", PollPolicy::default())
    }

    fn snapshot(task_id: &str, status: TaskStatus, x: u32, y: u32) -> Task {
        MockTaskApi::snapshot(task_id, status, x, y)
    }

    fn transport_error() -> RobotError {
        RobotError::InvalidResponse("connection reset".to_string())
    }

    fn not_found(task_id: &str) -> RobotError {
        RobotError::NotFound {
            task_id: task_id.to_string(),
            message: "task not found".to_string(),
        }
    }

    #[tokio::test]
    async fn test_run_poll_to_completion() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)))
            .push_status(Ok(snapshot("t1", TaskStatus::Pending, 2, 2)))
            .push_status(Ok(snapshot("t1", TaskStatus::Completed, 2, 2)));
        let mut ctrl = controller(&api);

        let ticket = assert_ok!(ctrl.run("NNEE").await);
        assert_eq!(ticket.task_id, "t1");
        assert_eq!(ctrl.display().status, DisplayStatus::Pending);
        assert_eq!(ctrl.active_commands(), Some("NNEE"));

        assert_eq!(ctrl.poll_once().await, Some(PollOutcome::Progress));
        assert_eq!(ctrl.display().position, Position { x: 2, y: 2 });
        assert_eq!(ctrl.display().status, DisplayStatus::Pending);

        assert_eq!(
            ctrl.poll_once().await,
            Some(PollOutcome::Terminal(TaskStatus::Completed))
        );
        assert_eq!(ctrl.display().status, DisplayStatus::Completed);
        assert_eq!(ctrl.active_task_id(), None);

        // Nothing left to poll.
        assert_eq!(ctrl.poll_once().await, None);
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_create_rejection_stays_idle() {
        let api = MockTaskApi::new();
        api.push_create(Err(RobotError::Validation {
            status: 400,
            code: "BOUNDARY_ERROR".to_string(),
            message: "boundary error".to_string(),
        }));
        let mut ctrl = controller(&api);

        let err = ctrl.run("EEEEEEEEEE").await.expect_err("boundary");
        assert!(matches!(err, ControllerError::Create(RobotError::Validation { .. })));
        assert_eq!(ctrl.display().status, DisplayStatus::Idle);
        assert!(ctrl.poll_ticket().is_none());
    }

    #[tokio::test]
    async fn test_empty_buffer_does_not_call_engine() {
        let api = MockTaskApi::new();
        let mut ctrl = controller(&api);

        assert!(matches!(ctrl.run("  ").await, Err(ControllerError::EmptyCommands)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_while_active_is_rejected() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)));
        let mut ctrl = controller(&api);
        ctrl.run("N").await.expect("run");

        let err = ctrl.run("S").await.expect_err("second run");
        assert!(matches!(err, ControllerError::TaskActive { ref task_id } if task_id == "t1"));
        assert_eq!(ctrl.active_task_id(), Some("t1"));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_without_task_is_noop() {
        let api = MockTaskApi::new();
        let mut ctrl = controller(&api);

        assert_eq!(ctrl.cancel().await.expect("cancel"), CancelOutcome::NoActiveTask);
        assert!(api.calls().is_empty());
        assert_eq!(ctrl.display().status, DisplayStatus::Idle);
    }

    #[tokio::test]
    async fn test_cancel_then_stale_poll_is_dropped() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t2", TaskStatus::Pending, 1, 1)))
            .push_cancel(Ok(()));
        let mut ctrl = controller(&api);

        let ticket = assert_ok!(ctrl.run("NNN").await);
        let outcome = assert_ok!(ctrl.cancel().await);
        let CancelOutcome::Cancelled { task_id, hold } = outcome else {
            panic!("expected cancellation");
        };
        assert_eq!(task_id, "t2");
        assert_eq!(ctrl.display().status, DisplayStatus::Cancelled);
        assert!(!ctrl.is_active());

        let late = ctrl.apply_poll(&ticket, Ok(snapshot("t2", TaskStatus::Pending, 5, 5)));
        assert_eq!(late, PollOutcome::Stale);
        assert_eq!(ctrl.display().position, Position { x: 1, y: 1 });
        assert_eq!(ctrl.display().status, DisplayStatus::Cancelled);

        assert!(ctrl.expire_hold(hold));
        assert_eq!(ctrl.display().status, DisplayStatus::Idle);
    }

    #[tokio::test]
    async fn test_cancel_failure_keeps_task_active() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t3", TaskStatus::Pending, 0, 0)))
            .push_cancel(Err(transport_error()));
        let mut ctrl = controller(&api);
        ctrl.run("E").await.expect("run");

        assert!(matches!(ctrl.cancel().await, Err(ControllerError::Cancel(_))));
        assert_eq!(ctrl.active_task_id(), Some("t3"));
        assert_eq!(ctrl.display().status, DisplayStatus::Pending);
    }

    #[tokio::test]
    async fn test_hold_ignored_after_new_run() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)))
            .push_cancel(Ok(()))
            .push_create(Ok(snapshot("t2", TaskStatus::Pending, 0, 0)));
        let mut ctrl = controller(&api);

        ctrl.run("N").await.expect("run");
        let CancelOutcome::Cancelled { hold, .. } = ctrl.cancel().await.expect("cancel") else {
            panic!("expected cancellation");
        };
        let second = ctrl.run("S").await.expect("second run");
        assert_eq!(second.task_id, "t2");
        assert!(second.generation > hold.generation);

        assert!(!ctrl.expire_hold(hold));
        assert_eq!(ctrl.display().status, DisplayStatus::Pending);
    }

    #[tokio::test]
    async fn test_snapshot_for_other_task_counts_as_failure() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)));
        let policy = PollPolicy {
            max_consecutive_failures: 2,
            ..PollPolicy::default()
        };
        let mut ctrl = TaskController::new(Arc::new(api.clone()), "0", policy);
        let ticket = assert_ok!(ctrl.run("N").await);

        let outcome = ctrl.apply_poll(&ticket, Ok(snapshot("t9", TaskStatus::Completed, 9, 9)));
        assert_eq!(outcome, PollOutcome::Transient { failures: 1 });
        assert_eq!(ctrl.active_task_id(), Some("t1"));
        assert_eq!(ctrl.display().position, Position::default());
        assert_eq!(ctrl.display().status, DisplayStatus::Pending);

        let outcome = ctrl.apply_poll(&ticket, Ok(snapshot("t9", TaskStatus::Completed, 9, 9)));
        assert_eq!(outcome, PollOutcome::Abandoned { failures: 2 });
        assert_eq!(ctrl.display().status, DisplayStatus::Failed);
        assert_eq!(ctrl.display().position, Position::default());
        assert!(!ctrl.is_active());
    }

    #[tokio::test]
    async fn test_old_generation_ticket_stays_silent() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)))
            .push_cancel(Ok(()))
            .push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)));
        let mut ctrl = controller(&api);

        let first = assert_ok!(ctrl.run("N").await);
        assert_ok!(ctrl.cancel().await);
        let second = assert_ok!(ctrl.run("S").await);
        assert_eq!(first.task_id, second.task_id);

        let outcome = ctrl.apply_poll(&first, Err(transport_error()));
        assert_eq!(outcome, PollOutcome::Stale);
        // The failure did not count against the new task.
        assert_eq!(
            ctrl.apply_poll(&second, Err(transport_error())),
            PollOutcome::Transient { failures: 1 }
        );
    }

    #[tokio::test]
    async fn test_run_submits_trimmed_commands() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)));
        let mut ctrl = controller(&api);

        assert_ok!(ctrl.run("  NNE \n").await);
        assert_eq!(ctrl.active_commands(), Some("NNE"));
        assert!(matches!(
            api.calls().first(),
            Some(MockCall::Create { commands, .. }) if commands == "NNE"
        ));
    }

    #[tokio::test]
    async fn test_not_found_while_polling_ends_task() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t4", TaskStatus::Pending, 0, 0)))
            .push_status(Err(not_found("t4")));
        let mut ctrl = controller(&api);
        ctrl.run("W").await.expect("run");

        assert_eq!(ctrl.poll_once().await, Some(PollOutcome::Vanished));
        assert_eq!(ctrl.display().status, DisplayStatus::Failed);
        assert!(!ctrl.is_active());
    }

    #[tokio::test]
    async fn test_transient_failures_reset_and_exhaust() {
        let api = MockTaskApi::new();
        let policy = PollPolicy {
            max_consecutive_failures: 2,
            ..PollPolicy::default()
        };
        api.push_create(Ok(snapshot("t5", TaskStatus::Pending, 0, 0)))
            .push_status(Err(transport_error()))
            .push_status(Ok(snapshot("t5", TaskStatus::Running, 0, 1)))
            .push_status(Err(transport_error()))
            .push_status(Err(transport_error()));
        let mut ctrl = TaskController::new(Arc::new(api.clone()), "0", policy);
        ctrl.run("NN").await.expect("run");

        assert_eq!(ctrl.poll_once().await, Some(PollOutcome::Transient { failures: 1 }));
        assert_eq!(ctrl.poll_once().await, Some(PollOutcome::Progress));
        assert_eq!(ctrl.poll_once().await, Some(PollOutcome::Transient { failures: 1 }));
        assert_eq!(ctrl.poll_once().await, Some(PollOutcome::Abandoned { failures: 2 }));
        assert_eq!(ctrl.display().status, DisplayStatus::Failed);
        assert_eq!(ctrl.display().position, Position { x: 0, y: 1 });
        assert!(ctrl.poll_ticket().is_none());
    }

    #[tokio::test]
    async fn test_terminal_clears_slot_for_fresh_run() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t1", TaskStatus::Pending, 0, 0)))
            .push_status(Ok(snapshot("t1", TaskStatus::Failed, 0, 0)))
            .push_create(Ok(snapshot("t6", TaskStatus::Pending, 0, 0)));
        let mut ctrl = controller(&api);

        ctrl.run("S").await.expect("run");
        assert_eq!(
            ctrl.poll_once().await,
            Some(PollOutcome::Terminal(TaskStatus::Failed))
        );
        let next = ctrl.run("N").await.expect("second run");
        assert_eq!(next.task_id, "t6");
        assert_eq!(
            api.calls()
                .into_iter()
                .filter(|call| matches!(call, MockCall::Create { .. }))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_create_returning_terminal_is_reconciled() {
        let api = MockTaskApi::new();
        api.push_create(Ok(snapshot("t7", TaskStatus::Completed, 3, 0)));
        let mut ctrl = controller(&api);

        ctrl.run("EEE").await.expect("run");
        assert_eq!(ctrl.display().status, DisplayStatus::Completed);
        assert_eq!(ctrl.display().position, Position { x: 3, y: 0 });
        assert!(ctrl.poll_ticket().is_none());
    }
}
