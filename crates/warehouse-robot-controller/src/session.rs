/*
[INPUT]:  SessionCommand stream, poll timer, in-flight poll results, hold timer, CancellationToken
[OUTPUT]: Serialised controller transitions and sink re-renders
[POS]:    Runtime layer - single event loop driving the lifecycle controller
[UPDATE]: When adding user commands or changing poll scheduling
*/

use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use warehouse_robot_adapter::{RobotError, Task, TaskApi, TaskStatus};

use crate::command::{CommandBuffer, Direction};
use crate::controller::{
    CancelOutcome, ControllerError, HoldTicket, PollOutcome, PollTicket, TaskController,
};
use crate::display::{DisplayState, Notice, PresentationSink};

/// Operator input, one message per discrete action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Append(Direction),
    Set(String),
    Clear,
    Run,
    Cancel,
    Show,
    Quit,
}

type PollResult = (PollTicket, Result<Task, RobotError>);

enum Event {
    Shutdown,
    Command(Option<SessionCommand>),
    PollDue,
    PollDone(Result<PollResult, JoinError>),
    HoldExpired(HoldTicket),
}

struct PendingHold {
    ticket: HoldTicket,
    sleep: Pin<Box<Sleep>>,
}

/// Event loop owning the buffer, the controller and the sink.
///
/// Handlers run one at a time. Poll requests are spawned so user commands
/// are still served while one is in flight; their results come back as
/// events and go through the controller's identity check.
pub struct Session<A, S> {
    buffer: CommandBuffer,
    controller: TaskController<A>,
    sink: S,
    commands: mpsc::Receiver<SessionCommand>,
    shutdown: CancellationToken,
    exit_after_task: bool,
    attempted_run: bool,
}

impl<A, S> Session<A, S>
where
    A: TaskApi + 'static,
    S: PresentationSink,
{
    pub fn new(
        controller: TaskController<A>,
        buffer: CommandBuffer,
        sink: S,
        commands: mpsc::Receiver<SessionCommand>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            buffer,
            controller,
            sink,
            commands,
            shutdown,
            exit_after_task: false,
            attempted_run: false,
        }
    }

    /// Return from `run` as soon as the first submitted task has ended.
    pub fn exit_after_task(mut self) -> Self {
        self.exit_after_task = true;
        self
    }

    pub fn controller(&self) -> &TaskController<A> {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drive the session until quit, channel close, or shutdown.
    pub async fn run(&mut self) -> DisplayState {
        let mut ticker = tokio::time::interval(self.controller.policy().interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: JoinSet<PollResult> = JoinSet::new();
        let mut hold: Option<PendingHold> = None;

        self.render();

        loop {
            let poll_enabled = self.controller.is_active() && in_flight.is_empty();
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => Event::Shutdown,
                command = self.commands.recv() => Event::Command(command),
                _ = ticker.tick(), if poll_enabled => Event::PollDue,
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => Event::PollDone(joined),
                ticket = hold_elapsed(&mut hold), if hold.is_some() => Event::HoldExpired(ticket),
            };

            match event {
                Event::Shutdown => {
                    tracing::info!("session shutdown requested");
                    break;
                }
                Event::Command(None) | Event::Command(Some(SessionCommand::Quit)) => break,
                Event::Command(Some(command)) => {
                    if let Some(next) = self.handle_command(command, &mut ticker).await {
                        hold = next;
                    }
                }
                Event::PollDue => self.spawn_poll(&mut in_flight),
                Event::PollDone(Ok((ticket, result))) => {
                    ticker.reset();
                    self.handle_poll(ticket, result);
                }
                Event::PollDone(Err(err)) => {
                    tracing::error!(error = %err, "poll task did not complete");
                }
                Event::HoldExpired(ticket) => {
                    hold = None;
                    if self.controller.expire_hold(ticket) {
                        self.render();
                    }
                }
            }

            if self.exit_after_task && self.attempted_run && !self.controller.is_active() {
                break;
            }
        }

        in_flight.abort_all();
        *self.controller.display()
    }

    /// Returns `Some(new_hold)` when the hold timer must be replaced.
    async fn handle_command(
        &mut self,
        command: SessionCommand,
        ticker: &mut Interval,
    ) -> Option<Option<PendingHold>> {
        match command {
            SessionCommand::Append(direction) => {
                self.buffer.append(direction);
                self.show_buffer();
            }
            SessionCommand::Set(value) => {
                self.buffer.set(&value);
                self.show_buffer();
            }
            SessionCommand::Clear => {
                self.buffer.clear();
                self.show_buffer();
            }
            SessionCommand::Show => {
                self.render();
                self.show_buffer();
                if let Some(running) = self.controller.active_commands() {
                    let running = format!("running: {running}");
                    self.notify(Notice::info(running));
                }
            }
            SessionCommand::Run => {
                self.attempted_run = true;
                match self.controller.run(self.buffer.as_str()).await {
                    Ok(ticket) => {
                        ticker.reset();
                        self.notify(Notice::info(format!(
                            "task {} started on robot {}",
                            ticket.task_id,
                            self.controller.robot_id()
                        )));
                        self.render();
                        return Some(None);
                    }
                    Err(ControllerError::Create(err)) => {
                        self.notify(Notice::error(format!("task rejected: {err}")));
                        self.render();
                    }
                    Err(err) => self.notify(Notice::error(err.to_string())),
                }
            }
            SessionCommand::Cancel => match self.controller.cancel().await {
                Ok(CancelOutcome::NoActiveTask) => {
                    self.notify(Notice::info("no active task to cancel"));
                }
                Ok(CancelOutcome::Cancelled { task_id, hold }) => {
                    self.notify(Notice::info(format!("task {task_id} cancelled")));
                    self.render();
                    return Some(Some(PendingHold {
                        ticket: hold,
                        sleep: Box::pin(tokio::time::sleep(self.controller.policy().cancel_hold)),
                    }));
                }
                Err(err) => self.notify(Notice::error(err.to_string())),
            },
            SessionCommand::Quit => {}
        }
        None
    }

    fn spawn_poll(&mut self, in_flight: &mut JoinSet<PollResult>) {
        let Some(ticket) = self.controller.poll_ticket() else {
            return;
        };
        let api = self.controller.api();
        tracing::trace!(task_id = %ticket.task_id, "polling task status");
        in_flight.spawn(async move {
            let result = api.get_task_status(&ticket.task_id).await;
            (ticket, result)
        });
    }

    fn handle_poll(&mut self, ticket: PollTicket, result: Result<Task, RobotError>) {
        // Only read when the outcome counts as a failure.
        let error_text = match &result {
            Ok(task) => format!("engine answered with task {}", task.task_id),
            Err(err) => err.to_string(),
        };
        let outcome = self.controller.apply_poll(&ticket, result);

        match outcome {
            PollOutcome::Stale => {}
            PollOutcome::Progress => self.render(),
            PollOutcome::Terminal(status) => {
                self.render();
                let mut message = format!("task {} {}", ticket.task_id, status);
                let reason = self
                    .controller
                    .last_snapshot()
                    .and_then(|task| task.error.as_deref());
                if let Some(reason) = reason {
                    message.push_str(&format!(": {reason}"));
                }
                let notice = if status == TaskStatus::Failed {
                    Notice::error(message)
                } else {
                    Notice::info(message)
                };
                self.notify(notice);
            }
            PollOutcome::Vanished => {
                self.render();
                self.notify(Notice::error(format!(
                    "task {} no longer exists on the engine",
                    ticket.task_id
                )));
            }
            PollOutcome::Transient { failures } => {
                let budget = self.controller.policy().max_consecutive_failures;
                self.notify(Notice::error(format!(
                    "status check failed ({failures}/{budget}): {error_text}"
                )));
            }
            PollOutcome::Abandoned { failures } => {
                self.render();
                self.notify(Notice::error(format!(
                    "gave up on task {} after {failures} failed status checks: {error_text}",
                    ticket.task_id
                )));
            }
        }
    }

    fn render(&mut self) {
        let state = *self.controller.display();
        self.sink.render(&state);
    }

    fn notify(&mut self, notice: Notice) {
        self.sink.notify(&notice);
    }

    fn show_buffer(&mut self) {
        let text = if self.buffer.is_empty() {
            "commands: (empty)".to_string()
        } else {
            format!("commands: {}", self.buffer)
        };
        self.notify(Notice::info(text));
    }
}

async fn hold_elapsed(hold: &mut Option<PendingHold>) -> HoldTicket {
    match hold {
        Some(pending) => {
            pending.sleep.as_mut().await;
            pending.ticket
        }
        None => std::future::pending().await,
    }
}
