/*
[INPUT]:  Scripted task responses queued by tests or demos
[OUTPUT]: TaskApi implementation that replays them and records calls
[POS]:    API seam - in-process fake engine
[UPDATE]: When TaskApi gains operations
*/

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::TaskApi;
use crate::http::{Result, RobotError};
use crate::types::{RobotState, Task, TaskStatus};

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Create { robot_id: String, commands: String },
    GetStatus { task_id: String },
    Cancel { task_id: String },
}

#[derive(Debug, Default)]
struct Script {
    creates: VecDeque<Result<Task>>,
    statuses: VecDeque<Result<Task>>,
    cancels: VecDeque<Result<()>>,
    calls: Vec<MockCall>,
}

/// Mock task engine for testing.
///
/// Responses are consumed in FIFO order per operation. An exhausted queue
/// answers with `RobotError::InvalidResponse` so unexpected calls fail loudly.
/// Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct MockTaskApi {
    script: Arc<Mutex<Script>>,
    status_delay: Option<Duration>,
}

impl MockTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every status response; lets tests race polls against cancel.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn push_create(&self, response: Result<Task>) -> &Self {
        self.lock().creates.push_back(response);
        self
    }

    pub fn push_status(&self, response: Result<Task>) -> &Self {
        self.lock().statuses.push_back(response);
        self
    }

    pub fn push_cancel(&self, response: Result<()>) -> &Self {
        self.lock().cancels.push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::GetStatus { .. }))
            .count()
    }

    /// Build a snapshot with the given id, status and position.
    pub fn snapshot(task_id: &str, status: TaskStatus, x: u32, y: u32) -> Task {
        Task {
            task_id: task_id.to_string(),
            robot_id: "0".to_string(),
            commands: String::new(),
            status,
            current_state: Some(RobotState {
                x,
                y,
                has_crate: false,
            }),
            error: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A poisoned script only happens after a test already panicked.
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn exhausted(operation: &str) -> RobotError {
    RobotError::InvalidResponse(format!("mock has no scripted {operation} response"))
}

#[async_trait]
impl TaskApi for MockTaskApi {
    async fn create_task(&self, robot_id: &str, commands: &str) -> Result<Task> {
        let mut script = self.lock();
        script.calls.push(MockCall::Create {
            robot_id: robot_id.to_string(),
            commands: commands.to_string(),
        });
        script
            .creates
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("create")))
    }

    async fn get_task_status(&self, task_id: &str) -> Result<Task> {
        let response = {
            let mut script = self.lock();
            script.calls.push(MockCall::GetStatus {
                task_id: task_id.to_string(),
            });
            script
                .statuses
                .pop_front()
                .unwrap_or_else(|| Err(exhausted("status")))
        };
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn cancel_task(&self, task_id: &str) -> Result<()> {
        let mut script = self.lock();
        script.calls.push(MockCall::Cancel {
            task_id: task_id.to_string(),
        });
        script
            .cancels
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("cancel")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let api = MockTaskApi::new();
        api.push_status(Ok(MockTaskApi::snapshot("t1", TaskStatus::Pending, 0, 1)))
            .push_status(Ok(MockTaskApi::snapshot("t1", TaskStatus::Completed, 0, 2)));

        let first = api.get_task_status("t1").await.unwrap();
        let second = api.get_task_status("t1").await.unwrap();
        assert_eq!(first.status, TaskStatus::Pending);
        assert_eq!(second.status, TaskStatus::Completed);
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_exhausted_queue_errors() {
        let api = MockTaskApi::new();
        let err = api.cancel_task("t1").await.unwrap_err();
        assert!(matches!(err, RobotError::InvalidResponse(_)));
        assert_eq!(
            api.calls(),
            vec![MockCall::Cancel {
                task_id: "t1".to_string()
            }]
        );
    }
}
