/*
[INPUT]:  Task operations requested by the lifecycle controller
[OUTPUT]: Transport-agnostic task API trait
[POS]:    API seam - lets the controller run against HTTP or a scripted fake
[UPDATE]: When task operations are added or their signatures change
*/

use async_trait::async_trait;

use crate::http::{Result, WarehouseClient};
use crate::types::Task;

pub mod mock;

pub use mock::{MockCall, MockTaskApi};

/// The three remote task operations.
///
/// Each call is a single round trip; retries are the caller's business.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Create a task; the returned snapshot carries the engine-assigned id.
    async fn create_task(&self, robot_id: &str, commands: &str) -> Result<Task>;

    /// Fetch the latest snapshot for a task.
    async fn get_task_status(&self, task_id: &str) -> Result<Task>;

    /// Cancel a task. Success does not imply the engine will report
    /// `CANCELLED` afterwards; the task may simply disappear.
    async fn cancel_task(&self, task_id: &str) -> Result<()>;
}

#[async_trait]
impl TaskApi for WarehouseClient {
    async fn create_task(&self, robot_id: &str, commands: &str) -> Result<Task> {
        WarehouseClient::create_task(self, robot_id, commands).await
    }

    async fn get_task_status(&self, task_id: &str) -> Result<Task> {
        WarehouseClient::get_task_status(self, task_id).await
    }

    async fn cancel_task(&self, task_id: &str) -> Result<()> {
        WarehouseClient::cancel_task(self, task_id).await
    }
}
