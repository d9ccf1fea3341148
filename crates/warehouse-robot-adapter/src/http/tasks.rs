/*
[INPUT]:  Robot id, command batches and task ids
[OUTPUT]: Task snapshots or typed failures
[POS]:    HTTP layer - task endpoints (create, status, cancel)
[UPDATE]: When task routes or their status codes change
*/

use reqwest::Method;

use crate::http::{Result, RobotError, WarehouseClient};
use crate::types::{CreateTaskRequest, Task};

impl WarehouseClient {
    /// Submit a command batch for a robot
    ///
    /// POST /robots/{robot_id}/tasks
    pub async fn create_task(&self, robot_id: &str, commands: &str) -> Result<Task> {
        let body = CreateTaskRequest {
            commands: commands.to_string(),
        };
        let builder = self
            .request(Method::POST, &["robots", robot_id, "tasks"])?
            .json(&body);
        let response = self.send(builder).await?;

        if !response.status().is_success() {
            let (status, error) = Self::read_error(response).await;
            tracing::warn!(
                robot_id,
                status = status.as_u16(),
                code = %error.code,
                "create task rejected: {}",
                error.message
            );
            return Err(RobotError::validation(status, &error));
        }

        let task: Task = Self::decode_json(response).await?;
        tracing::debug!(task_id = %task.task_id, status = %task.status, "task created");
        Ok(task)
    }

    /// Fetch the current snapshot of a task
    ///
    /// GET /tasks/{task_id}
    pub async fn get_task_status(&self, task_id: &str) -> Result<Task> {
        let builder = self.request(Method::GET, &["tasks", task_id])?;
        let response = self.send(builder).await?;

        if !response.status().is_success() {
            let (status, error) = Self::read_error(response).await;
            return Err(RobotError::for_task(task_id, status, &error));
        }

        Self::decode_json(response).await
    }

    /// Cancel (delete) a task
    ///
    /// DELETE /tasks/{task_id}
    pub async fn cancel_task(&self, task_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &["tasks", task_id])?;
        let response = self.send(builder).await?;

        if !response.status().is_success() {
            let (status, error) = Self::read_error(response).await;
            tracing::warn!(
                task_id,
                status = status.as_u16(),
                code = %error.code,
                "cancel task failed: {}",
                error.message
            );
            return Err(RobotError::for_task(task_id, status, &error));
        }

        tracing::debug!(task_id, "task cancelled");
        Ok(())
    }
}
