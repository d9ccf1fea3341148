/*
[INPUT]:  Mock engine requirements
[OUTPUT]: Shared fixtures for session-level tests
[POS]:    Test infrastructure - shared across controller integration tests
[UPDATE]: When adding new test patterns or fixtures
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use warehouse_robot_adapter::{ClientConfig, WarehouseClient};
use warehouse_robot_controller::{
    CommandBuffer, PollPolicy, RecordingSink, Session, SessionCommand, TaskController,
};
use wiremock::MockServer;

pub type TestSession = Session<WarehouseClient, RecordingSink>;

/// Fast cadence so real-time tests finish quickly
pub fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(50),
        max_consecutive_failures: 3,
        cancel_hold: Duration::from_millis(150),
    }
}

pub fn session_for(
    server: &MockServer,
    policy: PollPolicy,
) -> (TestSession, mpsc::Sender<SessionCommand>, CancellationToken) {
    let client = WarehouseClient::with_config_and_base_url(
        ClientConfig {
            timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(1),
        },
        &format!("{}/api/", server.uri()),
    )
    .expect("client init");
    let (tx, rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let controller = TaskController::new(Arc::new(client), "0", policy);
    let session = Session::new(
        controller,
        CommandBuffer::new(),
        RecordingSink::default(),
        rx,
        shutdown.clone(),
    );
    (session, tx, shutdown)
}

/// Engine-shaped task body
pub fn task_body(task_id: &str, status: &str, x: u32, y: u32) -> serde_json::Value {
    serde_json::json!({
        "task_id": task_id,
        "robot_id": "0",
        "commands": "NNEE",
        "status": status,
        "current_state": { "x": x, "y": y, "has_crate": false },
        "error": "",
        "create_at": "2025-01-01T00:00:00Z",
        "update_at": "2025-01-01T00:00:00Z"
    })
}
