/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for warehouse-robot-adapter tests

use warehouse_robot_adapter::{ClientConfig, WarehouseClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server's `/api` prefix
pub fn client_for(server: &MockServer) -> WarehouseClient {
    WarehouseClient::with_config_and_base_url(
        ClientConfig::default(),
        &format!("{}/api/", server.uri()),
    )
    .expect("client init")
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
