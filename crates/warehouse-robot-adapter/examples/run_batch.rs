//! Submit a batch to a running engine and poll it to completion.
//!
//! Usage: cargo run -p warehouse-robot-adapter --example run_batch -- NNEE

use std::time::Duration;

use warehouse_robot_adapter::WarehouseClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let commands = std::env::args().nth(1).unwrap_or_else(|| "NNEE".to_string());
    let client = WarehouseClient::new()?;

    let task = client.create_task("0", &commands).await?;
    println!("created {} ({})", task.task_id, task.status);

    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = client.get_task_status(&task.task_id).await?;
        let position = snapshot.current_state.unwrap_or_default();
        println!("{} at ({}, {})", snapshot.status, position.x, position.y);
        if snapshot.is_terminal() {
            break;
        }
    }

    Ok(())
}
