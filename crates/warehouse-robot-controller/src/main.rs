/*
[INPUT]:  CLI arguments, YAML configuration file, stdin, OS shutdown signals
[OUTPUT]: Interactive or one-shot robot task session with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use console::style;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use warehouse_robot_adapter::WarehouseClient;
use warehouse_robot_controller::{
    ControllerConfig, DisplayStatus, GridRenderer, Session, SessionCommand, TaskController,
};

type TerminalSession = Session<WarehouseClient, GridRenderer<std::io::Stdout>>;

#[derive(Parser, Debug)]
#[command(
    name = "warehouse-robot-controller",
    version,
    about = "Drive a warehouse robot through command batches"
)]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Overrides engine.base_url
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,
    /// Overrides robot_id
    #[arg(long = "robot-id", value_name = "ID")]
    robot_id: Option<String>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Write logs to this file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Run one batch to completion and exit
    #[arg(long = "exec", value_name = "CMDS")]
    exec: Option<String>,
    /// Cancel without asking
    #[arg(long = "yes", short = 'y')]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_file.as_deref())?;

    let config = load_config(&args)?;
    info!(
        base_url = %config.engine.base_url,
        robot_id = %config.robot_id,
        interval_ms = config.polling.interval_ms,
        dry_run = args.dry_run,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let client = config.build_client().context("build engine client")?;
    let controller = TaskController::new(
        Arc::new(client),
        config.robot_id.clone(),
        config.poll_policy(),
    );

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let (tx, rx) = mpsc::channel(32);
    let session = Session::new(
        controller,
        config.command_buffer(),
        GridRenderer::new(std::io::stdout()),
        rx,
        shutdown.clone(),
    );

    match args.exec {
        Some(commands) => run_once(session, tx, commands).await,
        None => run_interactive(session, tx, !args.yes && std::io::stdin().is_terminal()).await,
    }
}

async fn run_once(
    session: TerminalSession,
    tx: mpsc::Sender<SessionCommand>,
    commands: String,
) -> Result<()> {
    let mut session = session.exit_after_task();
    tx.send(SessionCommand::Set(commands))
        .await
        .context("queue command batch")?;
    tx.send(SessionCommand::Run).await.context("queue run")?;

    // `tx` stays alive until the session returns so the channel does not close early.
    let state = session.run().await;
    drop(tx);

    info!(status = %state.status, x = state.position.x, y = state.position.y, "session finished");
    match state.status {
        DisplayStatus::Completed => Ok(()),
        status => bail!("task did not complete (status {status})"),
    }
}

async fn run_interactive(
    mut session: TerminalSession,
    tx: mpsc::Sender<SessionCommand>,
    confirm_cancel: bool,
) -> Result<()> {
    println!("{}", style("Warehouse robot controller").bold().cyan());
    cli::interactive::print_help();
    cli::interactive::spawn_input_reader(tx, confirm_cancel).context("start input reader")?;

    let state = session.run().await;
    info!(status = %state.status, "session ended");
    Ok(())
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow!(err))
            .context("initialize tracing subscriber")?;
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path.file_name().context("log file path must name a file")?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(Some(guard))
}

fn load_config(args: &Cli) -> Result<ControllerConfig> {
    let mut config = ControllerConfig::load(args.config_path.as_deref()).context("load config")?;
    if let Some(base_url) = &args.base_url {
        config.engine.base_url = base_url.clone();
    }
    if let Some(robot_id) = &args.robot_id {
        config.robot_id = robot_id.clone();
    }
    config.validate().context("validate config")?;
    Ok(config)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
