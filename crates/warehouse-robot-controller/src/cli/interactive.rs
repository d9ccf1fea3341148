/*
[INPUT]:  Operator lines on stdin
[OUTPUT]: SessionCommand messages for the running session
[POS]:    CLI interactive flow - line prompt and cancel confirmation
[UPDATE]: When adding prompt commands or changing confirmation rules
*/

use std::io::BufRead;
use std::thread::JoinHandle;

use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use tokio::sync::mpsc;
use tracing::warn;

use warehouse_robot_controller::{Direction, SessionCommand};

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Send(SessionCommand),
    /// Cancel goes through confirmation before it is sent.
    Cancel,
    Help,
    Ignore,
    Invalid(String),
}

pub fn parse_line(line: &str) -> InputAction {
    let line = line.trim();
    if line.is_empty() {
        return InputAction::Ignore;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "set" if rest.is_empty() => InputAction::Invalid("usage: set <COMMANDS>".to_string()),
        "set" => InputAction::Send(SessionCommand::Set(rest.to_string())),
        "clear" => InputAction::Send(SessionCommand::Clear),
        "run" => InputAction::Send(SessionCommand::Run),
        "cancel" => InputAction::Cancel,
        "show" => InputAction::Send(SessionCommand::Show),
        "help" | "?" => InputAction::Help,
        "quit" | "exit" | "q" => InputAction::Send(SessionCommand::Quit),
        other => match other.parse::<Direction>() {
            Ok(direction) if rest.is_empty() => InputAction::Send(SessionCommand::Append(direction)),
            _ => InputAction::Invalid(format!("unknown command {word:?}, type help")),
        },
    }
}

pub fn print_help() {
    let moves = Direction::ALL
        .iter()
        .map(|direction| direction.as_char().to_ascii_lowercase().to_string())
        .collect::<Vec<_>>()
        .join(" | ");
    println!("{}", style("Commands").bold().cyan());
    println!("  {moves:<16} append a move");
    println!("  {:<16} replace the buffer", "set <CMDS>");
    println!("  {:<16} empty the buffer", "clear");
    println!("  {:<16} submit the buffer as a task", "run");
    println!("  {:<16} cancel the running task", "cancel");
    println!("  {:<16} redraw the grid and buffer", "show");
    println!("  {:<16} this list", "help");
    println!("  {:<16} leave", "quit");
}

fn confirm_cancel() -> bool {
    match Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Cancel the running task?")
        .default(false)
        .interact()
    {
        Ok(confirmed) => confirmed,
        Err(err) => {
            warn!(error = %err, "cancel confirmation failed");
            false
        }
    }
}

/// Read stdin on its own thread and forward commands until quit or EOF.
///
/// Not a runtime blocking task: a pending stdin read cannot be interrupted
/// and would hold up runtime shutdown.
pub fn spawn_input_reader(
    commands: mpsc::Sender<SessionCommand>,
    confirm: bool,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "failed to read stdin");
                        break;
                    }
                }

                let command = match parse_line(&line) {
                    InputAction::Send(command) => command,
                    InputAction::Cancel => {
                        if confirm && !confirm_cancel() {
                            continue;
                        }
                        SessionCommand::Cancel
                    }
                    InputAction::Help => {
                        print_help();
                        continue;
                    }
                    InputAction::Ignore => continue,
                    InputAction::Invalid(message) => {
                        eprintln!("{} {message}", style("error:").red().bold());
                        continue;
                    }
                };

                let quit = command == SessionCommand::Quit;
                if commands.blocking_send(command).is_err() || quit {
                    return;
                }
            }
            // End of input ends the session.
            let _ = commands.blocking_send(SessionCommand::Quit);
        })
}
