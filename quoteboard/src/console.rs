//! Interactive commands read from stdin.
//!
//! One command per line:
//! - `search <text>` / `clear`
//! - `sort <field>` (same field again flips the direction)
//! - `refresh`, `show`, `quit`
use std::io::{self, BufRead};
use std::str::FromStr;
use std::thread;

use crossbeam_channel::Sender;
use log::{debug, warn};
use quoteboard_core::SortField;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Search(String),
    Clear,
    Sort(SortField),
    Refresh,
    Show,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "search" | "s" => Ok(ConsoleCommand::Search(rest.to_string())),
            "clear" | "c" => Ok(ConsoleCommand::Clear),
            "sort" | "o" => rest
                .parse::<SortField>()
                .map(ConsoleCommand::Sort)
                .map_err(|_| format!("unknown sort field '{rest}'")),
            "refresh" | "r" => Ok(ConsoleCommand::Refresh),
            "show" | "v" => Ok(ConsoleCommand::Show),
            "quit" | "q" | "exit" => Ok(ConsoleCommand::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

/// Spawns a thread that forwards parsed stdin commands to `tx`.
///
/// The thread exits when stdin closes or the receiver is dropped.
pub fn spawn_stdin_reader(tx: Sender<ConsoleCommand>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ConsoleCommand>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        debug!("Stdin reader stopping...");
    });
}
