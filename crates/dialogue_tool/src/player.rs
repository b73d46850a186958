// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive console preview.
//!
//! Reads one command per line from stdin while the session's timer task
//! advances event nodes in the background. Log entries are printed with
//! 1-based numbers, which is also how `r` refers to them.

use crate::commands::Result;
use dialogue_graph::{Branch, NodeKind};
use dialogue_preview::{Decision, LogEntry, PreviewSession, PreviewSettings, PreviewState};
use std::fmt::Write as _;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Continue past a statement
    Continue,
    /// Pick a question choice
    Choose(u32),
    /// Pick a condition branch
    Branch(Branch),
    /// Replace the decision at a 1-based log position
    Rewind(usize, Decision),
    /// Start over from the root
    Restart,
    /// Print the command list
    Help,
    /// Leave the preview
    Quit,
}

/// Input that could not be understood
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Not a known command
    #[error("Unknown command `{0}` (type h for help)")]
    Unknown(String),

    /// Rewind without an entry and a decision
    #[error("Usage: r <entry> <choice|t|f>")]
    RewindUsage,

    /// Entry zero requested
    #[error("Log entries are numbered from 1")]
    ZeroEntry,
}

const HELP: &str = "\
  <Enter>          continue a statement
  <n>              pick choice n
  t | f            pick the true or false branch
  r <entry> <opt>  rewind entry to choice <opt> or branch t/f
  s                restart
  q                quit";

fn parse_decision(word: &str) -> Option<Decision> {
    match word {
        "t" | "true" => Some(Decision::Branch(Branch::True)),
        "f" | "false" => Some(Decision::Branch(Branch::False)),
        _ => word.parse().ok().map(Decision::Choice),
    }
}

/// Parse a line of input
pub fn parse_command(line: &str) -> std::result::Result<PlayerCommand, InputError> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(PlayerCommand::Continue);
    };

    let command = match first {
        "q" | "quit" => PlayerCommand::Quit,
        "h" | "help" | "?" => PlayerCommand::Help,
        "s" | "restart" => PlayerCommand::Restart,
        "r" | "rewind" => {
            let entry: usize = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or(InputError::RewindUsage)?;
            let decision = words
                .next()
                .and_then(parse_decision)
                .ok_or(InputError::RewindUsage)?;
            if entry == 0 {
                return Err(InputError::ZeroEntry);
            }
            PlayerCommand::Rewind(entry, decision)
        }
        other => match parse_decision(other) {
            Some(Decision::Choice(index)) => PlayerCommand::Choose(index),
            Some(Decision::Branch(branch)) => PlayerCommand::Branch(branch),
            None => return Err(InputError::Unknown(other.to_string())),
        },
    };

    if words.next().is_some() {
        return Err(InputError::Unknown(line.trim().to_string()));
    }
    Ok(command)
}

fn speaker_prefix(speaker: &str, mood: &str) -> String {
    match (speaker.is_empty(), mood.is_empty()) {
        (true, _) => String::new(),
        (false, true) => format!("{speaker}: "),
        (false, false) => format!("{speaker} ({mood}): "),
    }
}

/// Render a log entry at a 1-based position
pub fn render_entry(position: usize, entry: &LogEntry) -> String {
    let mut out = String::new();
    match entry {
        LogEntry::Statement { speaker, mood, text, .. } => {
            let _ = write!(out, "[{position}] {}{text}", speaker_prefix(speaker, mood));
        }
        LogEntry::Question { speaker, mood, text, choices, selected_index, .. } => {
            let _ = write!(out, "[{position}] {}{text}", speaker_prefix(speaker, mood));
            for choice in choices {
                let marker = if *selected_index == Some(choice.index) { '>' } else { ' ' };
                let _ = write!(out, "\n    {marker} {}) {}", choice.index, choice.text);
            }
        }
        LogEntry::Condition { var_name, operator, value, selected_branch, .. } => {
            let _ = write!(out, "[{position}] if {var_name} {operator} {value}");
            if let Some(branch) = selected_branch {
                let _ = write!(out, " -> {branch}");
            }
        }
        LogEntry::Event { event_name, parameters, .. } => {
            let _ = write!(out, "[{position}] <{event_name}>");
            if !parameters.is_empty() {
                let args: Vec<String> =
                    parameters.iter().map(|(k, v)| format!("{k}={v}")).collect();
                let _ = write!(out, " {}", args.join(", "));
            }
        }
    }
    out
}

/// Hint for what the current entry is waiting on
pub fn prompt(state: &PreviewState, current: Option<&LogEntry>) -> &'static str {
    match (state, current.map(LogEntry::kind)) {
        (PreviewState::Presenting(_), Some(NodeKind::Statement)) => "[Enter] continue",
        (PreviewState::Presenting(_), Some(NodeKind::Question)) => "pick a choice",
        (PreviewState::Presenting(_), Some(NodeKind::Condition)) => "[t]rue or [f]alse",
        (PreviewState::Presenting(_), Some(NodeKind::Event)) => "...",
        (PreviewState::Finished, _) => "-- end -- (r to rewind, s to restart, q to quit)",
        _ => "",
    }
}

/// Prints new log entries as the session moves
#[derive(Debug, Default)]
struct Printer {
    shown: usize,
    revision: u64,
}

impl Printer {
    fn refresh(&mut self, session: &PreviewSession, show_visited: bool) {
        let snapshot = session.snapshot();
        if snapshot.revision == self.revision && self.shown == snapshot.log_len {
            return;
        }
        self.revision = snapshot.revision;

        let log = session.log();
        self.shown = self.shown.min(log.len());
        for (i, entry) in log.iter().enumerate().skip(self.shown) {
            println!("{}", render_entry(i + 1, entry));
        }
        self.shown = log.len();

        if show_visited && !snapshot.highlight.visited.is_empty() {
            let visited: Vec<&str> =
                snapshot.highlight.visited.iter().map(|id| id.as_str()).collect();
            println!("    visited: {}", visited.join(" "));
        }
        let hint = prompt(&snapshot.state, log.last());
        if !hint.is_empty() {
            println!("{hint}");
        }
    }

    /// Reprint from a 0-based position on the next refresh
    fn rewind_to(&mut self, entry: usize) {
        self.shown = self.shown.min(entry);
    }
}

fn apply(
    session: &PreviewSession,
    printer: &mut Printer,
    command: PlayerCommand,
) -> dialogue_preview::engine::Result<()> {
    match command {
        PlayerCommand::Continue => {
            session.advance()?;
        }
        PlayerCommand::Choose(index) => {
            session.select_choice(index)?;
        }
        PlayerCommand::Branch(branch) => {
            session.select_branch(branch)?;
        }
        PlayerCommand::Rewind(entry, decision) => {
            session.rewind(entry - 1, decision)?;
            printer.rewind_to(entry - 1);
        }
        PlayerCommand::Restart => {
            session.start();
            printer.rewind_to(0);
        }
        PlayerCommand::Help | PlayerCommand::Quit => {}
    }
    Ok(())
}

/// Play a session on the console until the user quits or stdin closes
pub async fn run(session: PreviewSession, settings: &PreviewSettings) -> Result<()> {
    let mut updates = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printer = Printer::default();

    session.start();
    if session.log().is_empty() {
        println!("Nothing to play: no start node");
    }
    printer.refresh(&session, settings.show_visited);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(PlayerCommand::Quit) => break,
                    Ok(PlayerCommand::Help) => println!("{HELP}"),
                    Ok(command) => {
                        if let Err(err) = apply(&session, &mut printer, command) {
                            println!("! {err}");
                        }
                    }
                    Err(err) => println!("! {err}"),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        printer.refresh(&session, settings.show_visited);
    }

    session.close();
    tracing::debug!("Preview closed");
    Ok(())
}
