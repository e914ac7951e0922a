use std::path::PathBuf;

use super::command_registry::{all_specs, find_spec, resolve_alias};
use super::session::SessionMode;

/// One line of studio input, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum StudioCommand {
    Noop,
    Help,
    Quit,
    Styles,
    Undo,
    Redo,
    History,
    Reset,
    Upload(PathBuf),
    Compare(Option<PathBuf>),
    Save(Option<PathBuf>),
    Style(String),
    Mode(SessionMode),
    Slider(f64),
    /// Free text routed by the session mode.
    Submit(String),
    Invalid { command: String, reason: String },
}

pub fn help_lines() -> Vec<&'static str> {
    all_specs().map(|spec| spec.usage).collect()
}

pub fn parse_command(line: &str) -> StudioCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return StudioCommand::Noop;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return StudioCommand::Submit(line.trim_end_matches(['\n', '\r']).to_string());
    };

    let (head, arg) = match rest.split_once(char::is_whitespace) {
        Some((head, arg)) => (head, arg.trim()),
        None => (rest, ""),
    };
    let lowered = head.to_ascii_lowercase();
    let command = resolve_alias(&lowered);

    if find_spec(command).is_none() {
        return invalid(command, "unknown command; try /help");
    }

    match command {
        "help" => StudioCommand::Help,
        "quit" => StudioCommand::Quit,
        "styles" => StudioCommand::Styles,
        "undo" => StudioCommand::Undo,
        "redo" => StudioCommand::Redo,
        "history" => StudioCommand::History,
        "reset" => StudioCommand::Reset,
        "upload" => match parse_single_path_arg(arg) {
            Some(path) => StudioCommand::Upload(path),
            None => invalid(command, "requires a path"),
        },
        "compare" => StudioCommand::Compare(parse_single_path_arg(arg)),
        "save" => StudioCommand::Save(parse_single_path_arg(arg)),
        "style" => {
            let id = arg.trim().to_ascii_lowercase();
            if id.is_empty() {
                return invalid(command, "requires a style id");
            }
            StudioCommand::Style(id)
        }
        "mode" => match SessionMode::parse(arg) {
            Some(mode) => StudioCommand::Mode(mode),
            None => invalid(command, "expects chat or edit"),
        },
        "slider" => match parse_percent(arg) {
            Some(value) => StudioCommand::Slider(value),
            None => invalid(command, "expects a number between 0 and 100"),
        },
        other => invalid(other, "unknown command; try /help"),
    }
}

fn invalid(command: &str, reason: &str) -> StudioCommand {
    StudioCommand::Invalid {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

/// A single path; unquoted paths with spaces are joined back together.
fn parse_single_path_arg(arg: &str) -> Option<PathBuf> {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next().map(PathBuf::from),
        _ => Some(PathBuf::from(parts.join(" "))),
    }
}

fn parse_percent(arg: &str) -> Option<f64> {
    let value: f64 = arg.trim().trim_end_matches('%').parse().ok()?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return None;
    }
    Some(value)
}
