use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use caddie_core::round::MAX_HOLE_STROKES;

/// Slash commands offered for completion.
pub const COMMAND_NAMES: [&str; 11] = [
    "/new",
    "/resume",
    "/menu",
    "/scorecard",
    "/hole",
    "/course",
    "/score",
    "/photo",
    "/reset",
    "/help",
    "/quit",
];

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewRound,
    Resume,
    Menu,
    Scorecard,
    Hole(u32),
    Course(String),
    Score {
        hole: u32,
        score: u32,
        par: Option<u32>,
    },
    Photo {
        path: PathBuf,
        description: Option<String>,
    },
    Reset,
    Help,
    Quit,
    /// Anything that is not a command goes to the caddie.
    Say(String),
}

pub const HELP: &str = "\
/new                      start a new round
/resume                   go back to the current round
/menu                     leave the round for the main menu
/scorecard                show the current round's scorecard
/hole N                   set the hole you are playing
/course NAME              name the course
/score HOLE STROKES [PAR] record a hole score
/photo PATH [TEXT]        send a photo of your situation
/reset                    delete all saved rounds
/quit                     exit
Anything else is sent to your caddie.";

/// Parses a trimmed, non-empty input line.
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Ok(Command::Say(line.to_string()));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "/new" => Command::NewRound,
        "/resume" => Command::Resume,
        "/menu" => Command::Menu,
        "/scorecard" => Command::Scorecard,
        "/hole" => Command::Hole(number(rest, "hole number")?),
        "/course" => {
            if rest.is_empty() {
                bail!("Usage: /course NAME");
            }
            Command::Course(rest.to_string())
        }
        "/score" => {
            let mut args = rest.split_whitespace();
            let (Some(hole), Some(score)) = (args.next(), args.next()) else {
                bail!("Usage: /score HOLE STROKES [PAR]");
            };
            let par = args.next().map(|p| strokes(p, "par")).transpose()?;
            Command::Score {
                hole: number(hole, "hole number")?,
                score: strokes(score, "strokes")?,
                par,
            }
        }
        "/photo" => {
            if rest.is_empty() {
                bail!("Usage: /photo PATH [TEXT]");
            }
            let (path, description) = match rest.split_once(char::is_whitespace) {
                Some((path, text)) => (path, Some(text.trim().to_string())),
                None => (rest, None),
            };
            Command::Photo {
                path: PathBuf::from(path),
                description: description.filter(|d| !d.is_empty()),
            }
        }
        "/reset" => Command::Reset,
        "/help" | "/?" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => bail!("Unknown command '{}'. Type /help for the list.", other),
    };
    Ok(command)
}

fn number(text: &str, what: &str) -> Result<u32> {
    let value: u32 = text
        .trim()
        .parse()
        .with_context(|| format!("Expected a {what}, got '{text}'"))?;
    if value == 0 {
        bail!("The {what} must be at least 1");
    }
    Ok(value)
}

fn strokes(text: &str, what: &str) -> Result<u32> {
    let value = number(text, what)?;
    if value > MAX_HOLE_STROKES {
        bail!("The {what} must be at most {MAX_HOLE_STROKES}");
    }
    Ok(value)
}
