use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use caddie_application::RoundSessionManager;
use caddie_core::media::{MediaKind, PhotoBlob};
use caddie_core::round::{Message, Role, RoundStats, Screen};
use caddie_core::scorecard::ScorecardSummary;
use caddie_infrastructure::{CaddiePaths, ConfigService, JsonGolfDataRepository};
use caddie_interaction::{GeminiChatBackend, speech_sink_from_config};

mod commands;
mod helper;
mod logger;

use commands::{Command, HELP};
use helper::CliHelper;

#[derive(Parser)]
#[command(name = "caddie")]
#[command(about = "Caddie - a conversational golf caddie in your terminal", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for saved rounds and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Gemini model to talk to
    #[arg(long)]
    model: Option<String>,

    /// Speak caddie replies with the configured TTS command
    #[arg(long, conflicts_with = "no_speech")]
    speak: bool,

    /// Never speak replies
    #[arg(long)]
    no_speech: bool,

    /// Mirror logs to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point of the caddie REPL.
///
/// Loads config, restores saved rounds, then reads golfer input line by
/// line. Slash commands drive the round; anything else is a turn.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ===== Configuration =====
    let mut config = match &cli.config {
        Some(path) => ConfigService::load_from(path)?,
        None => ConfigService::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.config_mut().storage.data_dir = Some(dir.clone());
    }
    if let Some(model) = &cli.model {
        config.config_mut().gemini.model = model.clone();
    }
    if cli.speak {
        config.config_mut().speech.enabled = true;
    }
    if cli.no_speech {
        config.config_mut().speech.enabled = false;
    }

    let data_dir = config.data_dir()?;
    let _log_guard = logger::init(&CaddiePaths::logs_dir(&data_dir), cli.verbose)?;

    // ===== Backend Initialization =====
    let backend = GeminiChatBackend::from_config(&config.config().gemini, config.api_key()?)?;
    tracing::info!("[Caddie] Using model {}", backend.model());
    let repository = Arc::new(JsonGolfDataRepository::new(&data_dir));
    let speech = speech_sink_from_config(&config.config().speech);
    let manager = RoundSessionManager::new(repository, Arc::new(backend), speech);

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Caddie ===".bright_green().bold());
    let screen = manager.bootstrap().await?;
    render_screen(&manager, screen).await;

    // ===== Main REPL Loop =====
    loop {
        let prompt = match manager.screen().await {
            Screen::ActiveRound => "⛳ ",
            _ => ">> ",
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match commands::parse(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e.to_string().yellow());
                        continue;
                    }
                };

                if command == Command::Quit {
                    println!("{}", "Hit 'em straight!".bright_green());
                    break;
                }
                if command == Command::Reset && !confirm(&mut rl, "Delete all saved rounds? (yes/no) ") {
                    continue;
                }

                if let Err(e) = run_command(&manager, command).await {
                    tracing::warn!("[Caddie] Command failed: {}", e);
                    eprintln!("{}", format!("Error: {e}").red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}

fn confirm(rl: &mut Editor<CliHelper, DefaultHistory>, question: &str) -> bool {
    matches!(rl.readline(question), Ok(answer) if answer.trim().eq_ignore_ascii_case("yes"))
}

async fn run_command(manager: &RoundSessionManager, command: Command) -> Result<()> {
    match command {
        Command::NewRound => {
            manager.start_new_round().await?;
            render_screen(manager, Screen::ActiveRound).await;
        }
        Command::Resume => {
            let screen = manager.resume().await?;
            render_screen(manager, screen).await;
        }
        Command::Menu => {
            let screen = manager.go_to_main_menu().await?;
            render_screen(manager, screen).await;
        }
        Command::Scorecard => match manager.current_round_stats().await {
            Some(stats) => print_scorecard(&stats),
            None => println!("{}", "No round in progress.".bright_black()),
        },
        Command::Hole(hole) => {
            manager.set_current_hole(hole).await?;
            println!("{}", format!("Now playing hole {hole}.").bright_black());
        }
        Command::Course(name) => {
            manager.set_course_name(&name).await?;
            println!("{}", format!("Course set to {name}.").bright_black());
        }
        Command::Score { hole, score, par } => {
            manager.record_hole_score(hole, score, par).await?;
            println!("{}", format!("Recorded {score} on hole {hole}.").bright_black());
        }
        Command::Photo { path, description } => {
            ensure_active(manager).await?;
            let mut photo = {
                let _camera = manager.media_gate().acquire(MediaKind::Camera)?;
                PhotoBlob::from_file(&path)?
            };
            if let Some(description) = description {
                photo = photo.with_description(description);
            }
            println!("{}", format!("> [photo] {}", photo.caption()).green());
            println!("{}", "Caddie is looking...".bright_black());
            let outcome = manager.send_photo(&photo).await?;
            print_reply(&outcome.reply, outcome.failed);
        }
        Command::Reset => {
            manager.reset().await?;
            render_screen(manager, Screen::Welcome).await;
        }
        Command::Help => println!("{}", HELP.bright_black()),
        Command::Say(text) => {
            ensure_active(manager).await?;
            println!("{}", "Caddie is thinking...".bright_black());
            if let Some(outcome) = manager.send_text(&text).await? {
                print_reply(&outcome.reply, outcome.failed);
            }
        }
        Command::Quit => {}
    }
    Ok(())
}

async fn ensure_active(manager: &RoundSessionManager) -> Result<()> {
    if manager.screen().await != Screen::ActiveRound {
        anyhow::bail!("No round in progress. Use /new or /resume first.");
    }
    Ok(())
}

async fn render_screen(manager: &RoundSessionManager, screen: Screen) {
    match screen {
        Screen::NoData => {}
        Screen::Welcome => {
            if manager.current_round_id().await.is_some() {
                println!("{}", "Welcome back! /resume your round or start a /new one.".bright_green());
            } else {
                println!("{}", "Welcome! Type /new to start your first round with your AI caddie.".bright_green());
            }
            println!("{}", "Type /help for all commands.".bright_black());
        }
        Screen::MainMenu => {
            println!("{}", "Main menu".bright_magenta().bold());
            println!("{}", "  /resume   back to the current round".bright_black());
            println!("{}", "  /new      start a new round".bright_black());
            println!("{}", "  /scorecard".bright_black());
        }
        Screen::ActiveRound => {
            if let Some(stats) = manager.current_round_stats().await {
                let course = stats.course_name.as_deref().unwrap_or("Round");
                println!(
                    "{}",
                    format!("--- {} · hole {} ---", course, stats.current_hole).bright_magenta()
                );
            }
            for message in manager.current_messages().await {
                print_message(&message);
            }
        }
    }
}

fn print_message(message: &Message) {
    match message.role {
        Role::User => {
            let tag = if message.image.is_some() { "[photo] " } else { "" };
            println!("{}", format!("> {tag}{}", message.content).green());
        }
        Role::Model => {
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

fn print_reply(reply: &str, failed: bool) {
    if failed {
        println!("{}", reply.red());
        return;
    }
    for line in reply.lines() {
        println!("{}", line.bright_blue());
    }
}

fn mark(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "✓",
        Some(false) => "✗",
        None => "-",
    }
}

fn print_scorecard(stats: &RoundStats) {
    let title = stats.course_name.as_deref().unwrap_or("Scorecard");
    println!("{}", format!("{title} ({})", stats.date).bright_magenta().bold());
    println!(
        "{}",
        format!("{:>4} {:>4} {:>6} {:>3} {:>4} {:>6} {:>4}", "Hole", "Par", "Score", "FW", "GIR", "Putts", "U&D")
            .bright_black()
    );

    let mut holes: Vec<_> = stats.holes.values().collect();
    holes.sort_by_key(|h| h.hole_number);
    for hole in holes {
        let score = hole.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        let putts = hole.putts.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        let line = format!(
            "{:>4} {:>4} {:>6} {:>3} {:>4} {:>6} {:>4}",
            hole.hole_number,
            hole.par,
            score,
            mark(hole.fairway_hit),
            mark(hole.green_in_regulation),
            putts,
            mark(hole.up_and_down)
        );
        if hole.hole_number == stats.current_hole {
            println!("{}", line.bold());
        } else {
            println!("{line}");
        }
    }

    let summary = ScorecardSummary::from_stats(stats);
    println!(
        "{}",
        format!(
            "Total {} (par {}) · fairways {} · greens {} · putts {} · up & downs {}",
            summary.total_score,
            summary.total_par,
            summary.fairways_hit,
            summary.greens_in_regulation,
            summary.total_putts,
            summary.up_and_downs
        )
        .bright_green()
    );
}
