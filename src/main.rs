mod commands;
mod demo;
mod events;
mod highlight;
mod layout;
mod tree;
mod tui;
mod viz;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::tui::canvas::ViewOptions;

#[derive(Parser)]
#[command(
    name = "btvz",
    about = "Watch a B-tree mutate live, mirrored from an engine's event stream"
)]
struct Cli {
    /// Write developer warnings (malformed payloads, unknown references)
    /// to this file. Off by default so raw mode stays clean.
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Initial animation speed multiplier (lower = longer highlights)
    #[arg(long, global = true, default_value_t = 1.0)]
    speed: f64,

    /// Start with mutation highlights disabled
    #[arg(long, global = true)]
    no_transitions: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch a scripted demo session
    View,
    /// Replay a captured event stream (one `code payload` pair per line)
    Replay { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;

    let opts = ViewOptions {
        speed: cli.speed,
        transitions: !cli.no_transitions,
    };
    match cli.command {
        Command::View => commands::view::run(opts),
        Command::Replay { file } => commands::replay::run(&file, opts),
    }
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        // No sink requested: warnings are dropped rather than scribbled
        // over the alternate screen.
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn replay_takes_a_file() {
        let cli = Cli::parse_from(["btvz", "replay", "session.events"]);
        match cli.command {
            Command::Replay { file } => assert_eq!(file, PathBuf::from("session.events")),
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn view_flags_parse() {
        let cli = Cli::parse_from(["btvz", "--speed", "0.5", "--no-transitions", "view"]);
        assert!((cli.speed - 0.5).abs() < 1e-9);
        assert!(cli.no_transitions);
    }
}
