//! NetHack save inspector
//!
//! Restores save files with `nh-save` and draws them through `nh-uncursed`.

mod error;
mod summary;
mod view;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nh_core::GameState;
use nh_uncursed::backend::{HeadlessBackend, HeadlessProbe, RecordBackend, TtyBackend};
use nh_uncursed::{Key, Role, SpecialKey, Uncursed, UncursedConfig, STDSCR};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{CliError, CliResult};
use crate::summary::{SaveSummary, Verification};

#[derive(Debug, Parser)]
#[command(name = "nethack", version, about = "Inspect and display NetHack save files")]
struct Cli {
    /// Renderer backend to use for input (tty, headless)
    #[arg(long, global = true)]
    interface: Option<String>,

    /// Record the session's keys and screen updates to this file
    #[arg(long, global = true)]
    record: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Restore a save and draw its current level
    Show {
        /// Save file; defaults to the newest one
        save: Option<PathBuf>,
        /// Also draw terrain the hero has not seen
        #[arg(long)]
        reveal: bool,
    },
    /// Print a JSON summary of a save
    Dump { save: Option<PathBuf> },
    /// Restore a save, write it back and compare the bytes
    Verify { save: Option<PathBuf> },
    /// List saves in the default directory, newest first
    List,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(%error, "command failed");
            eprintln!("nethack: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Show { save, reveal } => {
            let game = load(save)?;
            let config = renderer_config(cli.interface, cli.record.is_some());
            show(&game, config, cli.record.as_deref(), reveal)?;
        }
        Command::Dump { save } => {
            let game = load(save)?;
            let json = serde_json::to_string_pretty(&SaveSummary::of(&game))?;
            println!("{json}");
        }
        Command::Verify { save } => {
            let path = resolve_save(save)?;
            let bytes = std::fs::read(&path)?;
            match summary::verify(&bytes)? {
                Verification::Identical { len } => {
                    println!("{}: ok ({len} bytes)", path.display());
                }
                Verification::Differs {
                    original_len,
                    resaved_len,
                    first_difference,
                } => {
                    println!(
                        "{}: re-save differs at byte {first_difference} ({original_len} -> {resaved_len} bytes)",
                        path.display()
                    );
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::List => {
            for path in nh_save::list_saves()? {
                println!("{}", path.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn resolve_save(save: Option<PathBuf>) -> CliResult<PathBuf> {
    match save {
        Some(path) => Ok(path),
        None => nh_save::list_saves()?
            .into_iter()
            .next()
            .ok_or(CliError::NoSave),
    }
}

fn load(save: Option<PathBuf>) -> CliResult<GameState> {
    let path = resolve_save(save)?;
    tracing::info!(path = %path.display(), "restoring save");
    let bytes = std::fs::read(&path)?;
    summary::restore(&bytes)
}

fn renderer_config(interface: Option<String>, record: bool) -> UncursedConfig {
    let mut config = UncursedConfig {
        interface,
        invocation: std::env::args().next(),
        ..UncursedConfig::default()
    };
    if record {
        config.extra_interfaces.push("record".into());
    }
    config
}

/// The built-in backends, keeping a handle on the headless one
fn renderer(config: UncursedConfig) -> (Uncursed, HeadlessProbe) {
    let mut ui = Uncursed::new(config);
    let (headless, probe) = HeadlessBackend::new(view::STATUS_ROW + 2, nh_core::COLNO as u16);
    let registry = ui.registry_mut();
    registry.register("tty", Role::Input, 10, Box::new(TtyBackend::stdout()));
    registry.register("headless", Role::Input, 0, Box::new(headless));
    registry.register("record", Role::Recording, 0, Box::new(RecordBackend::new()));
    (ui, probe)
}

fn show(game: &GameState, config: UncursedConfig, record: Option<&Path>, reveal: bool) -> CliResult<()> {
    let (mut ui, probe) = renderer(config);
    ui.initialize()?;
    if let Some(path) = record {
        ui.start_recording(path)?;
    }
    view::init_pairs(ui.screen_mut());

    let redraw = |ui: &mut Uncursed| -> CliResult<()> {
        view::draw_game(ui.screen_mut(), game, reveal);
        ui.refresh(STDSCR)?;
        Ok(())
    };
    redraw(&mut ui)?;

    if ui.registry().active_input() == Some("headless") {
        for line in probe.lines() {
            println!("{}", line.trim_end());
        }
    } else {
        loop {
            match ui.get_key(None)? {
                Key::Char('q') | Key::Special(SpecialKey::Escape, _) | Key::Hangup => break,
                Key::Resize | Key::Char('\u{12}') => redraw(&mut ui)?,
                _ => {}
            }
        }
    }

    ui.exit();
    Ok(())
}
