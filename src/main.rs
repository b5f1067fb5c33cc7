//! Binary entrypoint for wallshift.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use wallshift::{GsettingsBackground, LocalFilesystem, Settings};

/// Wallpaper rotation daemon
#[derive(Debug, Parser)]
#[command(name = "wallshift", about = "Rotates desktop and lock-screen wallpapers")]
struct Cli {
    /// Path to YAML settings file
    #[arg(short, long, value_name = "FILE", default_value = "wallshift.yaml")]
    config: PathBuf,

    /// Seed for the random wallpaper selection (omit for an OS seed)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("wallshift={level}").parse()?)
        .add_directive("notify=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let settings = Rc::new(
        Settings::load(&cli.config)
            .with_context(|| format!("loading settings from {}", cli.config.display()))?,
    );
    let fs = Rc::new(LocalFilesystem::new());
    let background = Rc::new(GsettingsBackground::new());

    // One logical actor owns every profile; the runtime never moves the
    // daemon future off this thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    runtime
        .block_on(wallshift::daemon::run(
            settings,
            fs,
            background,
            cli.seed,
            CancellationToken::new(),
        ))
        .context("running rotation daemon")?;
    Ok(())
}
