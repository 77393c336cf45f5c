//! studio - terminal multitrack recorder
//!
//! Run with: cargo run --bin studio [-- --config studio.toml]
//!
//! Logs go to `studio.log` in the working directory so they don't tear the
//! terminal UI.

mod app;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use saavy_studio::{CpalBackend, Engine, EngineConfig};
use tracing_subscriber::FmtSubscriber;

use app::Studio;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let config = load_config()?;
    let backend = CpalBackend::open(&config).wrap_err("failed to open audio output")?;
    let engine = Engine::new(backend, config)?;

    let mut terminal = ratatui::init();
    let result = Studio::new(engine, std::env::current_dir()?).run(&mut terminal);
    ratatui::restore();
    result
}

fn init_logging() -> EyreResult<()> {
    let file = File::create("studio.log").wrap_err("failed to create studio.log")?;
    let subscriber = FmtSubscriber::builder()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// `--config <path>` or the defaults.
fn load_config() -> EyreResult<EngineConfig> {
    let mut args = std::env::args().skip(1);
    let Some(flag) = args.next() else {
        return Ok(EngineConfig::default());
    };
    if flag != "--config" {
        return Err(eyre!("unknown argument {flag}; usage: studio [--config <path>]"));
    }
    let path: PathBuf = args
        .next()
        .ok_or_else(|| eyre!("--config needs a path"))?
        .into();
    let text = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok(EngineConfig::from_toml(&text)?)
}
