use std::fs::{self, OpenOptions};

use anyhow::Result;
use symptom_chat_core::Config;
use tracing_subscriber::EnvFilter;

/// Log to `<config dir>/symptom-chat/symptom-chat.log` when `RUST_LOG` is set.
///
/// The TUI owns the terminal, so nothing is ever written to stdout/stderr.
pub fn init() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        return Ok(());
    }

    let log_dir = Config::config_dir()?;
    fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("symptom-chat.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    Ok(())
}
