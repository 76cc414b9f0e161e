//! Logger setup
//! Log lines go to stderr with a local timestamp, so the JSON sink can own
//! stdout.

use std::fmt::Arguments;
use std::io::Write;

use chrono::{DateTime, Local};
use env_logger::{Builder, Env, Target};
use log::{Level, SetLoggerError};

use crate::config::output_config::OutputConfig;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Installs the global logger. `RUST_LOG` overrides `config.level`.
pub fn init(config: &OutputConfig) -> Result<(), SetLoggerError> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(config.level.as_str()));
    builder
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(Local::now(), record.level(), record.target(), record.args())
            )
        });
    builder.try_init()?;

    log::info!("Logging initialized");
    Ok(())
}

fn format_line(timestamp: DateTime<Local>, level: Level, target: &str, args: &Arguments<'_>) -> String {
    format!(
        "{} {:<5} [{}] {}",
        timestamp.format(TIMESTAMP_FORMAT),
        level,
        target,
        args
    )
}
