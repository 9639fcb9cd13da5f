//! Logger initialization.
//!
//! `env_logger` with either a colored plain format or one JSON object per
//! line. `RUST_LOG` is read first; the level passed by the caller overrides
//! it for this crate and sets the global default.
//!
//! ```bash
//! RUST_LOG=debug safe_surf serve
//! RUST_LOG=safe_surf=debug,reqwest=info safe_surf check --url example.com --email me@example.com
//! ```

use std::io::Write;

use colored::Colorize;
use log::{Level, LevelFilter};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Dependency modules clamped regardless of the requested level.
const NOISY_MODULES: &[(&str, LevelFilter)] = &[
    ("html5ever", LevelFilter::Error),
    ("selectors", LevelFilter::Warn),
    ("sqlx", LevelFilter::Info),
    ("reqwest", LevelFilter::Info),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    // Truncated UDP answers are retried internally and logged as warnings
    ("hickory_proto", LevelFilter::Error),
    ("rustls", LevelFilter::Warn),
];

fn json_line(ts_millis: i64, level: Level, target: &str, msg: &str) -> String {
    serde_json::json!({
        "ts": ts_millis,
        "level": level.as_str(),
        "target": target,
        "msg": msg,
    })
    .to_string()
}

fn level_marker(level: Level) -> (&'static str, colored::ColoredString) {
    let name = level.as_str();
    match level {
        Level::Error => ("❌", name.red()),
        Level::Warn => ("⚠️", name.yellow()),
        Level::Info => ("✔️", name.green()),
        Level::Debug => ("🔍", name.blue()),
        Level::Trace => ("🔬", name.purple()),
    }
}

/// Initializes the global logger.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already
/// installed.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for (module, clamp) in NOISY_MODULES {
        builder.filter_module(module, *clamp);
    }
    builder.filter_module("safe_surf", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(
                        chrono::Utc::now().timestamp_millis(),
                        record.level(),
                        record.target(),
                        &record.args().to_string(),
                    )
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let (emoji, level) = level_marker(record.level());
                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    emoji,
                    record.target().cyan(),
                    level,
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)
}
