// src/logging.rs
//! log4rs setup for the pipeline hosting the helper.
//!
//! The helper itself only talks to the `log` facade; whoever drives the sync
//! calls [`init_logging`] once at startup.

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "podcast2notion.log";
const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}";

/// Where the debug-level log file is written.
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

/// Configures console output at `level` plus a debug-level log file.
pub fn init_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let log_file_path = log_file_path();
    if let Some(parent) = log_file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let console_pattern = if level >= LevelFilter::Debug {
        FILE_PATTERN
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(console_pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stdout", Box::new(stdout_appender)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(level.max(LevelFilter::Debug)),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}
