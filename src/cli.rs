// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::monitor::ChangeCategory;

/// Command-line arguments for `hivewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hivewatch",
    version,
    about = "Watch one key in a hive store and log its changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Key to watch. The first segment must be a root name or alias,
    /// e.g. `HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Explorer\Accent`.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Base directory of the hive store.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub hive: String,

    /// Named value to read (raw bytes) at startup and on every change.
    #[arg(long, value_name = "NAME")]
    pub value: Option<String>,

    /// Restrict notifications to these change categories (repeatable).
    ///
    /// If omitted, all four categories are delivered.
    #[arg(long = "filter", value_enum, value_name = "CATEGORY")]
    pub filter: Vec<ChangeCategory>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HIVEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
