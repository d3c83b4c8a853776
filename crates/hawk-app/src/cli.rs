//! CLI argument definitions for the Hawk application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use hawk_core::config::HawkConfig;

/// Hawk: ask who a stalled email thread is waiting on.
#[derive(Parser, Debug)]
#[command(name = "hawk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory holding one `<project>.json` mailbox export per project.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Email domain of the organization; repeat for several.
    #[arg(short = 'i', long = "internal-domain")]
    pub internal_domains: Vec<String>,

    /// Days without a reply before a thread counts as stuck.
    #[arg(short = 't', long = "threshold")]
    pub threshold: Option<u32>,

    /// Print answers as JSON payloads instead of text.
    #[arg(long = "json")]
    pub json: bool,

    /// Project to load on startup.
    pub project: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HAWK_CONFIG env var > ~/.hawk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HAWK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > HAWK_DATA_DIR env var.
    /// Returns `None` if neither is set (use config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        if let Some(ref p) = self.data_dir {
            return Some(p.to_string_lossy().to_string());
        }
        std::env::var("HAWK_DATA_DIR").ok().filter(|p| !p.is_empty())
    }

    /// Resolve the log level. Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Write every override onto a loaded configuration.
    ///
    /// Internal domains given on the command line replace the configured
    /// list rather than extending it.
    pub fn apply_to(&self, config: &mut HawkConfig) {
        if let Some(dir) = self.resolve_data_dir() {
            config.general.data_dir = dir;
        }
        if let Some(level) = self.resolve_log_level() {
            config.general.log_level = level;
        }
        if !self.internal_domains.is_empty() {
            config.analysis.internal_domains = self.internal_domains.clone();
        }
        if let Some(days) = self.threshold {
            config.analysis.stuck_threshold_days = days;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".hawk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".hawk").join("config.toml");
    }
    PathBuf::from("config.toml")
}
