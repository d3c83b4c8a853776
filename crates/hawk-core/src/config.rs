use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HawkError, Result};

/// Top-level configuration for the Hawk assistant.
///
/// Loaded from `~/.hawk/config.toml` by default. Every section falls back to
/// its defaults when omitted, except that `analysis.internal_domains` must be
/// filled in before a session can be built (see [`HawkConfig::validate`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HawkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl HawkConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HawkConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check the settings the analysis engine cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self
            .analysis
            .internal_domains
            .iter()
            .all(|d| d.trim().is_empty())
        {
            return Err(HawkError::Config(
                "analysis.internal_domains must list at least one domain".to_string(),
            ));
        }
        if self.chat.max_query_length == 0 {
            return Err(HawkError::Config(
                "chat.max_query_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Directory holding one `<project>.json` export per project.
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: "~/.hawk/projects".to_string(),
        }
    }
}

/// Bottleneck and responsibility heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A thread must be idle at least this many whole days to be stuck.
    pub stuck_threshold_days: u32,
    /// The organization's own email domains (subdomains included).
    pub internal_domains: Vec<String>,
    /// Recognized external domains. Empty means any well-formed domain.
    pub external_domains: Vec<String>,
    /// Phrases marking a message as expecting a reply (case-insensitive).
    pub question_indicators: Vec<String>,
    /// Extra company/project names always offered to the entity extractor.
    pub known_entities: Vec<String>,
}

/// Stuck threshold used when the config file does not override it.
pub const DEFAULT_STUCK_THRESHOLD_DAYS: u32 = 3;

/// Question indicators used when the config file does not override them.
pub fn default_question_indicators() -> Vec<String> {
    [
        "?",
        "please advise",
        "waiting on",
        "need your",
        "can you",
        "could you",
        "would you",
        "let me know",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stuck_threshold_days: DEFAULT_STUCK_THRESHOLD_DAYS,
            internal_domains: Vec::new(),
            external_domains: Vec::new(),
            question_indicators: default_question_indicators(),
            known_entities: Vec::new(),
        }
    }
}

/// Conversation and presentation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Longest accepted query, in characters.
    pub max_query_length: usize,
    /// Number of recent turns kept in session history.
    pub context_turns: usize,
    /// Matches listed when rendering an answer.
    pub max_display_results: usize,
    /// Stuck threads listed when rendering an answer.
    pub max_stuck_shown: usize,
    /// Most active senders listed in a responsibility answer.
    pub max_top_senders: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_query_length: 2000,
            context_turns: 6,
            max_display_results: 10,
            max_stuck_shown: 5,
            max_top_senders: 5,
        }
    }
}
