use std::time::Duration;

use serde::Deserialize;

use molehunt_core::config::{ConfigError, RoundConfig};
use molehunt_sheets::SheetsConfig;

/// Top-level client configuration (`molehunt.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub sheets: SheetsConfig,
    /// Falls back to [`RoundConfig::load`] when the section is absent.
    #[serde(default = "RoundConfig::load")]
    pub round: RoundConfig,
    pub session: SessionConfig,
}

/// Account and background-task settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Balance given to accounts that have no coin record yet.
    pub initial_coins: u32,
    /// Seconds between coin-request polls.
    pub poll_interval_secs: u64,
    /// Number of ranking rows shown.
    pub ranking_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_coins: 5,
            poll_interval_secs: 7,
            ranking_limit: 10,
        }
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.round.validate()?;
        if self.session.poll_interval_secs == 0 {
            return Err(ConfigError::Zero {
                field: "session.poll_interval_secs",
            });
        }
        if self.session.ranking_limit == 0 {
            return Err(ConfigError::Zero {
                field: "session.ranking_limit",
            });
        }
        Ok(())
    }

    /// Load config from `molehunt.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("molehunt.toml") {
            Ok(content) => match toml::from_str::<ClientConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from molehunt.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse molehunt.toml: {e}, using defaults");
                    Self::with_round(RoundConfig::load())
                },
            },
            Err(_) => {
                tracing::info!("No molehunt.toml found, using defaults");
                Self::with_round(RoundConfig::load())
            },
        };

        if let Ok(url) = std::env::var("MOLEHUNT_SCRIPT_URL")
            && !url.is_empty()
        {
            config.sheets.base_url = url;
        }
        if let Ok(val) = std::env::var("MOLEHUNT_POLL_INTERVAL_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.session.poll_interval_secs = n;
        }

        config
    }

    fn with_round(round: RoundConfig) -> Self {
        Self {
            round,
            ..Self::default()
        }
    }
}
