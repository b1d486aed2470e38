use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Data-driven configuration for a round.
///
/// All durations are in milliseconds so that TOML files stay integer-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Number of slots a target can appear in.
    pub slot_count: usize,
    /// Full round duration. Bonus extensions never push past this.
    pub round_duration_ms: u64,
    /// How often the countdown samples the clock.
    pub tick_interval_ms: u64,
    /// Visible durations for ordinary targets, picked uniformly.
    pub target_durations_ms: Vec<u64>,
    /// Probability that a spawned target is a bonus target.
    pub bonus_chance: f64,
    /// Fixed visible duration for bonus targets.
    pub bonus_visible_ms: u64,
    /// Points for hitting a bonus target (ordinary targets are worth 1).
    pub bonus_score: u32,
    /// Time added to the countdown by a bonus hit.
    pub bonus_time_ms: u64,
    /// Coins credited to the player by a bonus hit.
    pub bonus_coins: u32,
    /// Delay between a target disappearing and the next spawn.
    pub respawn_delay_ms: u64,
    /// Coins charged to start a round.
    pub entry_cost: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            slot_count: 9,
            round_duration_ms: 30_000,
            tick_interval_ms: 10,
            target_durations_ms: vec![500, 1000, 1500, 2000],
            bonus_chance: 0.1,
            bonus_visible_ms: 500,
            bonus_score: 5,
            bonus_time_ms: 5_000,
            bonus_coins: 1,
            respawn_delay_ms: 500,
            entry_cost: 1,
        }
    }
}

/// A configuration value that would make the engine misbehave.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be > 0")]
    Zero { field: &'static str },
    #[error("bonus_chance must be within [0, 1], got {0}")]
    Probability(f64),
    #[error("target_durations_ms must not be empty")]
    NoTargetDurations,
}

impl RoundConfig {
    pub fn round_duration(&self) -> Duration {
        Duration::from_millis(self.round_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }

    /// Round duration in whole seconds, as reported in results.
    pub fn duration_secs(&self) -> u64 {
        self.round_duration_ms / 1000
    }

    /// Check every field the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("slot_count", self.slot_count as u64),
            ("round_duration_ms", self.round_duration_ms),
            ("tick_interval_ms", self.tick_interval_ms),
            ("bonus_visible_ms", self.bonus_visible_ms),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.target_durations_ms.is_empty() {
            return Err(ConfigError::NoTargetDurations);
        }
        if self.target_durations_ms.contains(&0) {
            return Err(ConfigError::Zero {
                field: "target_durations_ms",
            });
        }
        if !(0.0..=1.0).contains(&self.bonus_chance) {
            return Err(ConfigError::Probability(self.bonus_chance));
        }
        Ok(())
    }

    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("MOLEHUNT_ROUND_CONFIG")
            && let Some(config) = Self::from_file(&path)
        {
            return config;
        }
        Self::from_file("config/round.toml").unwrap_or_default()
    }

    /// Parse a TOML file. A missing file is silent, a malformed one is logged.
    fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Self>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path, "Failed to parse round config: {e}");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = RoundConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.duration_secs(), 30);
        assert_eq!(cfg.round_duration(), Duration::from_secs(30));
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
slot_count = 4
bonus_chance = 0.0
target_durations_ms = [250, 750]
"#;
        let cfg: RoundConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.slot_count, 4);
        assert_eq!(cfg.bonus_chance, 0.0);
        assert_eq!(cfg.target_durations_ms, vec![250, 750]);
        // Untouched fields keep their defaults
        assert_eq!(cfg.round_duration_ms, 30_000);
        assert_eq!(cfg.bonus_score, 5);
    }

    #[test]
    fn from_file_skips_missing_and_malformed() {
        let dir = std::env::temp_dir().join(format!("molehunt-round-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.toml");
        let bad = dir.join("bad.toml");
        std::fs::write(&good, "slot_count = 6\n").unwrap();
        std::fs::write(&bad, "slot_count = \"six\"\n").unwrap();

        let cfg = RoundConfig::from_file(good.to_str().unwrap()).unwrap();
        assert_eq!(cfg.slot_count, 6);
        assert_eq!(RoundConfig::from_file(bad.to_str().unwrap()), None);
        assert_eq!(
            RoundConfig::from_file(dir.join("absent.toml").to_str().unwrap()),
            None
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn validate_rejects_zero_slots() {
        let cfg = RoundConfig {
            slot_count: 0,
            ..RoundConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Zero {
                field: "slot_count"
            })
        );
    }

    #[test]
    fn validate_rejects_bad_probability() {
        let cfg = RoundConfig {
            bonus_chance: 1.5,
            ..RoundConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::Probability(1.5)));
    }

    #[test]
    fn validate_rejects_empty_durations() {
        let cfg = RoundConfig {
            target_durations_ms: Vec::new(),
            ..RoundConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoTargetDurations));
    }

    #[test]
    fn validate_rejects_zero_duration_entry() {
        let cfg = RoundConfig {
            target_durations_ms: vec![500, 0],
            ..RoundConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
