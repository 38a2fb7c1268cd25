//! Layered CLI settings: built-in defaults, an optional TOML file, then flags.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use sequence_ring_core::{
    catalog::{puzzle_by_slug, DEFAULT_PUZZLE_SLUG},
    DEFAULT_CHECK_DURATION, DEFAULT_TOTAL_TRIES,
};
use serde::Deserialize;

const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Ticks the text backend advances before giving up on a running check.
pub(crate) const MAX_CHECK_TICKS: u32 = 100_000;

/// Settings read from a TOML configuration file. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) puzzle: Option<String>,
    pub(crate) total_tries: Option<u32>,
    pub(crate) check_duration_ms: Option<u64>,
    pub(crate) seed: Option<u64>,
    pub(crate) tick_ms: Option<u64>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid config toml contents")
    }

    /// Values set here take precedence over `self`.
    pub(crate) fn overridden_by(self, other: FileConfig) -> Self {
        Self {
            puzzle: other.puzzle.or(self.puzzle),
            total_tries: other.total_tries.or(self.total_tries),
            check_duration_ms: other.check_duration_ms.or(self.check_duration_ms),
            seed: other.seed.or(self.seed),
            tick_ms: other.tick_ms.or(self.tick_ms),
        }
    }
}

/// Fully resolved settings used to start a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) puzzle: String,
    pub(crate) total_tries: u32,
    pub(crate) check_duration: Duration,
    pub(crate) seed: u64,
    pub(crate) tick: Duration,
}

impl Settings {
    /// Fills missing values with defaults and validates the result.
    ///
    /// `random_seed` is only called when no seed was configured.
    pub(crate) fn resolve(config: FileConfig, random_seed: impl FnOnce() -> u64) -> Result<Self> {
        let puzzle = config
            .puzzle
            .unwrap_or_else(|| DEFAULT_PUZZLE_SLUG.to_owned());
        if puzzle_by_slug(&puzzle).is_none() {
            bail!("unknown puzzle {puzzle:?}");
        }

        let total_tries = config.total_tries.unwrap_or(DEFAULT_TOTAL_TRIES);
        if total_tries == 0 {
            bail!("total_tries must be at least 1");
        }

        let tick = config
            .tick_ms
            .map_or(DEFAULT_TICK, Duration::from_millis);
        if tick.is_zero() {
            bail!("tick_ms must be positive");
        }

        let check_duration = config
            .check_duration_ms
            .map_or(DEFAULT_CHECK_DURATION, Duration::from_millis);
        let fits = tick
            .checked_mul(MAX_CHECK_TICKS)
            .map_or(true, |limit| check_duration <= limit);
        if !fits {
            bail!(
                "check_duration_ms must not exceed {MAX_CHECK_TICKS} ticks of {} ms",
                tick.as_millis()
            );
        }

        Ok(Self {
            puzzle,
            total_tries,
            check_duration,
            seed: config.seed.unwrap_or_else(random_seed),
            tick,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let settings = Settings::resolve(FileConfig::default(), || 17).expect("valid defaults");

        assert_eq!(
            settings,
            Settings {
                puzzle: DEFAULT_PUZZLE_SLUG.to_owned(),
                total_tries: DEFAULT_TOTAL_TRIES,
                check_duration: Duration::from_secs(2),
                seed: 17,
                tick: Duration::from_millis(50),
            }
        );
    }

    #[test]
    fn flags_override_file_values() {
        let file = FileConfig::parse(
            r#"
            total_tries = 3
            check_duration_ms = 600
            seed = 5
            "#,
        )
        .expect("valid toml");
        let flags = FileConfig {
            total_tries: Some(8),
            ..FileConfig::default()
        };

        let settings = Settings::resolve(file.overridden_by(flags), || unreachable!())
            .expect("valid settings");

        assert_eq!(settings.total_tries, 8);
        assert_eq!(settings.check_duration, Duration::from_millis(600));
        assert_eq!(settings.seed, 5);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(FileConfig::parse("tries = 3").is_err());

        let unknown_puzzle = FileConfig {
            puzzle: Some("nope".to_owned()),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(unknown_puzzle, || 0).is_err());

        let zero_tries = FileConfig {
            total_tries: Some(0),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(zero_tries, || 0).is_err());

        let zero_tick = FileConfig {
            tick_ms: Some(0),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(zero_tick, || 0).is_err());
    }

    #[test]
    fn check_duration_must_finish_within_the_tick_limit() {
        let at_limit = FileConfig {
            tick_ms: Some(1),
            check_duration_ms: Some(u64::from(MAX_CHECK_TICKS)),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(at_limit, || 0).is_ok());

        let too_long = FileConfig {
            tick_ms: Some(1),
            check_duration_ms: Some(u64::from(MAX_CHECK_TICKS) + 1),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(too_long, || 0).is_err());

        let huge_tick = FileConfig {
            tick_ms: Some(u64::MAX),
            check_duration_ms: Some(u64::MAX),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(huge_tick, || 0).is_ok());
    }
}
