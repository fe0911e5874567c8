use cogex_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::export::ResultFormat;

/// Immutable task constants, loaded once and handed to the tasks at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub nback: NBackConfig,
    pub stroop: StroopConfig,
    pub output: OutputConfig,
}

/// Trial counts and durations shared by both tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTiming {
    pub practice_trials: usize,
    /// Stimuli generated per timed block.
    pub block_trials: usize,
    pub response_window_ms: u64,
    /// `None` leaves practice trials open until a key is pressed.
    pub practice_response_window_ms: Option<u64>,
    pub inter_stimulus_ms: u64,
    /// Total time budget of the timed part; `None` runs a single block.
    pub session_duration_s: Option<u64>,
}

impl Default for BlockTiming {
    fn default() -> Self {
        Self {
            practice_trials: 10,
            block_trials: 200,
            response_window_ms: 3000,
            practice_response_window_ms: Some(3000),
            inter_stimulus_ms: 300,
            session_duration_s: Some(600),
        }
    }
}

impl BlockTiming {
    pub fn response_window(&self) -> Duration {
        Duration::from_millis(self.response_window_ms)
    }

    pub fn practice_response_window(&self) -> Option<Duration> {
        self.practice_response_window_ms.map(Duration::from_millis)
    }

    pub fn inter_stimulus_gap(&self) -> Duration {
        Duration::from_millis(self.inter_stimulus_ms)
    }

    pub fn session_duration(&self) -> Option<Duration> {
        self.session_duration_s.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_trials == 0 {
            return Err(ConfigError::EmptyBlock);
        }
        if self.response_window_ms == 0 || self.practice_response_window_ms == Some(0) {
            return Err(ConfigError::ZeroResponseWindow);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NBackConfig {
    pub lag: usize,
    pub match_probability: f64,
    pub allow_consecutive_matches: bool,
    pub timing: BlockTiming,
}

impl Default for NBackConfig {
    fn default() -> Self {
        Self {
            lag: 2,
            match_probability: 0.6,
            allow_consecutive_matches: false,
            timing: BlockTiming::default(),
        }
    }
}

impl NBackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        if self.lag == 0 {
            return Err(ConfigError::ZeroLag);
        }
        if !(0.0..=1.0).contains(&self.match_probability) {
            return Err(ConfigError::InvalidProbability(self.match_probability));
        }
        let practice = Some(self.timing.practice_trials).filter(|&n| n > 0);
        for length in practice.into_iter().chain([self.timing.block_trials]) {
            if length <= self.lag {
                return Err(ConfigError::LengthNotAboveLag {
                    length,
                    lag: self.lag,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StroopConfig {
    pub timing: BlockTiming,
}

impl Default for StroopConfig {
    fn default() -> Self {
        Self {
            timing: BlockTiming {
                practice_response_window_ms: None,
                inter_stimulus_ms: 0,
                ..BlockTiming::default()
            },
        }
    }
}

impl StroopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: ResultFormat,
    pub include_practice: bool,
    /// Keep the trials collected so far when the participant aborts.
    pub save_on_abort: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            format: ResultFormat::Csv,
            include_practice: false,
            save_on_abort: true,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.nback.validate()?;
        self.stroop.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_ten_minute_protocols() {
        let config = ExperimentConfig::default();
        config.validate().expect("defaults are valid");

        assert_eq!(config.nback.lag, 2);
        assert_eq!(config.nback.timing.block_trials, 200);
        assert_eq!(
            config.nback.timing.inter_stimulus_gap(),
            Duration::from_millis(300)
        );
        assert_eq!(config.stroop.timing.practice_response_window(), None);
        assert_eq!(config.stroop.timing.inter_stimulus_gap(), Duration::ZERO);
        assert_eq!(
            config.stroop.timing.session_duration(),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn rejects_probability_outside_unit_interval() {
        let config = NBackConfig {
            match_probability: 1.5,
            ..NBackConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidProbability(1.5)));

        let config = NBackConfig {
            match_probability: f64::NAN,
            ..NBackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability(_))
        ));
    }

    #[test]
    fn rejects_practice_block_not_longer_than_lag() {
        let mut config = NBackConfig::default();
        config.timing.practice_trials = 2;
        assert_eq!(
            config.validate(),
            Err(ConfigError::LengthNotAboveLag { length: 2, lag: 2 })
        );
    }

    #[test]
    fn rejects_zero_response_window() {
        let mut config = StroopConfig::default();
        config.timing.response_window_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroResponseWindow));
    }
}
