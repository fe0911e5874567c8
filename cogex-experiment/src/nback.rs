use cogex_core::screen::{BLACK, WHITE};
use cogex_core::{ConfigError, Digit, Key, Screen, Stimulus};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{BlockTiming, NBackConfig};
use crate::sequence::generate_sequence;
use crate::task::{StimulusOf, Task};

const YES: Key = Key::Char('y');
const NO: Key = Key::Char('n');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NBackAnswer {
    Match,
    NoMatch,
}

impl fmt::Display for NBackAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NBackAnswer::Match => "match",
            NBackAnswer::NoMatch => "no_match",
        })
    }
}

/// Digit n-back: answer Y when the digit equals the one `lag` positions back.
#[derive(Debug, Clone)]
pub struct NBackTask {
    config: NBackConfig,
    keys: [Key; 2],
}

impl NBackTask {
    pub fn new(config: NBackConfig) -> Self {
        Self {
            config,
            keys: [YES, NO],
        }
    }
}

impl Task for NBackTask {
    type Symbol = Digit;
    type Context = ();
    type Answer = NBackAnswer;

    fn name(&self) -> &'static str {
        "nback"
    }

    fn timing(&self) -> &BlockTiming {
        &self.config.timing
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    fn response_keys(&self) -> &[Key] {
        &self.keys
    }

    fn interpret(&self, key: Key) -> Option<NBackAnswer> {
        match key {
            YES => Some(NBackAnswer::Match),
            NO => Some(NBackAnswer::NoMatch),
            _ => None,
        }
    }

    fn ground_truth(
        &self,
        stimulus: &StimulusOf<Self>,
        history: &[StimulusOf<Self>],
    ) -> NBackAnswer {
        let earlier = stimulus
            .index
            .checked_sub(self.config.lag)
            .and_then(|j| history.get(j));
        match earlier {
            Some(earlier) if earlier.symbol == stimulus.symbol => NBackAnswer::Match,
            _ => NBackAnswer::NoMatch,
        }
    }

    fn generate<R: Rng + ?Sized>(
        &self,
        length: usize,
        rng: &mut R,
    ) -> Result<Vec<StimulusOf<Self>>, ConfigError> {
        let digits = generate_sequence(
            length,
            self.config.match_probability,
            self.config.allow_consecutive_matches,
            self.config.lag,
            rng,
        )?;
        Ok(digits
            .into_iter()
            .enumerate()
            .map(|(index, digit)| Stimulus::new(index, digit))
            .collect())
    }

    fn screen(&self, stimulus: &StimulusOf<Self>) -> Screen {
        Screen::Stimulus {
            text: stimulus.symbol.to_string(),
            ink: WHITE,
            background: BLACK,
        }
    }

    fn instructions(&self) -> Vec<String> {
        let lag = self.config.lag;
        vec![
            "Welcome to the n-back experiment!\n\nPress SPACE to continue".to_string(),
            format!(
                "Decide whether the current digit is the same\n\
                 as the digit {lag} positions back.\n\n\
                 Same -> press Y\nDifferent -> press N\n\nPress SPACE to see an example"
            ),
            format!(
                "Example ({lag}-back):\n2 -> 5 -> 2 -> ?\n\
                 The third digit equals the first, so press Y.\n\n\
                 Press SPACE to start practice"
            ),
        ]
    }
}
