use cogex_core::{Background, ConfigError, InkColor, Key, Screen, Stimulus, StroopPair, Symbol};
use rand::Rng;

use crate::config::{BlockTiming, StroopConfig};
use crate::sequence::{draw, draw_except};
use crate::task::{StimulusOf, Task};

/// Colour-word Stroop with a background cue: black asks for the ink colour,
/// gray asks for the word meaning.
#[derive(Debug, Clone)]
pub struct StroopTask {
    config: StroopConfig,
    keys: Vec<Key>,
}

impl StroopTask {
    pub fn new(config: StroopConfig) -> Self {
        Self {
            config,
            keys: InkColor::ALPHABET.iter().map(|c| c.key()).collect(),
        }
    }

    /// One independent trial. Trials carry no memory of each other.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> (StroopPair, Background) {
        let background = Background::ALL[rng.random_range(0..Background::ALL.len())];
        let word: InkColor = draw(rng);
        let ink = if background.judges_ink() {
            draw_except(rng, word)
        } else {
            draw(rng)
        };
        (StroopPair { word, ink }, background)
    }
}

impl Task for StroopTask {
    type Symbol = StroopPair;
    type Context = Background;
    type Answer = InkColor;

    fn name(&self) -> &'static str {
        "stroop"
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

    fn interpret(&self, key: Key) -> Option<InkColor> {
        InkColor::from_key(key)
    }

    fn ground_truth(&self, stimulus: &StimulusOf<Self>, _history: &[StimulusOf<Self>]) -> InkColor {
        if stimulus.context.judges_ink() {
            stimulus.symbol.ink
        } else {
            stimulus.symbol.word
        }
    }

    fn generate<R: Rng + ?Sized>(
        &self,
        length: usize,
        rng: &mut R,
    ) -> Result<Vec<StimulusOf<Self>>, ConfigError> {
        Ok((0..length)
            .map(|index| {
                let (pair, background) = Self::draw(rng);
                Stimulus::with_context(index, pair, background)
            })
            .collect())
    }

    fn screen(&self, stimulus: &StimulusOf<Self>) -> Screen {
        Screen::Stimulus {
            text: stimulus.symbol.word.word().to_string(),
            ink: stimulus.symbol.ink.rgba(),
            background: stimulus.context.rgba(),
        }
    }

    fn stimulus_columns(&self) -> &'static [&'static str] {
        &["background", "word", "ink"]
    }

    fn stimulus_values(&self, stimulus: &StimulusOf<Self>) -> Vec<String> {
        vec![
            stimulus.context.to_string(),
            stimulus.symbol.word.to_string(),
            stimulus.symbol.ink.to_string(),
        ]
    }

    fn instructions(&self) -> Vec<String> {
        vec![
            "Welcome to the Stroop experiment!\n\nPress SPACE to continue".to_string(),
            "On a BLACK screen, ignore the meaning of the word\nand respond to its INK colour:\n\n\
             R-red  G-green  B-blue  Y-yellow  P-purple\n\nPress SPACE to continue"
                .to_string(),
            "On a GRAY screen, ignore the ink colour\nand respond to the MEANING of the word:\n\n\
             R-red  G-green  B-blue  Y-yellow  P-purple\n\nPress SPACE to start practice"
                .to_string(),
        ]
    }
}
