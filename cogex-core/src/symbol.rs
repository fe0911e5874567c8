use crate::response::Key;
use crate::screen::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A token from a finite alphabet. Sequences only ever compare symbols for equality.
pub trait Symbol: Copy + Eq + fmt::Debug + fmt::Display + 'static {
    /// Every symbol of the alphabet, at least two of them.
    const ALPHABET: &'static [Self];
}

/// A single decimal digit, the n-back alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digit(u8);

impl Digit {
    pub fn new(value: u8) -> Option<Self> {
        (value <= 9).then_some(Digit(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Symbol for Digit {
    const ALPHABET: &'static [Self] = &[
        Digit(0),
        Digit(1),
        Digit(2),
        Digit(3),
        Digit(4),
        Digit(5),
        Digit(6),
        Digit(7),
        Digit(8),
        Digit(9),
    ];
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The five Stroop colours. Used both as ink and as word meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InkColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

impl InkColor {
    pub fn rgba(self) -> Rgba {
        match self {
            InkColor::Red => [255, 0, 0, 255],
            InkColor::Green => [0, 255, 0, 255],
            InkColor::Blue => [0, 0, 255, 255],
            InkColor::Yellow => [255, 255, 0, 255],
            InkColor::Purple => [255, 0, 255, 255],
        }
    }

    /// Response key naming this colour.
    pub fn key(self) -> Key {
        Key::Char(match self {
            InkColor::Red => 'r',
            InkColor::Green => 'g',
            InkColor::Blue => 'b',
            InkColor::Yellow => 'y',
            InkColor::Purple => 'p',
        })
    }

    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Char('r') => Some(InkColor::Red),
            Key::Char('g') => Some(InkColor::Green),
            Key::Char('b') => Some(InkColor::Blue),
            Key::Char('y') => Some(InkColor::Yellow),
            Key::Char('p') => Some(InkColor::Purple),
            _ => None,
        }
    }

    /// The word shown on screen.
    pub fn word(self) -> &'static str {
        match self {
            InkColor::Red => "RED",
            InkColor::Green => "GREEN",
            InkColor::Blue => "BLUE",
            InkColor::Yellow => "YELLOW",
            InkColor::Purple => "PURPLE",
        }
    }
}

impl Symbol for InkColor {
    const ALPHABET: &'static [Self] = &[
        InkColor::Red,
        InkColor::Green,
        InkColor::Blue,
        InkColor::Yellow,
        InkColor::Purple,
    ];
}

impl fmt::Display for InkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InkColor::Red => "red",
            InkColor::Green => "green",
            InkColor::Blue => "blue",
            InkColor::Yellow => "yellow",
            InkColor::Purple => "purple",
        })
    }
}

/// Screen background of a Stroop trial. It selects which attribute is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Judge the ink colour; word and ink always differ.
    Black,
    /// Judge the word meaning; word and ink are drawn independently.
    Gray,
}

impl Background {
    pub const ALL: [Background; 2] = [Background::Black, Background::Gray];

    pub fn rgba(self) -> Rgba {
        match self {
            Background::Black => [0, 0, 0, 255],
            Background::Gray => [191, 191, 191, 255],
        }
    }

    pub fn judges_ink(self) -> bool {
        matches!(self, Background::Black)
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Background::Black => "black",
            Background::Gray => "gray",
        })
    }
}

/// A Stroop word printed in some ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StroopPair {
    pub word: InkColor,
    pub ink: InkColor,
}

impl StroopPair {
    pub fn is_congruent(&self) -> bool {
        self.word == self.ink
    }
}

impl fmt::Display for StroopPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.word.word(), self.ink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_rejects_values_above_nine() {
        assert_eq!(Digit::new(9).map(Digit::value), Some(9));
        assert_eq!(Digit::new(10), None);
        assert_eq!(Digit::ALPHABET.len(), 10);
    }

    #[test]
    fn every_colour_round_trips_through_its_key() {
        for &color in InkColor::ALPHABET {
            assert_eq!(InkColor::from_key(color.key()), Some(color));
        }
    }

    fn alphabet_of<S: Symbol>() -> &'static [S] {
        S::ALPHABET
    }

    #[test]
    fn alphabets_are_static_and_distinct() {
        let digits = alphabet_of::<Digit>();
        let inks = alphabet_of::<InkColor>();
        assert!(digits.len() >= 2 && inks.len() >= 2);
        for (i, a) in inks.iter().enumerate() {
            assert!(inks[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn unknown_keys_are_not_colours() {
        assert_eq!(InkColor::from_key(Key::Char('x')), None);
        assert_eq!(InkColor::from_key(Key::Char('R')), None);
        assert_eq!(InkColor::from_key(Key::Space), None);
    }
}
