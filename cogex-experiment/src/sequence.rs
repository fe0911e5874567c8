use cogex_core::{ConfigError, Symbol};
use rand::seq::index;
use rand::Rng;
use tracing::debug;

/// Builds an n-back sequence of `length` symbols aiming at `match_probability`.
///
/// `floor((length - lag) * match_probability)` positions in `lag..length` are
/// picked without replacement and made to repeat the symbol `lag` places back;
/// every other position is drawn to differ from it. When
/// `allow_consecutive_matches` is false a designated match directly after a
/// realized match is turned into a non-match, so the realized count can fall
/// short of the target. It never exceeds it.
pub fn generate_sequence<S, R>(
    length: usize,
    match_probability: f64,
    allow_consecutive_matches: bool,
    lag: usize,
    rng: &mut R,
) -> Result<Vec<S>, ConfigError>
where
    S: Symbol,
    R: Rng + ?Sized,
{
    if lag == 0 {
        return Err(ConfigError::ZeroLag);
    }
    if length <= lag {
        return Err(ConfigError::LengthNotAboveLag { length, lag });
    }
    if !(0.0..=1.0).contains(&match_probability) {
        return Err(ConfigError::InvalidProbability(match_probability));
    }

    let mut sequence: Vec<S> = (0..lag).map(|_| draw(rng)).collect();
    sequence.reserve(length - lag);

    let candidates = length - lag;
    let required_matches = (candidates as f64 * match_probability).floor() as usize;
    let mut match_positions: Vec<usize> = index::sample(rng, candidates, required_matches)
        .into_iter()
        .map(|offset| offset + lag)
        .collect();
    match_positions.sort_unstable();
    let mut designated = match_positions.into_iter().peekable();

    for i in lag..length {
        let target = sequence[i - lag];
        let is_designated = designated.next_if_eq(&i).is_some();
        let previous_matched = i > lag && sequence[i - 1] == sequence[i - 1 - lag];

        let symbol = if is_designated && (allow_consecutive_matches || !previous_matched) {
            target
        } else {
            draw_except(rng, target)
        };
        sequence.push(symbol);
    }

    debug!(
        length,
        lag,
        required_matches,
        realized_matches = SequenceStats::of(&sequence, lag).matches(),
        "generated n-back sequence"
    );
    Ok(sequence)
}

/// Uniform draw from the alphabet.
pub fn draw<S: Symbol, R: Rng + ?Sized>(rng: &mut R) -> S {
    S::ALPHABET[rng.random_range(0..S::ALPHABET.len())]
}

/// Uniform draw from the alphabet without `forbidden`.
pub fn draw_except<S: Symbol, R: Rng + ?Sized>(rng: &mut R, forbidden: S) -> S {
    let alphabet = S::ALPHABET;
    match alphabet.iter().position(|&s| s == forbidden) {
        Some(skip) => {
            let k = rng.random_range(0..alphabet.len() - 1);
            alphabet[if k >= skip { k + 1 } else { k }]
        }
        None => draw(rng),
    }
}

/// Where a sequence repeats the symbol `lag` places back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStats {
    pub lag: usize,
    pub match_positions: Vec<usize>,
}

impl SequenceStats {
    pub fn of<S: PartialEq>(sequence: &[S], lag: usize) -> Self {
        let match_positions = (lag..sequence.len())
            .filter(|&i| lag > 0 && sequence[i] == sequence[i - lag])
            .collect();
        Self {
            lag,
            match_positions,
        }
    }

    pub fn matches(&self) -> usize {
        self.match_positions.len()
    }

    pub fn has_consecutive_matches(&self) -> bool {
        self.match_positions.windows(2).any(|w| w[1] == w[0] + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogex_core::{Digit, InkColor};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn digits(values: &[u8]) -> Vec<Digit> {
        values.iter().map(|&v| Digit::new(v).unwrap()).collect()
    }

    #[test]
    fn returns_exactly_length_symbols() {
        let mut rng = StdRng::seed_from_u64(7);
        for (length, lag) in [(2, 1), (3, 2), (10, 2), (200, 2), (57, 5)] {
            for p in [0.0, 0.3, 0.6, 1.0] {
                let seq: Vec<Digit> = generate_sequence(length, p, false, lag, &mut rng).unwrap();
                assert_eq!(seq.len(), length);
            }
        }
    }

    #[test]
    fn rejects_invalid_parameters_before_drawing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate_sequence::<Digit, _>(2, 0.5, true, 2, &mut rng),
            Err(ConfigError::LengthNotAboveLag { length: 2, lag: 2 })
        );
        assert_eq!(
            generate_sequence::<Digit, _>(10, 0.5, true, 0, &mut rng),
            Err(ConfigError::ZeroLag)
        );
        assert_eq!(
            generate_sequence::<Digit, _>(10, -0.1, true, 2, &mut rng),
            Err(ConfigError::InvalidProbability(-0.1))
        );
    }

    #[test]
    fn zero_probability_never_matches() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let seq: Vec<Digit> = generate_sequence(40, 0.0, true, 2, &mut rng).unwrap();
            assert_eq!(SequenceStats::of(&seq, 2).matches(), 0);
        }
    }

    #[test]
    fn allowing_consecutive_matches_hits_the_target_exactly() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let seq: Vec<Digit> = generate_sequence(12, 0.5, true, 2, &mut rng).unwrap();
            assert_eq!(SequenceStats::of(&seq, 2).matches(), 5);
        }
    }

    #[test]
    fn full_probability_with_consecutive_allowed_repeats_the_seed() {
        let mut rng = StdRng::seed_from_u64(5);
        let seq: Vec<Digit> = generate_sequence(9, 1.0, true, 3, &mut rng).unwrap();
        for i in 3..9 {
            assert_eq!(seq[i], seq[i - 3]);
        }
    }

    #[test]
    fn suppressing_consecutive_matches_never_exceeds_target() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut shortfall_seen = false;
        for _ in 0..500 {
            let seq: Vec<Digit> = generate_sequence(30, 0.6, false, 2, &mut rng).unwrap();
            let stats = SequenceStats::of(&seq, 2);
            assert!(!stats.has_consecutive_matches(), "{seq:?}");
            assert!(stats.matches() <= 16);
            shortfall_seen |= stats.matches() < 16;
        }
        assert!(shortfall_seen, "high match rates must collide at least once");
    }

    #[test]
    fn draw_except_never_returns_the_forbidden_symbol() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen = Vec::new();
        for _ in 0..500 {
            let color: InkColor = draw_except(&mut rng, InkColor::Blue);
            assert_ne!(color, InkColor::Blue);
            if !seen.contains(&color) {
                seen.push(color);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn stats_find_lag_two_repeats() {
        let seq = digits(&[2, 5, 2, 5, 7, 1, 7]);
        let stats = SequenceStats::of(&seq, 2);
        assert_eq!(stats.match_positions, vec![2, 3, 6]);
        assert!(stats.has_consecutive_matches());
    }
}
