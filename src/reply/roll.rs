//! Weighted coin flips.

use rand::Rng;

/// Source of randomness for rolls and picks.
///
/// The live implementation is [`ThreadRandom`]; tests substitute a fixed source
/// to pin outcomes.
pub trait RandomSource: Send + Sync + 'static {
    /// Draws a value uniformly from `[0, 1)`.
    fn draw(&self) -> f64;

    /// Picks an index uniformly from `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Randomness from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn draw(&self) -> f64 {
        rand::rng().random::<f64>()
    }

    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// The record of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollOutcome {
    /// The chance the trial was run against.
    pub probability: f64,
    /// The smallest draw that succeeds (`1 - probability`).
    pub required: f64,
    /// The value that was drawn.
    pub drawn: f64,
    pub succeeded: bool,
}

/// Runs a single trial that succeeds with chance `probability`.
///
/// A draw `r` succeeds when `r + probability >= 1`. A zero probability never
/// succeeds, even if a source yields exactly `1.0`.
pub fn roll(probability: f64, random: &dyn RandomSource) -> RollOutcome {
    let drawn = random.draw();
    let succeeded = probability != 0.0 && drawn + probability >= 1.0;

    RollOutcome {
        probability,
        required: 1.0 - probability,
        drawn,
        succeeded,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Always draws the same value and always picks the first entry.
    pub(crate) struct FixedRandom(pub f64);

    impl RandomSource for FixedRandom {
        fn draw(&self) -> f64 {
            self.0
        }

        fn pick(&self, _len: usize) -> usize {
            0
        }
    }

    #[test]
    fn zero_never_succeeds() {
        for drawn in [0.0, 0.5, 0.999_999, 1.0] {
            assert!(!roll(0.0, &FixedRandom(drawn)).succeeded);
        }
    }

    #[test]
    fn one_always_succeeds() {
        for drawn in [0.0, 0.5, 0.999_999] {
            assert!(roll(1.0, &FixedRandom(drawn)).succeeded);
        }
    }

    #[test]
    fn succeeds_iff_draw_reaches_the_threshold() {
        assert!(roll(0.1, &FixedRandom(0.9)).succeeded);
        assert!(!roll(0.1, &FixedRandom(0.899_999)).succeeded);
        assert!(roll(0.2, &FixedRandom(0.81)).succeeded);
        assert!(!roll(0.2, &FixedRandom(0.79)).succeeded);
    }

    #[test]
    fn outcome_is_transparent() {
        let outcome = roll(0.25, &FixedRandom(0.5));

        assert_eq!(outcome.probability, 0.25);
        assert_eq!(outcome.required, 0.75);
        assert_eq!(outcome.drawn, 0.5);
        assert!(!outcome.succeeded);
    }

    #[test]
    fn thread_random_stays_in_range() {
        let random = ThreadRandom;

        for _ in 0..1000 {
            let drawn = random.draw();
            assert!((0.0..1.0).contains(&drawn));
            assert!(random.pick(3) < 3);
        }
    }
}
