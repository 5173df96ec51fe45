use rand::distr::Alphanumeric;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::stats::OperatorUsageStats;

/// Per-invocation state shared by every operator: the random source and the
/// operator usage counter.
///
/// A context is created by the caller of one generation and threaded by
/// `&mut` through walkers and operators.
#[derive(Debug, Clone)]
pub struct MutationContext {
    rng: ChaCha8Rng,
    stats: OperatorUsageStats,
}

impl MutationContext {
    /// Deterministic context for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            stats: OperatorUsageStats::default(),
        }
    }

    pub fn stats(&self) -> &OperatorUsageStats {
        &self.stats
    }

    pub(crate) fn record(&mut self, mutator: &str, operator: &str) {
        self.stats.increment(mutator, operator);
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// True with probability `p`. `p >= 1` always passes, `p <= 0` never does.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() called with an empty range");
        self.rng.random_range(0..len)
    }

    /// Uniform integer in `[min, max]`.
    pub fn int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    /// Uniform count in `[min, max]`.
    pub fn count(&mut self, min: usize, max: usize) -> usize {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    /// Uniform float in `[min, max)`; `min` when the range is empty.
    pub fn float_range(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..max)
    }

    pub fn boolean(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Random string of ASCII letters and digits.
    pub fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Random string of printable ASCII characters (`' '..='~'`).
    pub fn printable_ascii(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(self.rng.random_range(b' '..=b'~')))
            .collect()
    }

    /// Random string restricted to letters, digits or both.
    ///
    /// With neither class selected, falls back to printable ASCII.
    pub fn string_of(&mut self, len: usize, letters: bool, digits: bool) -> String {
        const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
        const DIGITS: &[u8] = b"0123456789";

        match (letters, digits) {
            (true, true) => self.alphanumeric(len),
            (true, false) => self.from_alphabet(LETTERS, len),
            (false, true) => self.from_alphabet(DIGITS, len),
            (false, false) => self.printable_ascii(len),
        }
    }

    fn from_alphabet(&mut self, alphabet: &[u8], len: usize) -> String {
        (0..len)
            .map(|_| char::from(alphabet[self.rng.random_range(0..alphabet.len())]))
            .collect()
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Weight-proportional choice among `weights`, see [`pick_weighted`].
    pub fn weighted(&mut self, weights: &[f32]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }
        let draw = self.unit();
        pick_weighted(weights, draw)
    }
}

/// Select an index from `weights` given a uniform `draw` in `[0, 1)`.
///
/// Walks the cumulative distribution and returns the first index whose
/// cumulative weight exceeds `draw * total`. Zero-weight entries are never
/// selected unless every weight is zero, in which case the choice is uniform.
pub fn pick_weighted(weights: &[f32], draw: f64) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total: f64 = weights.iter().map(|w| f64::from(w.max(0.0))).sum();
    if total <= 0.0 {
        let idx = (draw * weights.len() as f64) as usize;
        return Some(idx.min(weights.len() - 1));
    }

    let target = draw * total;
    let mut cumulative = 0.0;
    for (idx, w) in weights.iter().enumerate() {
        cumulative += f64::from(w.max(0.0));
        if cumulative > target {
            return Some(idx);
        }
    }

    // Rounding left `target` at the very top; take the last positive weight.
    weights.iter().rposition(|w| *w > 0.0)
}
