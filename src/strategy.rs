use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::mutant::{Mutant, MutantGroup};

/// Decides which mutants of a group are kept.
pub trait MutantStrategy {
    fn name(&self) -> &'static str;

    fn select(&mut self, group: MutantGroup) -> Vec<Mutant>;
}

/// Keeps every mutant.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllMutants;

impl MutantStrategy for AllMutants {
    fn name(&self) -> &'static str {
        "all"
    }

    fn select(&mut self, group: MutantGroup) -> Vec<Mutant> {
        group.mutants
    }
}

/// Keeps one uniformly chosen mutant per group.
#[derive(Debug, Clone)]
pub struct RandomPerGroup {
    rng: ChaCha8Rng,
}

impl RandomPerGroup {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl MutantStrategy for RandomPerGroup {
    fn name(&self) -> &'static str {
        "random-per-group"
    }

    fn select(&mut self, group: MutantGroup) -> Vec<Mutant> {
        let mut mutants = group.mutants;
        if mutants.is_empty() {
            return mutants;
        }
        let idx = self.rng.random_range(0..mutants.len());
        vec![mutants.swap_remove(idx)]
    }
}
