//! First-response SLA outcomes for tickets.
//!
//! When the support export carries no SLA column the loader asks an
//! [`SlaSource`] for each ticket's outcome. [`SyntheticSla`] is a stand-in
//! that draws outcomes at random; its figures are placeholders, not
//! measurements, and the dashboard flags them as such.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::models::SlaOutcome;

/// Share of synthetic tickets answered within the SLA window.
pub const SYNTHETIC_WITHIN_RATE: f64 = 0.85;

pub trait SlaSource {
    fn name(&self) -> &'static str;

    /// Whether outcomes are made up rather than derived from ticket data.
    fn is_synthetic(&self) -> bool;

    fn first_response(&mut self, row: usize) -> SlaOutcome;
}

pub struct SyntheticSla {
    seed: u64,
    within_rate: f64,
    inner: Pcg64Mcg,
}

impl SyntheticSla {
    pub fn new(seed: u64) -> Self {
        Self::with_rate(seed, SYNTHETIC_WITHIN_RATE)
    }

    pub fn with_rate(seed: u64, within_rate: f64) -> Self {
        Self {
            seed,
            within_rate: within_rate.clamp(0.0, 1.0),
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Seeds from the thread RNG. The seed is available through [`Self::seed`]
    /// so a run can be reproduced.
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SlaSource for SyntheticSla {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn is_synthetic(&self) -> bool {
        true
    }

    fn first_response(&mut self, _row: usize) -> SlaOutcome {
        if self.inner.gen_bool(self.within_rate) {
            SlaOutcome::Within
        } else {
            SlaOutcome::Breached
        }
    }
}
