//! Sampling study harness
//!
//! Repeats one (eta, rho) query many times and summarizes the draw counts
//! and the injected energy.

use rand::SeedableRng;
use serde::Serialize;

use crate::correction::IsolationCorrection;

/// Study configuration
#[derive(Debug, Clone)]
pub struct StudyConfig {
    pub eta: f64,
    pub rho: f64,
    pub trials: usize,
    pub seed: u64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            eta: 0.0,
            rho: 0.0,
            trials: 10_000,
            seed: 42,
        }
    }
}

/// Aggregate of a sampling study
#[derive(Debug, Clone, Serialize)]
pub struct StudySummary {
    pub eta: f64,
    pub rho: f64,
    pub trials: usize,
    pub seed: u64,
    pub eta_bin: usize,
    pub rho_bin: usize,
    pub region: String,
    pub expected_multiplicity: f64,
    pub mean_drawn: f64,
    pub mean_accepted: f64,
    /// Accepted over drawn deposits; 0 when nothing was drawn
    pub acceptance: f64,
    pub threshold: f64,
    pub mean_extra: f64,
    pub rms_extra: f64,
    /// Fraction of queries that returned exactly zero
    pub zero_fraction: f64,
}

/// Run the study
pub fn run_study(correction: &IsolationCorrection, config: &StudyConfig) -> StudySummary {
    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);

    let table = correction.table();
    let eta_bin = table.eta_centers().resolve(config.eta);
    let region = table.region(eta_bin);
    let rho_bin = table.rho_centers(region).resolve(config.rho);
    let threshold = table
        .cell(eta_bin, rho_bin)
        .map(|hist| hist.lowest_bin_upper_edge())
        .unwrap_or(f64::NAN);

    let mut drawn = 0u64;
    let mut accepted = 0u64;
    let mut zeros = 0usize;
    let mut extras = Vec::with_capacity(config.trials);

    for _ in 0..config.trials {
        let draw = correction.extra_detailed(config.eta, config.rho, &mut rng);
        drawn += draw.drawn as u64;
        accepted += draw.accepted as u64;
        if draw.sum == 0.0 {
            zeros += 1;
        }
        extras.push(draw.sum);
    }

    let trials = config.trials.max(1) as f64;
    StudySummary {
        eta: config.eta,
        rho: config.rho,
        trials: config.trials,
        seed: config.seed,
        eta_bin,
        rho_bin,
        region: region.label().to_string(),
        expected_multiplicity: correction.multiplicity().expected(eta_bin),
        mean_drawn: drawn as f64 / trials,
        mean_accepted: accepted as f64 / trials,
        acceptance: if drawn == 0 {
            0.0
        } else {
            accepted as f64 / drawn as f64
        },
        threshold,
        mean_extra: mean(&extras),
        rms_extra: rms(&extras),
        zero_fraction: zeros as f64 / trials,
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Root mean square, 0 for an empty slice
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|&v| v * v).sum();
    (sum_sq / values.len() as f64).sqrt()
}
