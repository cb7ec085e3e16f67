//! Stochastic extra-energy correction
//!
//! Loads the calibration once and answers `extra(eta, rho)` queries by
//! drawing a multiplicity for the eta bin, sampling that many deposits from
//! the cell's histogram and summing those above the cell threshold.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;

use crate::config::CalibrationLayout;
use crate::error::Result;
use crate::multiplicity::ExtraMultiplicity;
use crate::source::{CalibrationSource, JsonSource};
use crate::table::{DistributionTable, Region};

/// Trace of one extra-energy query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtraDraw {
    pub eta_bin: usize,
    /// `None` when no deposit was drawn and the rho lookup was skipped
    pub rho_bin: Option<usize>,
    pub expected: f64,
    /// Deposits drawn before threshold filtering
    pub drawn: u32,
    /// Deposits above the threshold
    pub accepted: u32,
    pub threshold: Option<f64>,
    pub sum: f64,
}

/// Loaded calibration for the isolation-energy correction
#[derive(Debug, Clone)]
pub struct IsolationCorrection {
    table: DistributionTable,
    multiplicity: ExtraMultiplicity,
}

impl IsolationCorrection {
    /// Load from a JSON calibration file with the default layout
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_layout(path, &CalibrationLayout::default())
    }

    pub fn open_with_layout(path: &Path, layout: &CalibrationLayout) -> Result<Self> {
        Self::from_source(JsonSource::open(path)?, layout)
    }

    /// Load every vector and cell histogram from `source`, then close it
    #[tracing::instrument(skip_all)]
    pub fn from_source<S: CalibrationSource>(
        source: S,
        layout: &CalibrationLayout,
    ) -> Result<Self> {
        layout.validate()?;

        let table = DistributionTable::load(&source, layout)?;
        let multiplicity = ExtraMultiplicity::new(
            &layout.extra_multiplicity,
            source.vector(&layout.extra_multiplicity)?,
            table.eta_centers().len(),
        )?;
        source.close();

        tracing::info!(
            eta_bins = table.eta_centers().len(),
            rho_bins_barrel = table.rho_centers(Region::Barrel).len(),
            rho_bins_endcap = table.rho_centers(Region::Endcap).len(),
            cells = table.populated_cells(),
            "loaded isolation correction calibration"
        );

        Ok(Self {
            table,
            multiplicity,
        })
    }

    /// Extra isolation energy for a candidate at (`eta`, `rho`)
    ///
    /// Inputs outside the calibrated span are clamped onto the edge bins.
    pub fn extra<R: Rng + ?Sized>(&self, eta: f64, rho: f64, rng: &mut R) -> f64 {
        self.extra_detailed(eta, rho, rng).sum
    }

    /// Same draw as [`extra`](Self::extra), returning the full trace
    pub fn extra_detailed<R: Rng + ?Sized>(&self, eta: f64, rho: f64, rng: &mut R) -> ExtraDraw {
        let eta_bin = self.table.eta_centers().resolve(eta);
        let expected = self.multiplicity.expected(eta_bin);
        let drawn = self.multiplicity.draw_count(eta_bin, rng);

        let mut draw = ExtraDraw {
            eta_bin,
            rho_bin: None,
            expected,
            drawn,
            accepted: 0,
            threshold: None,
            sum: 0.0,
        };
        if drawn == 0 {
            return draw;
        }

        let region = self.table.region(eta_bin);
        let rho_bin = self.table.rho_centers(region).resolve(rho);
        let hist = match self.table.cell(eta_bin, rho_bin) {
            Ok(hist) => hist,
            // Resolved bins always address a populated cell of the row's region
            Err(err) => unreachable!("{err}"),
        };
        let threshold = hist.lowest_bin_upper_edge();

        for _ in 0..drawn {
            let deposit = hist.sample(rng);
            if deposit > threshold {
                draw.accepted += 1;
                draw.sum += deposit;
            }
        }

        draw.rho_bin = Some(rho_bin);
        draw.threshold = Some(threshold);
        tracing::trace!(
            eta_bin,
            rho_bin,
            drawn,
            accepted = draw.accepted,
            sum = draw.sum,
            "sampled extra energy"
        );
        draw
    }

    /// Bind a generator for repeated queries
    pub fn sampler<R: Rng>(&self, rng: R) -> ExtraSampler<'_, R> {
        ExtraSampler {
            correction: self,
            rng,
        }
    }

    pub fn seeded_sampler(&self, seed: u64) -> ExtraSampler<'_, StdRng> {
        self.sampler(StdRng::seed_from_u64(seed))
    }

    pub fn table(&self) -> &DistributionTable {
        &self.table
    }

    pub fn multiplicity(&self) -> &ExtraMultiplicity {
        &self.multiplicity
    }

    /// True when both corrections hold the same bins and histogram shapes
    pub fn same_calibration(&self, other: &IsolationCorrection) -> bool {
        let same_bins = self.table.eta_centers() == other.table.eta_centers()
            && self.table.rho_centers(Region::Barrel) == other.table.rho_centers(Region::Barrel)
            && self.table.rho_centers(Region::Endcap) == other.table.rho_centers(Region::Endcap)
            && self.multiplicity == other.multiplicity;

        same_bins
            && self.table.populated_cells() == other.table.populated_cells()
            && self
                .table
                .cells()
                .zip(other.table.cells())
                .all(|((ea, ra, a), (eb, rb, b))| ea == eb && ra == rb && a.same_shape(b))
    }
}

/// A correction paired with the generator its queries draw from
///
/// One sampler per thread keeps concurrent use safe; the correction itself
/// is shared read-only.
pub struct ExtraSampler<'a, R> {
    correction: &'a IsolationCorrection,
    rng: R,
}

impl<'a, R: Rng> ExtraSampler<'a, R> {
    pub fn get_extra(&mut self, eta: f64, rho: f64) -> f64 {
        self.correction.extra(eta, rho, &mut self.rng)
    }

    pub fn get_extra_detailed(&mut self, eta: f64, rho: f64) -> ExtraDraw {
        self.correction.extra_detailed(eta, rho, &mut self.rng)
    }
}
