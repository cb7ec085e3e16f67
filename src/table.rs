//! Flattened eta x rho table of calibration histograms
//!
//! Rows are eta bins. Every row shares one stride, the larger of the barrel
//! and endcap rho-bin counts, so the row of the region with fewer rho bins
//! carries unused padding slots at its end.

use crate::binning::BinCenters;
use crate::config::CalibrationLayout;
use crate::error::{CorrectionError, Result};
use crate::histogram::Histogram;
use crate::source::CalibrationSource;

/// Detector region an eta row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Barrel,
    Endcap,
}

impl Region {
    pub fn label(self) -> &'static str {
        match self {
            Region::Barrel => "barrel",
            Region::Endcap => "endcap",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistributionTable {
    eta_centers: BinCenters,
    rho_barrel: BinCenters,
    rho_endcap: BinCenters,
    /// Region of each eta row, fixed by the layout at load time
    regions: Vec<Region>,
    n_rho_centers: usize,
    cells: Vec<Option<Histogram>>,
}

impl DistributionTable {
    /// Read the center vectors and every region-valid histogram from `source`
    pub fn load<S: CalibrationSource + ?Sized>(
        source: &S,
        layout: &CalibrationLayout,
    ) -> Result<Self> {
        let eta_centers = BinCenters::new(
            &layout.eta_centers,
            source.vector(&layout.eta_centers)?,
        )?;
        let rho_barrel = BinCenters::new(
            &layout.rho_centers_barrel,
            source.vector(&layout.rho_centers_barrel)?,
        )?;
        let rho_endcap = BinCenters::new(
            &layout.rho_centers_endcap,
            source.vector(&layout.rho_centers_endcap)?,
        )?;

        let n_rho_centers = rho_barrel.len().max(rho_endcap.len());
        let regions = eta_centers.iter().map(|eta| layout.region(eta)).collect();
        let mut table = Self {
            cells: vec![None; eta_centers.len() * n_rho_centers],
            eta_centers,
            rho_barrel,
            rho_endcap,
            regions,
            n_rho_centers,
        };

        for eta_bin in 0..table.eta_centers.len() {
            let eta = table.eta_centers.as_slice()[eta_bin];
            let region = table.region(eta_bin);
            let rho_centers = table.rho_centers(region).clone();

            for (rho_bin, rho) in rho_centers.iter().enumerate() {
                let name = layout.histogram_name(eta, rho);
                let hist = source.histogram(&name)?;
                tracing::debug!(
                    name = %name,
                    eta_bin,
                    rho_bin,
                    region = region.label(),
                    bins = hist.n_bins(),
                    "loaded calibration histogram"
                );
                let idx = table.index(eta_bin, rho_bin);
                table.cells[idx] = Some(hist);
            }
        }

        Ok(table)
    }

    /// Flat position of (`eta_bin`, `rho_bin`) in the cell array
    pub fn index(&self, eta_bin: usize, rho_bin: usize) -> usize {
        eta_bin * self.n_rho_centers + rho_bin
    }

    /// Checked cell access
    ///
    /// Fails when `eta_bin` is past the last row or `rho_bin` is not a valid
    /// bin of that row's region, so padding is never handed out.
    pub fn cell(&self, eta_bin: usize, rho_bin: usize) -> Result<&Histogram> {
        let out_of_range = CorrectionError::CellOutOfRange { eta_bin, rho_bin };
        if eta_bin >= self.eta_centers.len() {
            return Err(out_of_range);
        }
        if rho_bin >= self.rho_centers(self.region(eta_bin)).len() {
            return Err(out_of_range);
        }

        self.cells[self.index(eta_bin, rho_bin)]
            .as_ref()
            .ok_or(out_of_range)
    }

    /// Region of the eta row; rows past the end count as endcap
    pub fn region(&self, eta_bin: usize) -> Region {
        self.regions
            .get(eta_bin)
            .copied()
            .unwrap_or(Region::Endcap)
    }

    pub fn rho_centers(&self, region: Region) -> &BinCenters {
        match region {
            Region::Barrel => &self.rho_barrel,
            Region::Endcap => &self.rho_endcap,
        }
    }

    pub fn eta_centers(&self) -> &BinCenters {
        &self.eta_centers
    }

    pub fn n_rho_centers(&self) -> usize {
        self.n_rho_centers
    }

    pub fn populated_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Iterate populated cells as (eta_bin, rho_bin, histogram)
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Histogram)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.as_ref()
                .map(|hist| (idx / self.n_rho_centers, idx % self.n_rho_centers, hist))
        })
    }
}
