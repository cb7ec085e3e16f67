//! Empirical 1-D distributions read from the calibration source.
//!
//! A histogram is sampled by inverting its cumulative bin integral: a uniform
//! draw picks the bin, and the remainder of the draw places the value
//! linearly inside that bin.

use rand::Rng;
use rand_distr::Distribution;

use crate::error::{CorrectionError, Result};

/// A binned energy-deposit distribution for one calibration cell
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    name: String,
    /// Bin edges (length = n_bins + 1)
    edges: Vec<f64>,
    /// Bin contents (length = n_bins)
    contents: Vec<f64>,
    /// Normalized cumulative integral (length = n_bins + 1, from 0 to 1)
    cumulative: Vec<f64>,
}

impl Histogram {
    /// Build a histogram from explicit bin edges and contents
    pub fn new(name: impl Into<String>, edges: Vec<f64>, contents: Vec<f64>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| CorrectionError::InvalidHistogram {
            name: name.clone(),
            reason,
        };

        if contents.is_empty() {
            return Err(invalid("histogram has no bins".to_string()));
        }
        if edges.len() != contents.len() + 1 {
            return Err(invalid(format!(
                "{} bins need {} edges, got {}",
                contents.len(),
                contents.len() + 1,
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(invalid("bin edges must be finite".to_string()));
        }
        if let Some(idx) = edges.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(invalid(format!(
                "bin edges must be strictly increasing at edge {}",
                idx + 1
            )));
        }
        if let Some(idx) = contents.iter().position(|c| !c.is_finite() || *c < 0.0) {
            return Err(invalid(format!(
                "bin {idx} has invalid content {}",
                contents[idx]
            )));
        }

        let total: f64 = contents.iter().sum();
        if total <= 0.0 {
            return Err(invalid("histogram is empty".to_string()));
        }

        let mut cumulative = Vec::with_capacity(contents.len() + 1);
        let mut running = 0.0;
        cumulative.push(0.0);
        for &content in &contents {
            running += content;
            cumulative.push(running / total);
        }
        // Pin the top so a draw just below 1 always lands in a real bin
        if let Some(top) = cumulative.last_mut() {
            *top = 1.0;
        }

        Ok(Self {
            name,
            edges,
            contents,
            cumulative,
        })
    }

    /// Build a histogram with `contents.len()` equal-width bins on `[min, max]`
    pub fn uniform(
        name: impl Into<String>,
        min: f64,
        max: f64,
        contents: Vec<f64>,
    ) -> Result<Self> {
        let n = contents.len();
        let width = (max - min) / n.max(1) as f64;
        let edges = (0..=n).map(|idx| min + width * idx as f64).collect();
        Self::new(name, edges, contents)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Sum of all bin contents
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Upper edge of the first bin, used as the rejection threshold
    pub fn lowest_bin_upper_edge(&self) -> f64 {
        self.edges[1]
    }

    /// Content-weighted mean of the bin centers
    pub fn mean(&self) -> f64 {
        let weighted: f64 = self
            .contents
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&content, pair)| content * 0.5 * (pair[0] + pair[1]))
            .sum();
        weighted / self.integral()
    }

    /// True when both histograms share binning and contents
    pub fn same_shape(&self, other: &Histogram) -> bool {
        self.edges == other.edges && self.contents == other.contents
    }
}

impl Distribution<f64> for Histogram {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let r: f64 = rng.gen();
        let last = self.contents.len() - 1;

        // Largest bin whose cumulative start is <= r; empty bins are skipped
        // because their start equals the next bin's start.
        let bin = self
            .cumulative
            .partition_point(|&c| c <= r)
            .saturating_sub(1)
            .min(last);

        let low = self.cumulative[bin];
        let high = self.cumulative[bin + 1];
        let width = self.edges[bin + 1] - self.edges[bin];

        if high > low {
            self.edges[bin] + width * (r - low) / (high - low)
        } else {
            self.edges[bin]
        }
    }
}
