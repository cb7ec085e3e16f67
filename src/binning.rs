//! Calibration bin centers and coordinate-to-bin resolution
//!
//! Bins are described by their centers only. A coordinate is assigned to the
//! first center that is greater than or equal to it, and anything outside
//! the calibrated span is clamped onto the nearest edge bin.

use crate::error::{CorrectionError, Result};

/// Strictly increasing, non-empty sequence of bin centers along one axis
#[derive(Debug, Clone, PartialEq)]
pub struct BinCenters {
    centers: Vec<f64>,
}

impl BinCenters {
    /// Validate and wrap a center sequence read under `name`
    pub fn new(name: &str, centers: Vec<f64>) -> Result<Self> {
        if centers.is_empty() {
            return Err(CorrectionError::InvalidVector {
                name: name.to_string(),
                reason: "bin centers must not be empty".to_string(),
            });
        }

        if let Some(idx) = centers.iter().position(|c| !c.is_finite()) {
            return Err(CorrectionError::InvalidVector {
                name: name.to_string(),
                reason: format!("center {idx} is not finite"),
            });
        }

        if let Some(idx) = centers.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(CorrectionError::InvalidVector {
                name: name.to_string(),
                reason: format!(
                    "centers must be strictly increasing, but center {} ({}) follows {}",
                    idx + 1,
                    centers[idx + 1],
                    centers[idx]
                ),
            });
        }

        Ok(Self { centers })
    }

    /// Map `value` onto a bin index
    ///
    /// Values below the first center resolve to 0 and values at or above the
    /// last center resolve to the last index. NaN resolves to 0.
    pub fn resolve(&self, value: f64) -> usize {
        find_index(value, &self.centers)
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Never true for a validated sequence
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.centers.get(idx).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.centers
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.centers.iter().copied()
    }
}

/// Lower-bound lookup with edge clamping over a sorted, non-empty slice
pub fn find_index(value: f64, centers: &[f64]) -> usize {
    let last = centers.len().saturating_sub(1);
    match (centers.first(), centers.last()) {
        (Some(&front), _) if value < front => 0,
        (_, Some(&back)) if value >= back => last,
        _ => centers.partition_point(|&c| c < value).min(last),
    }
}
