//! isocorr - stochastic pileup correction for isolation energies
//!
//! Injects extra energy into an isolation sum by sampling binned,
//! data-derived deposit distributions. The calibration is split into eta
//! bins, each with an expected number of extra deposits, and into rho bins
//! that differ between the barrel and endcap regions.
//!
//! ```no_run
//! use isocorr::IsolationCorrection;
//! use rand::SeedableRng;
//!
//! # fn main() -> isocorr::Result<()> {
//! let correction = IsolationCorrection::open("calibration.json".as_ref())?;
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let extra = correction.extra(0.8, 21.5, &mut rng);
//! # let _ = extra;
//! # Ok(())
//! # }
//! ```

pub mod binning;
pub mod config;
pub mod correction;
pub mod error;
pub mod histogram;
pub mod multiplicity;
pub mod sim;
pub mod source;
pub mod table;

// Re-export main types
pub use binning::{find_index, BinCenters};
pub use config::{CalibrationLayout, CorrectionConfig};
pub use correction::{ExtraDraw, ExtraSampler, IsolationCorrection};
pub use error::{CorrectionError, Result};
pub use histogram::Histogram;
pub use multiplicity::ExtraMultiplicity;
pub use sim::{run_study, StudyConfig, StudySummary};
pub use source::{CalibrationObject, CalibrationSource, JsonSource, MemorySource};
pub use table::{DistributionTable, Region};
