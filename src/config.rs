use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CorrectionError, Result};
use crate::table::Region;

pub const DEFAULT_BARREL_MAX_ETA: f64 = 1.5;
pub const DEFAULT_SEED: u64 = 0x1507_2026;

/// Names and region split used when reading a calibration source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationLayout {
    pub eta_centers: String,
    pub rho_centers_barrel: String,
    pub rho_centers_endcap: String,
    pub extra_multiplicity: String,
    pub histogram_prefix: String,
    pub eta_decimals: usize,
    pub rho_decimals: usize,
    /// Replaces every `.` in a formatted center
    pub decimal_replacement: char,
    /// Eta centers below this value use the barrel rho binning
    pub barrel_max_eta: f64,
}

impl Default for CalibrationLayout {
    fn default() -> Self {
        Self {
            eta_centers: "eta_centers".to_string(),
            rho_centers_barrel: "rho_centers_eb".to_string(),
            rho_centers_endcap: "rho_centers_ee".to_string(),
            extra_multiplicity: "extra_multiplicity".to_string(),
            histogram_prefix: "hist".to_string(),
            eta_decimals: 3,
            rho_decimals: 2,
            decimal_replacement: 'p',
            barrel_max_eta: DEFAULT_BARREL_MAX_ETA,
        }
    }
}

impl CalibrationLayout {
    pub fn validate(&self) -> Result<()> {
        let names = [
            &self.eta_centers,
            &self.rho_centers_barrel,
            &self.rho_centers_endcap,
            &self.extra_multiplicity,
        ];
        if names.iter().any(|name| name.is_empty()) {
            return Err(CorrectionError::InvalidConfig(
                "calibration vector names must not be empty".to_string(),
            ));
        }

        if self.decimal_replacement == '.' {
            return Err(CorrectionError::InvalidConfig(
                "decimal_replacement must differ from '.'".to_string(),
            ));
        }

        if !self.barrel_max_eta.is_finite() {
            return Err(CorrectionError::InvalidConfig(
                "barrel_max_eta must be finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Name of the histogram stored for the cell at (`eta`, `rho`) centers
    ///
    /// With the default layout, `(0.5, 12.25)` becomes `hist_0p500_12p25`.
    pub fn histogram_name(&self, eta: f64, rho: f64) -> String {
        let name = format!(
            "{}_{:.eta_prec$}_{:.rho_prec$}",
            self.histogram_prefix,
            eta,
            rho,
            eta_prec = self.eta_decimals,
            rho_prec = self.rho_decimals,
        );
        name.replace('.', &self.decimal_replacement.to_string())
    }

    /// Region whose rho binning serves the eta row centered at `eta_center`
    pub fn region(&self, eta_center: f64) -> Region {
        if eta_center < self.barrel_max_eta {
            Region::Barrel
        } else {
            Region::Endcap
        }
    }
}

/// Settings for the command-line front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub calibration: Option<PathBuf>,
    pub seed: u64,
    pub trials: usize,
    pub layout: CalibrationLayout,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            calibration: None,
            seed: DEFAULT_SEED,
            trials: 10_000,
            layout: CalibrationLayout::default(),
        }
    }
}

impl CorrectionConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: CorrectionConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(CorrectionError::InvalidConfig(
                "trials must be greater than zero".to_string(),
            ));
        }

        self.layout.validate()
    }
}
