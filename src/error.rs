//! Error type shared by loading, configuration and table access.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("calibration object `{name}` not found")]
    Missing { name: String },
    #[error("calibration object `{name}` is a {found}, expected a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid vector `{name}`: {reason}")]
    InvalidVector { name: String, reason: String },
    #[error("invalid histogram `{name}`: {reason}")]
    InvalidHistogram { name: String, reason: String },
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("cell (eta bin {eta_bin}, rho bin {rho_bin}) is outside the calibrated region")]
    CellOutOfRange { eta_bin: usize, rho_bin: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CorrectionError>;
