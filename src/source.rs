//! Calibration sources
//!
//! A source is a name-keyed container of numeric vectors and histograms.
//! Objects are fetched through typed accessors that fail with a
//! `Missing` or `WrongKind` error instead of handing back something the
//! caller has to downcast.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CorrectionError, Result};
use crate::histogram::Histogram;

/// An object stored in a calibration source
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationObject {
    Vector(Vec<f64>),
    Histogram(Histogram),
}

impl CalibrationObject {
    pub fn kind(&self) -> &'static str {
        match self {
            CalibrationObject::Vector(_) => "vector",
            CalibrationObject::Histogram(_) => "histogram",
        }
    }
}

/// Read-only, name-keyed access to calibration objects
pub trait CalibrationSource {
    /// Fetch an owned copy of the object stored under `name`, if any
    fn lookup(&self, name: &str) -> Result<Option<CalibrationObject>>;

    /// Fetch a numeric vector
    fn vector(&self, name: &str) -> Result<Vec<f64>> {
        match self.lookup(name)? {
            Some(CalibrationObject::Vector(values)) => Ok(values),
            Some(other) => Err(CorrectionError::WrongKind {
                name: name.to_string(),
                expected: "vector",
                found: other.kind(),
            }),
            None => Err(CorrectionError::Missing {
                name: name.to_string(),
            }),
        }
    }

    /// Fetch a histogram
    fn histogram(&self, name: &str) -> Result<Histogram> {
        match self.lookup(name)? {
            Some(CalibrationObject::Histogram(hist)) => Ok(hist),
            Some(other) => Err(CorrectionError::WrongKind {
                name: name.to_string(),
                expected: "histogram",
                found: other.kind(),
            }),
            None => Err(CorrectionError::Missing {
                name: name.to_string(),
            }),
        }
    }

    /// Release the source once loading is done
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// In-memory source, mostly used to assemble calibrations programmatically
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    objects: BTreeMap<String, CalibrationObject>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, object: CalibrationObject) {
        self.objects.insert(name.into(), object);
    }

    pub fn with_vector(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, CalibrationObject::Vector(values));
        self
    }

    pub fn with_histogram(mut self, name: impl Into<String>, hist: Histogram) -> Self {
        self.insert(name, CalibrationObject::Histogram(hist));
        self
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Serialize into the JSON calibration-file layout
    pub fn to_json_string(&self) -> Result<String> {
        let records: BTreeMap<&str, ObjectRecord> = self
            .objects
            .iter()
            .map(|(name, object)| (name.as_str(), ObjectRecord::from(object)))
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Write the JSON calibration file to `path`
    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

impl CalibrationSource for MemorySource {
    fn lookup(&self, name: &str) -> Result<Option<CalibrationObject>> {
        Ok(self.objects.get(name).cloned())
    }
}

/// Uniform binning stored as bin count and range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRecord {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ObjectRecord {
    Vector {
        values: Vec<f64>,
    },
    Histogram {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        edges: Option<Vec<f64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        axis: Option<AxisRecord>,
        contents: Vec<f64>,
    },
}

impl ObjectRecord {
    fn into_object(self, name: &str) -> Result<CalibrationObject> {
        match self {
            ObjectRecord::Vector { values } => Ok(CalibrationObject::Vector(values)),
            ObjectRecord::Histogram {
                edges,
                axis,
                contents,
            } => {
                let hist = match (edges, axis) {
                    (Some(edges), None) => Histogram::new(name, edges, contents)?,
                    (None, Some(axis)) => {
                        if axis.bins != contents.len() {
                            return Err(CorrectionError::InvalidHistogram {
                                name: name.to_string(),
                                reason: format!(
                                    "axis declares {} bins but {} contents are stored",
                                    axis.bins,
                                    contents.len()
                                ),
                            });
                        }
                        Histogram::uniform(name, axis.min, axis.max, contents)?
                    }
                    _ => {
                        return Err(CorrectionError::InvalidHistogram {
                            name: name.to_string(),
                            reason: "exactly one of `edges` or `axis` must be given".to_string(),
                        })
                    }
                };
                Ok(CalibrationObject::Histogram(hist))
            }
        }
    }
}

impl From<&CalibrationObject> for ObjectRecord {
    fn from(object: &CalibrationObject) -> Self {
        match object {
            CalibrationObject::Vector(values) => ObjectRecord::Vector {
                values: values.clone(),
            },
            CalibrationObject::Histogram(hist) => ObjectRecord::Histogram {
                edges: Some(hist.edges().to_vec()),
                axis: None,
                contents: hist.contents().to_vec(),
            },
        }
    }
}

/// Calibration file stored as a JSON object of tagged records
///
/// Histograms are validated when fetched, so a malformed object that the
/// loader never asks for does not prevent opening the file.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: Option<PathBuf>,
    records: BTreeMap<String, ObjectRecord>,
}

impl JsonSource {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut source = Self::from_json_str(&raw)?;
        source.path = Some(path.to_path_buf());
        tracing::debug!(
            path = %path.display(),
            objects = source.records.len(),
            "opened calibration file"
        );
        Ok(source)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let records: BTreeMap<String, ObjectRecord> = serde_json::from_str(raw)?;
        Ok(Self {
            path: None,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CalibrationSource for JsonSource {
    fn lookup(&self, name: &str) -> Result<Option<CalibrationObject>> {
        self.records
            .get(name)
            .cloned()
            .map(|record| record.into_object(name))
            .transpose()
    }

    fn close(self) {
        if let Some(path) = &self.path {
            tracing::debug!(path = %path.display(), "closed calibration file");
        }
    }
}
