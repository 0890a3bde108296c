use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use crate::error::{Result, SpectraError};

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value attached to a measurement
/// (sample name, temperature, exposure, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Curve – paired wavelength / transmission samples
// ---------------------------------------------------------------------------

/// An optical transmission curve.
///
/// Invariants (checked by [`Curve::new`]):
/// * both arrays have the same, non-zero length
/// * wavelengths are finite and strictly increasing
/// * transmission values are finite
///
/// Every pipeline stage returns a new `Curve`; none mutate their input.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    wavelengths: Vec<f64>,
    transmission: Vec<f64>,
}

impl Curve {
    pub fn new(wavelengths: Vec<f64>, transmission: Vec<f64>) -> Result<Self> {
        if wavelengths.len() != transmission.len() {
            return Err(SpectraError::InvalidCurve(format!(
                "{} wavelengths but {} transmission samples",
                wavelengths.len(),
                transmission.len()
            )));
        }
        if wavelengths.is_empty() {
            return Err(SpectraError::InvalidCurve("curve has no samples".into()));
        }
        if let Some(i) = wavelengths.iter().position(|w| !w.is_finite()) {
            return Err(SpectraError::InvalidCurve(format!(
                "wavelength[{i}] is not finite"
            )));
        }
        if let Some(i) = transmission.iter().position(|t| !t.is_finite()) {
            return Err(SpectraError::InvalidCurve(format!(
                "transmission[{i}] is not finite"
            )));
        }
        if let Some(i) = wavelengths.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SpectraError::InvalidCurve(format!(
                "wavelengths not strictly increasing at index {}: {} -> {}",
                i + 1,
                wavelengths[i],
                wavelengths[i + 1]
            )));
        }
        Ok(Self {
            wavelengths,
            transmission,
        })
    }

    /// Build a curve from arrays derived from an already valid curve.
    pub(crate) fn from_parts(wavelengths: Vec<f64>, transmission: Vec<f64>) -> Self {
        debug_assert_eq!(wavelengths.len(), transmission.len());
        debug_assert!(!wavelengths.is_empty());
        Self {
            wavelengths,
            transmission,
        }
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn transmission(&self) -> &[f64] {
        &self.transmission
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// Always `false` for a curve built through [`Curve::new`].
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    pub fn first_wavelength(&self) -> f64 {
        self.wavelengths[0]
    }

    pub fn last_wavelength(&self) -> f64 {
        self.wavelengths[self.wavelengths.len() - 1]
    }

    /// Sub-curve over a half-open index range.
    pub fn slice(&self, range: Range<usize>) -> Curve {
        Curve::from_parts(
            self.wavelengths[range.clone()].to_vec(),
            self.transmission[range].to_vec(),
        )
    }

    /// Same wavelengths, transmission passed through `f`.
    pub fn map_transmission(&self, f: impl Fn(f64) -> f64) -> Curve {
        Curve::from_parts(
            self.wavelengths.clone(),
            self.transmission.iter().map(|&t| f(t)).collect(),
        )
    }

    /// Index of a wavelength by exact value.
    pub fn index_of_wavelength(&self, wavelength: f64) -> Option<usize> {
        self.wavelengths.iter().position(|&w| w == wavelength)
    }

    pub fn max_transmission(&self) -> f64 {
        self.transmission
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_transmission(&self) -> f64 {
        self.transmission.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

// ---------------------------------------------------------------------------
// Measurement – one curve as read from an input file
// ---------------------------------------------------------------------------

/// A single measurement: a named curve plus whatever metadata the
/// input file carried alongside it.
#[derive(Debug, Clone)]
pub struct Measurement {
    /// File stem, or `file#row` for multi-spectrum files.
    pub name: String,
    pub curve: Curve,
    /// Dynamic metadata columns: column_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// Dataset – everything loaded for one batch run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub measurements: Vec<Measurement>,
    /// Ordered list of metadata column names seen in any measurement.
    pub column_names: Vec<String>,
}

impl Dataset {
    /// Build the column index from the loaded measurements.
    pub fn from_measurements(measurements: Vec<Measurement>) -> Self {
        let mut column_names: Vec<String> = measurements
            .iter()
            .flat_map(|m| m.metadata.keys().cloned())
            .collect();
        column_names.sort();
        column_names.dedup();
        Dataset {
            measurements,
            column_names,
        }
    }

    pub fn extend(&mut self, other: Dataset) {
        let mut measurements = std::mem::take(&mut self.measurements);
        measurements.extend(other.measurements);
        *self = Dataset::from_measurements(measurements);
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}
