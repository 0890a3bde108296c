//! Resonance wavelength extraction for optical transmission spectra.
//!
//! [`pipeline`] holds the numeric core; [`data`] and [`batch`] are the
//! file intake and reporting layers around it.

pub mod batch;
pub mod data;
pub mod error;
pub mod pipeline;

pub use data::model::{Curve, Dataset, Measurement, MetadataValue};
pub use error::SpectraError;
pub use pipeline::{extract_features, FeatureResult, PeakType, ProcessingParams};
