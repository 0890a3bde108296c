use thiserror::Error;

/// Errors raised by the feature-extraction core.
///
/// All of these are local to a single curve: batch callers log them and
/// move on to the next measurement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectraError {
    /// Not enough samples (or an unusable value) for the requested operation.
    #[error("domain error: {0}")]
    Domain(String),

    /// Wavelength/transmission arrays that break the curve invariants.
    #[error("invalid curve: {0}")]
    InvalidCurve(String),

    /// Processing parameters outside their accepted range.
    #[error("invalid processing parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, SpectraError>;
