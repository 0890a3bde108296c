/// Feature-extraction pipeline: every stage is a pure function from one
/// curve to a new one.
///
/// ```text
///   raw Curve
///        │
///        ▼
///   resample? → normalise? → smooth?        (ProcessingParams)
///        │
///        ├──────────────► fwhm   → width, height, baseline
///        ▼
///   ┌────────────────┐
///   │ window          │  degree-51 fit, derivative sign flips
///   └────────────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ reframe         │  equalise shoulder heights
///   └────────────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ peak            │  31-sample running mean → argmin
///   └────────────────┘
/// ```

pub mod extract;
pub mod fwhm;
pub mod normalise;
pub mod params;
pub mod peak;
pub mod poly;
pub mod reframe;
pub mod resample;
pub mod smooth;
pub mod window;

pub use extract::{extract_features, extract_features_traced, preprocess, FeatureResult, FeatureTrace};
pub use fwhm::{fwhm, FwhmStats};
pub use normalise::normalise;
pub use params::{PeakType, ProcessingParams};
pub use peak::smoothed_peak;
pub use reframe::reframe;
pub use resample::resample;
pub use smooth::smooth;
pub use window::{polynomial_window, select_window, WindowSelection};
