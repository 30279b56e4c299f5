//! Vitalens - On-device facial vitals and drowsiness analytics from landmark streams
//!
//! Vitalens turns per-frame facial landmark snapshots and a color intensity
//! sample into physiological and behavioral insights: face geometry metrics,
//! remote-PPG heart rate / respiration / HRV estimates, blink and PERCLOS
//! drowsiness tracking, and a facial-fullness heuristic.
//!
//! ## Modules
//!
//! - **geometry**: Eye/mouth openness, head pose, and jawline from landmarks
//! - **ppg**: Spectral heart rate, respiration, and HRV from color intensity
//! - **eye_state**: Adaptive blink detection, PERCLOS, and yawn tracking
//! - **adiposity**: Stateless facial-fullness heuristic
//! - **transform**: Least-squares 2D affine fit for landmark stabilization
//! - **smoothing**: Chaikin and convolution polyline smoothers
//! - **session**: Per-subject orchestration producing [`InsightsSnapshot`]s

pub mod adiposity;
pub mod config;
pub mod dsp;
pub mod error;
pub mod eye_state;
pub mod geometry;
pub mod ppg;
pub mod session;
pub mod smoothing;
pub mod transform;
pub mod types;

pub use config::{AnalyzerConfig, EyeStateConfig, PpgConfig, SmoothingConfig};
pub use error::AnalysisError;
pub use session::AnalysisSession;
pub use transform::AffineTransform;
pub use types::{
    AdiposityCategory, AdiposityResult, EyeStateSnapshot, FaceGeometry, HeartRateResult,
    HrvResult, InsightsSnapshot, LandmarkSet, MeshMode, Point, RespirationResult,
};

/// Vitalens version embedded in all insight snapshots
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for insight snapshots
pub const PRODUCER_NAME: &str = "vitalens";
