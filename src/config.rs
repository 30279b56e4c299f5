//! Analyzer configuration
//!
//! All tunable parameters are initialization-time settings with documented
//! defaults. Nothing is read from the environment or CLI; the caller builds a
//! config (or takes the defaults) and hands it to the session.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Point count at or above which a landmark set is treated as a dense mesh
/// with stable per-index semantics.
pub const DENSE_POINT_THRESHOLD: usize = 400;

/// Configuration for the PPG signal processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpgConfig {
    /// Maximum age of retained color samples (milliseconds).
    pub sample_window_ms: f64,
    /// Heart-rate search band in BPM (low, high).
    pub hr_band_bpm: (f64, f64),
    /// Respiration search band in breaths per minute (low, high).
    pub resp_band_bpm: (f64, f64),
    /// Minimum buffered samples before heart rate / respiration estimation.
    pub min_samples: usize,
    /// Minimum buffered samples before HRV estimation.
    pub hrv_min_samples: usize,
    /// Minimum interval between heart-rate recomputations (milliseconds).
    pub hr_interval_ms: f64,
    /// Minimum interval between respiration recomputations (milliseconds).
    pub resp_interval_ms: f64,
    /// Minimum interval between HRV recomputations (milliseconds).
    pub hrv_interval_ms: f64,
    /// Peak detection sensitivity: threshold = mean + k * stddev.
    pub peak_k_std: f64,
}

impl Default for PpgConfig {
    fn default() -> Self {
        Self {
            sample_window_ms: 20_000.0,
            hr_band_bpm: (42.0, 180.0),
            resp_band_bpm: (6.0, 30.0),
            min_samples: 64,
            hrv_min_samples: 128,
            hr_interval_ms: 1_000.0,
            resp_interval_ms: 2_000.0,
            hrv_interval_ms: 5_000.0,
            peak_k_std: 0.3,
        }
    }
}

/// Configuration for the eye state tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EyeStateConfig {
    /// Sliding window for PERCLOS and blink rate (milliseconds).
    pub window_ms: f64,
    /// Minimum closure duration counted as a blink (milliseconds).
    pub blink_min_ms: f64,
    /// Maximum closure duration counted as a blink (milliseconds).
    pub blink_max_ms: f64,
    /// Weight of the previous value in the EMA openness baseline.
    pub baseline_decay: f64,
    /// Closure threshold as a fraction of the openness baseline.
    pub threshold_scale: f64,
    /// Lower clamp for the adaptive closure threshold.
    pub threshold_floor: f64,
    /// Upper clamp for the adaptive closure threshold.
    pub threshold_ceil: f64,
    /// Mouth openness where yawn probability starts rising from 0.
    pub yawn_onset: f64,
    /// Mouth openness where yawn probability reaches 1.
    pub yawn_full: f64,
}

impl Default for EyeStateConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000.0,
            blink_min_ms: 80.0,
            blink_max_ms: 500.0,
            baseline_decay: 0.98,
            threshold_scale: 0.55,
            threshold_floor: 0.08,
            threshold_ceil: 0.6,
            yawn_onset: 0.25,
            yawn_full: 0.5,
        }
    }
}

/// Configuration for polyline smoothing of rendered contours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Corner-cutting subdivision passes applied to contours.
    pub chaikin_iterations: usize,
    /// Convolution window for vertical smoothing. Only 7 is supported;
    /// any other value makes the filter a no-op.
    pub kernel_window: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            chaikin_iterations: 2,
            kernel_window: 7,
        }
    }
}

/// Top-level configuration for an analysis session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub ppg: PpgConfig,
    pub eye: EyeStateConfig,
    pub smoothing: SmoothingConfig,
}

impl AnalyzerConfig {
    /// Validate configuration invariants.
    ///
    /// Zero-length windows and inverted frequency bands are programmer
    /// errors and are rejected up front.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.ppg.sample_window_ms > 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "ppg.sample_window_ms must be positive".into(),
            ));
        }
        if self.ppg.hr_band_bpm.0 >= self.ppg.hr_band_bpm.1 {
            return Err(AnalysisError::InvalidConfig(
                "ppg.hr_band_bpm low must be below high".into(),
            ));
        }
        if self.ppg.resp_band_bpm.0 >= self.ppg.resp_band_bpm.1 {
            return Err(AnalysisError::InvalidConfig(
                "ppg.resp_band_bpm low must be below high".into(),
            ));
        }
        if !(self.eye.window_ms > 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "eye.window_ms must be positive".into(),
            ));
        }
        if self.eye.blink_min_ms >= self.eye.blink_max_ms {
            return Err(AnalysisError::InvalidConfig(
                "eye blink duration band is inverted".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.eye.baseline_decay) {
            return Err(AnalysisError::InvalidConfig(
                "eye.baseline_decay must be in [0, 1)".into(),
            ));
        }
        if self.eye.yawn_onset >= self.eye.yawn_full {
            return Err(AnalysisError::InvalidConfig(
                "eye yawn ramp is inverted".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = AnalyzerConfig::default();
        config.ppg.sample_window_ms = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.eye.window_ms = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let mut config = AnalyzerConfig::default();
        config.ppg.hr_band_bpm = (180.0, 42.0);
        assert!(config.validate().is_err());
    }
}
