//! Session orchestration
//!
//! This module provides the public per-frame API. An [`AnalysisSession`] owns
//! every piece of cross-frame state explicitly (no globals, no statics), so
//! concurrent subjects are handled by creating one session each; within a
//! session the caller drives updates serially, one per frame.
//!
//! Per frame: geometry is derived from the landmark snapshot, the eye tracker
//! and PPG processor are advanced, the adiposity heuristic is recomputed, and
//! everything is bundled into an [`InsightsSnapshot`].

use crate::adiposity;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::eye_state::EyeStateTracker;
use crate::geometry;
use crate::ppg::PpgProcessor;
use crate::smoothing;
use crate::types::{InsightsSnapshot, LandmarkSet};
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Backwards jitter tolerated before a timestamp counts as a regression.
const TIMESTAMP_JITTER_MS: f64 = 1.0;

/// A single-subject analysis session.
pub struct AnalysisSession {
    config: AnalyzerConfig,
    session_id: Uuid,
    ppg: PpgProcessor,
    eyes: EyeStateTracker,
    last_timestamp_ms: Option<f64>,
}

impl AnalysisSession {
    /// Create a session with default configuration.
    pub fn new() -> Self {
        let config = AnalyzerConfig::default();
        let session_id = Uuid::new_v4();
        Self {
            ppg: PpgProcessor::new(config.ppg.clone()),
            eyes: EyeStateTracker::new(config.eye.clone()),
            config,
            session_id,
            last_timestamp_ms: None,
        }
    }

    /// Create a session with a custom configuration, validated up front.
    pub fn with_config(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let session_id = Uuid::new_v4();
        tracing::debug!(%session_id, "analysis session created");
        Ok(Self {
            ppg: PpgProcessor::new(config.ppg.clone()),
            eyes: EyeStateTracker::new(config.eye.clone()),
            config,
            session_id,
            last_timestamp_ms: None,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Process one frame: a landmark snapshot, its timestamp, and the mean
    /// color intensity of the caller's PPG region of interest.
    ///
    /// Timestamps must be finite, non-negative, and non-decreasing (within a
    /// small jitter tolerance); violations are programmer errors and fail
    /// fast. Degenerate landmark content degrades to neutral metrics instead.
    pub fn process_frame(
        &mut self,
        landmarks: &LandmarkSet,
        timestamp_ms: f64,
        intensity: f64,
    ) -> Result<InsightsSnapshot, AnalysisError> {
        if !timestamp_ms.is_finite() || timestamp_ms < 0.0 {
            return Err(AnalysisError::InvalidTimestamp(format!(
                "timestamp must be finite and non-negative, got {timestamp_ms}"
            )));
        }
        if let Some(last) = self.last_timestamp_ms {
            if timestamp_ms < last - TIMESTAMP_JITTER_MS {
                return Err(AnalysisError::InvalidTimestamp(format!(
                    "timestamp regressed from {last} to {timestamp_ms}"
                )));
            }
        }
        self.last_timestamp_ms = Some(timestamp_ms);

        let mut geometry = geometry::analyze(landmarks);
        geometry.jawline.points = smoothing::chaikin_smooth(
            &geometry.jawline.points,
            self.config.smoothing.chaikin_iterations,
        );
        geometry.jawline.points = smoothing::kernel_smooth_y(
            &geometry.jawline.points,
            self.config.smoothing.kernel_window,
        );
        let eye_state = self.eyes.update(
            geometry.eye_openness(),
            geometry.mouth.openness,
            timestamp_ms,
        );

        self.ppg.push_sample(timestamp_ms, intensity);
        self.ppg.update(timestamp_ms);

        Ok(InsightsSnapshot {
            producer: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
            session_id: self.session_id.to_string(),
            timestamp_ms,
            computed_at: Utc::now(),
            adiposity: adiposity::estimate(landmarks),
            geometry,
            eye_state,
            heart_rate: self.ppg.heart_rate(),
            respiration: self.ppg.respiration(),
            hrv: self.ppg.hrv(),
        })
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}
