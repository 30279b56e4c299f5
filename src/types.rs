//! Core types for the Vitalens pipeline
//!
//! This module defines the data that flows through the per-frame pipeline:
//! validated landmark input, derived per-frame geometry, and the recomputed
//! value objects for heart rate, respiration, HRV, eye state and adiposity.

use crate::config::DENSE_POINT_THRESHOLD;
use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single landmark point with normalized planar coordinates in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Optional relative depth, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Euclidean distance in the normalized plane.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Landmark topology resolved once at ingestion.
///
/// Dense meshes (>= 400 points) have stable per-index semantics and enable
/// index-based formulas; anything smaller is treated as an unordered sparse
/// cloud and falls back to percentile formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshMode {
    Dense,
    Sparse,
}

/// An immutable per-frame landmark snapshot.
///
/// Validated once at construction so downstream code never re-checks
/// coordinates. The set may be empty; every consumer degrades to neutral
/// results on degenerate input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Point>,
    mode: MeshMode,
}

impl LandmarkSet {
    /// Build a validated landmark set.
    ///
    /// Rejects non-finite coordinates; coordinates slightly outside [0, 1]
    /// are tolerated since detectors routinely overshoot at the frame edge.
    pub fn new(points: Vec<Point>) -> Result<Self, AnalysisError> {
        for (i, p) in points.iter().enumerate() {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(AnalysisError::InvalidLandmark(format!(
                    "non-finite coordinate at index {i}"
                )));
            }
        }
        let mode = if points.len() >= DENSE_POINT_THRESHOLD {
            MeshMode::Dense
        } else {
            MeshMode::Sparse
        };
        Ok(Self { points, mode })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn mode(&self) -> MeshMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point by index, if present.
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }
}

/// Axis-aligned bounds of a landmark set, recomputed every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl FaceBox {
    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }
}

/// Per-eye openness metrics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EyeMetrics {
    /// Eye aspect ratio proxy for openness, clamped to [0, 1].
    pub openness: f64,
    /// Eye center in normalized coordinates.
    pub center: (f64, f64),
}

/// Mouth openness metrics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MouthMetrics {
    /// Mouth aspect ratio proxy for openness, clamped to [0, 1].
    pub openness: f64,
}

/// Coarse head pose proxy derived from eye positions relative to the face box.
///
/// This is a screen-space heuristic, not metric pose: roll is an angle in
/// radians, yaw and pitch are signed asymmetry ratios in [-1, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HeadPose {
    pub roll: f64,
    pub yaw: f64,
    pub pitch: f64,
}

/// Ordered lower-face contour for rendering and smoothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JawlinePath {
    pub points: Vec<Point>,
}

/// Per-frame geometry bundle produced by the geometry analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceGeometry {
    pub face_box: FaceBox,
    pub left_eye: EyeMetrics,
    pub right_eye: EyeMetrics,
    pub mouth: MouthMetrics,
    pub head_pose: HeadPose,
    pub jawline: JawlinePath,
}

impl FaceGeometry {
    /// Average openness across both eyes.
    pub fn eye_openness(&self) -> f64 {
        (self.left_eye.openness + self.right_eye.openness) / 2.0
    }
}

/// One scalar color-intensity observation from the caller's region of interest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorSample {
    /// Monotonic frame timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Mean channel intensity over the sampled region.
    pub intensity: f64,
}

/// Heart-rate estimate from the PPG spectrum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartRateResult {
    /// Beats per minute, or None when the buffer or spectrum is insufficient.
    pub bpm: Option<f64>,
    /// Relative spectral-energy confidence in [0, 1]. Not a calibrated
    /// probability; 0 means "not enough information".
    pub confidence: f64,
}

/// Respiration-rate estimate from the PPG spectrum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespirationResult {
    /// Breaths per minute, or None when insufficient.
    pub breaths_per_min: Option<f64>,
    /// Relative spectral-energy confidence in [0, 1].
    pub confidence: f64,
}

/// Heart-rate-variability estimate from time-domain beat detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HrvResult {
    /// Root-mean-square of successive inter-beat-interval differences (ms).
    pub rmssd_ms: Option<f64>,
    /// Standard deviation of the inter-beat-interval series (ms).
    pub sdnn_ms: Option<f64>,
    /// Mean inter-beat interval (ms).
    pub mean_ibi_ms: Option<f64>,
    /// Raw count of detected pulse peaks, reported even when metrics are null.
    pub peak_count: usize,
}

/// Eye-state snapshot from the blink/drowsiness tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EyeStateSnapshot {
    /// Whether the eyes are currently classified closed.
    pub eyes_closed: bool,
    /// Whether a blink completed on this update.
    pub blink_detected: bool,
    /// Blinks per minute over the sliding window.
    pub blink_rate_per_min: f64,
    /// Fraction of the sliding window spent with eyes closed, in [0, 1].
    pub perclos: f64,
    /// Stateless yawn probability from current mouth openness, in [0, 1].
    pub yawn_probability: f64,
    /// Adaptive closure threshold in effect for this update.
    pub closure_threshold: f64,
}

/// Facial-fullness category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdiposityCategory {
    #[default]
    Low,
    Medium,
    High,
}

/// Facial-fullness heuristic scores, all in [0, 1].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdiposityResult {
    pub width_ratio: f64,
    pub cheek_plumpness: f64,
    pub jaw_taper: f64,
    /// Weighted fullness index.
    pub fullness_index: f64,
    pub category: AdiposityCategory,
}

/// Per-frame insight bundle emitted by the analysis session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsSnapshot {
    /// Producer crate name.
    pub producer: String,
    /// Producer crate version.
    pub version: String,
    /// Session instance identifier.
    pub session_id: String,
    /// Frame timestamp this snapshot was computed for (milliseconds).
    pub timestamp_ms: f64,
    /// Wall-clock time the snapshot was assembled.
    pub computed_at: DateTime<Utc>,
    pub geometry: FaceGeometry,
    pub eye_state: EyeStateSnapshot,
    pub heart_rate: HeartRateResult,
    pub respiration: RespirationResult,
    pub hrv: HrvResult,
    pub adiposity: AdiposityResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mesh_mode_resolution() {
        let sparse = LandmarkSet::new(vec![Point::new(0.5, 0.5); 68]).unwrap();
        assert_eq!(sparse.mode(), MeshMode::Sparse);

        let dense = LandmarkSet::new(vec![Point::new(0.5, 0.5); 468]).unwrap();
        assert_eq!(dense.mode(), MeshMode::Dense);

        let empty = LandmarkSet::new(vec![]).unwrap();
        assert_eq!(empty.mode(), MeshMode::Sparse);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let result = LandmarkSet::new(vec![Point::new(f64::NAN, 0.5)]);
        assert!(result.is_err());

        let result = LandmarkSet::new(vec![Point::new(0.5, f64::INFINITY)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_face_box_dimensions() {
        let face_box = FaceBox {
            min_x: 0.2,
            min_y: 0.1,
            max_x: 0.8,
            max_y: 0.9,
        };
        assert!((face_box.width() - 0.6).abs() < 1e-12);
        assert!((face_box.height() - 0.8).abs() < 1e-12);
        assert!((face_box.center_x() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_adiposity_category_serialization() {
        let json = serde_json::to_string(&AdiposityCategory::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
