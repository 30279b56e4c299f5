//! Adiposity estimator
//!
//! A stateless facial-fullness heuristic over a single landmark snapshot.
//! Three raw ratios (box aspect, mid-face lateral spread, lower-vs-upper
//! width taper) are rescaled against fixed plausible ranges and combined
//! into a weighted fullness index. This is a screen-space heuristic with no
//! clinical meaning; scores degrade to zero on degenerate input.

use crate::geometry::bounding_box;
use crate::types::{AdiposityCategory, AdiposityResult, LandmarkSet, Point};

/// Vertical band (as a fraction of box height) treated as the cheek region.
const CHEEK_BAND: (f64, f64) = (0.35, 0.65);

/// Empirically plausible raw ranges used for rescaling each ratio to [0, 1].
const WIDTH_RATIO_RANGE: (f64, f64) = (0.70, 1.05);
const CHEEK_PLUMPNESS_RANGE: (f64, f64) = (0.28, 0.48);
const JAW_TAPER_RANGE: (f64, f64) = (0.55, 0.95);

/// Component weights for the fullness index.
const WIDTH_WEIGHT: f64 = 0.45;
const CHEEK_WEIGHT: f64 = 0.35;
const JAW_WEIGHT: f64 = 0.20;

const EPSILON: f64 = 1e-9;

/// Estimate facial fullness from one landmark snapshot.
pub fn estimate(landmarks: &LandmarkSet) -> AdiposityResult {
    let points = landmarks.points();
    if points.len() < 3 {
        return AdiposityResult::default();
    }

    let face_box = bounding_box(points);
    let width = face_box.width();
    let height = face_box.height();
    if width < EPSILON || height < EPSILON {
        return AdiposityResult::default();
    }

    let width_ratio = rescale(width / height, WIDTH_RATIO_RANGE);

    // Mean absolute lateral deviation from the vertical centerline over the
    // mid-face band, normalized by half the box width.
    let center_x = face_box.center_x();
    let band_lo = face_box.min_y + CHEEK_BAND.0 * height;
    let band_hi = face_box.min_y + CHEEK_BAND.1 * height;
    let band: Vec<&Point> = points
        .iter()
        .filter(|p| p.y >= band_lo && p.y <= band_hi)
        .collect();
    let cheek_raw = if band.is_empty() {
        0.0
    } else {
        let mean_dev =
            band.iter().map(|p| (p.x - center_x).abs()).sum::<f64>() / band.len() as f64;
        mean_dev / (width / 2.0)
    };
    let cheek_plumpness = rescale(cheek_raw, CHEEK_PLUMPNESS_RANGE);

    // Width of the lowest third over width of the highest third.
    let lower_width = third_width(points, face_box.min_y + 2.0 * height / 3.0, false);
    let upper_width = third_width(points, face_box.min_y + height / 3.0, true);
    let jaw_raw = if upper_width < EPSILON {
        0.0
    } else {
        lower_width / upper_width
    };
    let jaw_taper = rescale(jaw_raw, JAW_TAPER_RANGE);

    let fullness_index = (WIDTH_WEIGHT * width_ratio
        + CHEEK_WEIGHT * cheek_plumpness
        + JAW_WEIGHT * jaw_taper)
        .clamp(0.0, 1.0);

    AdiposityResult {
        width_ratio,
        cheek_plumpness,
        jaw_taper,
        fullness_index,
        category: categorize(fullness_index),
    }
}

/// Horizontal extent of the points below (`upper == false`) or above the
/// given cutoff.
fn third_width(points: &[Point], cutoff_y: f64, upper: bool) -> f64 {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut any = false;
    for p in points {
        let keep = if upper { p.y <= cutoff_y } else { p.y >= cutoff_y };
        if keep {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            any = true;
        }
    }
    if any {
        (max_x - min_x).max(0.0)
    } else {
        0.0
    }
}

fn rescale(raw: f64, range: (f64, f64)) -> f64 {
    ((raw - range.0) / (range.1 - range.0)).clamp(0.0, 1.0)
}

fn categorize(fullness: f64) -> AdiposityCategory {
    if fullness < 0.33 {
        AdiposityCategory::Low
    } else if fullness < 0.66 {
        AdiposityCategory::Medium
    } else {
        AdiposityCategory::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input_is_neutral() {
        let empty = LandmarkSet::new(vec![]).unwrap();
        let result = estimate(&empty);
        assert_eq!(result.fullness_index, 0.0);
        assert_eq!(result.category, AdiposityCategory::Low);
    }

    #[test]
    fn test_degenerate_box_is_neutral() {
        let flat = LandmarkSet::new(vec![Point::new(0.5, 0.5); 20]).unwrap();
        let result = estimate(&flat);
        assert_eq!(result.fullness_index, 0.0);
        assert_eq!(result.category, AdiposityCategory::Low);
    }

    #[test]
    fn test_zero_lateral_spread_zeroes_cheek_term() {
        // Outline corners define the box; every mid-band point sits exactly
        // on the vertical centerline.
        let mut points = vec![
            Point::new(0.3, 0.2),
            Point::new(0.7, 0.2),
            Point::new(0.3, 0.8),
            Point::new(0.7, 0.8),
        ];
        for i in 0..10 {
            points.push(Point::new(0.5, 0.42 + i as f64 * 0.015));
        }
        let set = LandmarkSet::new(points).unwrap();
        let result = estimate(&set);
        assert_eq!(result.cheek_plumpness, 0.0);
    }

    #[test]
    fn test_wide_face_scores_higher_than_narrow() {
        let face = |width: f64| {
            let mut points = Vec::new();
            for i in 0..60 {
                let angle = i as f64 / 60.0 * std::f64::consts::TAU;
                points.push(Point::new(
                    0.5 + width / 2.0 * angle.cos(),
                    0.5 + 0.25 * angle.sin(),
                ));
            }
            LandmarkSet::new(points).unwrap()
        };

        let narrow = estimate(&face(0.30));
        let wide = estimate(&face(0.52));
        assert!(
            wide.fullness_index > narrow.fullness_index,
            "wide {} vs narrow {}",
            wide.fullness_index,
            narrow.fullness_index
        );
    }

    #[test]
    fn test_tapered_jaw_scores_lower_than_square() {
        // Square profile: full width at top and bottom.
        let square = LandmarkSet::new(vec![
            Point::new(0.3, 0.2),
            Point::new(0.7, 0.2),
            Point::new(0.3, 0.8),
            Point::new(0.7, 0.8),
            Point::new(0.35, 0.5),
            Point::new(0.65, 0.5),
        ])
        .unwrap();

        // Tapered: bottom third narrows to a chin.
        let tapered = LandmarkSet::new(vec![
            Point::new(0.3, 0.2),
            Point::new(0.7, 0.2),
            Point::new(0.47, 0.8),
            Point::new(0.53, 0.8),
            Point::new(0.35, 0.5),
            Point::new(0.65, 0.5),
        ])
        .unwrap();

        let square_result = estimate(&square);
        let tapered_result = estimate(&tapered);
        assert!(square_result.jaw_taper > tapered_result.jaw_taper);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(categorize(0.0), AdiposityCategory::Low);
        assert_eq!(categorize(0.32), AdiposityCategory::Low);
        assert_eq!(categorize(0.33), AdiposityCategory::Medium);
        assert_eq!(categorize(0.65), AdiposityCategory::Medium);
        assert_eq!(categorize(0.66), AdiposityCategory::High);
        assert_eq!(categorize(1.0), AdiposityCategory::High);
    }
}
