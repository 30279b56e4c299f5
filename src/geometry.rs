//! Geometry analyzer
//!
//! Derives per-frame facial metrics from a validated landmark set:
//! - Bounding box over all points
//! - Eye and mouth openness (EAR / MAR)
//! - Coarse head pose (roll / yaw / pitch proxies)
//! - Lower-face jawline contour
//!
//! Dense meshes use fixed index correspondences; sparse clouds fall back to
//! region-of-interest percentile formulas. Degenerate input (fewer than 3
//! points, collapsed box) yields an all-zero result, never an error.

use crate::types::{
    EyeMetrics, FaceBox, FaceGeometry, HeadPose, JawlinePath, LandmarkSet, MeshMode, MouthMetrics,
    Point,
};

/// Horizontal eye corner indices (image-left eye) in the dense mesh.
const LEFT_EYE_CORNERS: (usize, usize) = (33, 133);
/// Vertical eyelid pairs (image-left eye).
const LEFT_EYE_LIDS: [(usize, usize); 2] = [(160, 144), (158, 153)];

/// Horizontal eye corner indices (image-right eye).
const RIGHT_EYE_CORNERS: (usize, usize) = (362, 263);
/// Vertical eyelid pairs (image-right eye).
const RIGHT_EYE_LIDS: [(usize, usize); 2] = [(385, 380), (387, 373)];

/// Inner lip vertical pair and mouth corner pair in the dense mesh.
const MOUTH_VERTICAL: (usize, usize) = (13, 14);
const MOUTH_HORIZONTAL: (usize, usize) = (61, 291);

/// Ordered face-outline indices in the dense mesh, starting at the forehead
/// and running clockwise around the oval.
const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// Vertical percentile within the face oval below which points are discarded,
/// keeping only the lower-face contour.
const JAWLINE_CUTOFF_PERCENTILE: f64 = 0.55;

/// Fraction of lowest points used for the sparse jawline fallback.
const SPARSE_JAW_FRACTION: f64 = 0.06;

/// Maximum jawline points kept in sparse mode for rendering economy.
const SPARSE_JAW_MAX_POINTS: usize = 15;

/// Fractional eye regions of interest within the face box (sparse mode):
/// (x_lo, x_hi, y_lo, y_hi) as fractions of box width / height.
const LEFT_EYE_ROI: (f64, f64, f64, f64) = (0.12, 0.45, 0.20, 0.50);
const RIGHT_EYE_ROI: (f64, f64, f64, f64) = (0.55, 0.88, 0.20, 0.50);
const MOUTH_ROI: (f64, f64, f64, f64) = (0.30, 0.70, 0.60, 0.90);

const GEOMETRY_EPSILON: f64 = 1e-9;

/// Analyze one landmark snapshot into a per-frame geometry bundle.
pub fn analyze(landmarks: &LandmarkSet) -> FaceGeometry {
    if landmarks.len() < 3 {
        return FaceGeometry::default();
    }

    let face_box = bounding_box(landmarks.points());
    if face_box.width() < GEOMETRY_EPSILON || face_box.height() < GEOMETRY_EPSILON {
        return FaceGeometry {
            face_box,
            ..FaceGeometry::default()
        };
    }

    let (left_eye, right_eye) = match landmarks.mode() {
        MeshMode::Dense => (
            dense_eye_metrics(landmarks, LEFT_EYE_CORNERS, &LEFT_EYE_LIDS),
            dense_eye_metrics(landmarks, RIGHT_EYE_CORNERS, &RIGHT_EYE_LIDS),
        ),
        MeshMode::Sparse => (
            sparse_eye_metrics(landmarks.points(), &face_box, LEFT_EYE_ROI),
            sparse_eye_metrics(landmarks.points(), &face_box, RIGHT_EYE_ROI),
        ),
    };

    let mouth = match landmarks.mode() {
        MeshMode::Dense => dense_mouth_metrics(landmarks),
        MeshMode::Sparse => sparse_mouth_metrics(landmarks.points(), &face_box),
    };

    let head_pose = head_pose(&face_box, &left_eye, &right_eye);

    let jawline = match landmarks.mode() {
        MeshMode::Dense => dense_jawline(landmarks),
        MeshMode::Sparse => sparse_jawline(landmarks.points()),
    };

    FaceGeometry {
        face_box,
        left_eye,
        right_eye,
        mouth,
        head_pose,
        jawline,
    }
}

/// Min/max bounds over all landmark coordinates.
pub fn bounding_box(points: &[Point]) -> FaceBox {
    let mut b = FaceBox {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for p in points {
        b.min_x = b.min_x.min(p.x);
        b.min_y = b.min_y.min(p.y);
        b.max_x = b.max_x.max(p.x);
        b.max_y = b.max_y.max(p.y);
    }
    if points.is_empty() {
        return FaceBox::default();
    }
    b
}

fn dense_eye_metrics(
    landmarks: &LandmarkSet,
    corners: (usize, usize),
    lids: &[(usize, usize); 2],
) -> EyeMetrics {
    let (Some(c0), Some(c1)) = (landmarks.get(corners.0), landmarks.get(corners.1)) else {
        return EyeMetrics::default();
    };

    let width = c0.distance(&c1);
    if width < GEOMETRY_EPSILON {
        return EyeMetrics::default();
    }

    let mut vertical_sum = 0.0;
    for &(upper, lower) in lids {
        let (Some(u), Some(l)) = (landmarks.get(upper), landmarks.get(lower)) else {
            return EyeMetrics::default();
        };
        vertical_sum += u.distance(&l);
    }

    let ear = (vertical_sum / 2.0) / width;
    EyeMetrics {
        openness: ear.clamp(0.0, 1.0),
        center: ((c0.x + c1.x) / 2.0, (c0.y + c1.y) / 2.0),
    }
}

fn sparse_eye_metrics(points: &[Point], face_box: &FaceBox, roi: (f64, f64, f64, f64)) -> EyeMetrics {
    let (region, center) = roi_points(points, face_box, roi);
    if region.len() < 2 {
        return EyeMetrics {
            openness: 0.0,
            center,
        };
    }

    let mut ys: Vec<f64> = region.iter().map(|p| p.y).collect();
    ys.sort_by(|a, b| a.total_cmp(b));
    let spread = percentile(&ys, 0.85) - percentile(&ys, 0.15);

    let cx = region.iter().map(|p| p.x).sum::<f64>() / region.len() as f64;
    let cy = region.iter().map(|p| p.y).sum::<f64>() / region.len() as f64;

    EyeMetrics {
        openness: (spread / face_box.height()).clamp(0.0, 1.0),
        center: (cx, cy),
    }
}

fn dense_mouth_metrics(landmarks: &LandmarkSet) -> MouthMetrics {
    let (Some(top), Some(bottom)) = (landmarks.get(MOUTH_VERTICAL.0), landmarks.get(MOUTH_VERTICAL.1))
    else {
        return MouthMetrics::default();
    };
    let (Some(left), Some(right)) = (
        landmarks.get(MOUTH_HORIZONTAL.0),
        landmarks.get(MOUTH_HORIZONTAL.1),
    ) else {
        return MouthMetrics::default();
    };

    let width = left.distance(&right);
    if width < GEOMETRY_EPSILON {
        return MouthMetrics::default();
    }

    MouthMetrics {
        openness: (top.distance(&bottom) / width).clamp(0.0, 1.0),
    }
}

fn sparse_mouth_metrics(points: &[Point], face_box: &FaceBox) -> MouthMetrics {
    let (region, _) = roi_points(points, face_box, MOUTH_ROI);
    if region.len() < 2 {
        return MouthMetrics::default();
    }

    let mut ys: Vec<f64> = region.iter().map(|p| p.y).collect();
    ys.sort_by(|a, b| a.total_cmp(b));
    let spread = percentile(&ys, 0.90) - percentile(&ys, 0.20);

    MouthMetrics {
        openness: (spread / face_box.height()).clamp(0.0, 1.0),
    }
}

/// Roll from the eye-line angle; yaw and pitch from eye positions relative to
/// the face box. Coarse proxies only.
fn head_pose(face_box: &FaceBox, left_eye: &EyeMetrics, right_eye: &EyeMetrics) -> HeadPose {
    let (lx, ly) = left_eye.center;
    let (rx, ry) = right_eye.center;

    let roll = (ry - ly).atan2(rx - lx);

    // Yaw: how much closer the eye pair sits to one box edge than the other.
    let right_gap = face_box.max_x - rx;
    let left_gap = lx - face_box.min_x;
    let yaw = (2.0 * (right_gap - left_gap) / face_box.width()).clamp(-1.0, 1.0);

    // Pitch: vertical offset of the eye-line midpoint from box center.
    let mid_y = (ly + ry) / 2.0;
    let pitch = (2.0 * (mid_y - face_box.center_y()) / face_box.height()).clamp(-1.0, 1.0);

    HeadPose { roll, yaw, pitch }
}

fn dense_jawline(landmarks: &LandmarkSet) -> JawlinePath {
    let oval: Vec<Point> = FACE_OVAL
        .iter()
        .filter_map(|&i| landmarks.get(i))
        .collect();
    if oval.len() < 3 {
        return JawlinePath::default();
    }

    let mut ys: Vec<f64> = oval.iter().map(|p| p.y).collect();
    ys.sort_by(|a, b| a.total_cmp(b));
    let cutoff = percentile(&ys, JAWLINE_CUTOFF_PERCENTILE);

    JawlinePath {
        points: oval.into_iter().filter(|p| p.y >= cutoff).collect(),
    }
}

fn sparse_jawline(points: &[Point]) -> JawlinePath {
    if points.len() < 3 {
        return JawlinePath::default();
    }

    let take = ((points.len() as f64 * SPARSE_JAW_FRACTION).ceil() as usize).max(2);
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y));
    let mut lowest: Vec<Point> = sorted.into_iter().take(take).collect();
    lowest.sort_by(|a, b| a.x.total_cmp(&b.x));

    // Thin evenly when the contour is too dense to render cheaply.
    if lowest.len() > SPARSE_JAW_MAX_POINTS {
        let step = lowest.len() as f64 / SPARSE_JAW_MAX_POINTS as f64;
        lowest = (0..SPARSE_JAW_MAX_POINTS)
            .map(|i| lowest[(i as f64 * step) as usize])
            .collect();
    }

    JawlinePath { points: lowest }
}

fn roi_points(
    points: &[Point],
    face_box: &FaceBox,
    roi: (f64, f64, f64, f64),
) -> (Vec<Point>, (f64, f64)) {
    let (x_lo, x_hi, y_lo, y_hi) = roi;
    let w = face_box.width();
    let h = face_box.height();
    let min_x = face_box.min_x + x_lo * w;
    let max_x = face_box.min_x + x_hi * w;
    let min_y = face_box.min_y + y_lo * h;
    let max_y = face_box.min_y + y_hi * h;

    let region: Vec<Point> = points
        .iter()
        .filter(|p| p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y)
        .copied()
        .collect();

    // Nominal ROI center as a fallback when the region is empty.
    let center = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    (region, center)
}

/// Linear-interpolated percentile over a pre-sorted slice. `q` in [0, 1].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Build a dense 468-point mesh with open eyes (EAR = 0.3) and a nearly
    /// closed mouth, filling the remaining indices with a grid inside the box.
    pub fn synthetic_dense_face() -> LandmarkSet {
        let mut points = Vec::with_capacity(468);
        for i in 0..468 {
            let fx = 0.3 + 0.4 * ((i % 22) as f64 / 21.0);
            let fy = 0.25 + 0.5 * ((i / 22) as f64 / 21.0);
            points.push(Point::new(fx, fy));
        }

        // Image-left eye: width 0.10, mean lid gap 0.03 -> EAR 0.3.
        points[33] = Point::new(0.35, 0.45);
        points[133] = Point::new(0.45, 0.45);
        points[160] = Point::new(0.38, 0.435);
        points[144] = Point::new(0.38, 0.465);
        points[158] = Point::new(0.42, 0.435);
        points[153] = Point::new(0.42, 0.465);

        // Image-right eye, mirrored.
        points[362] = Point::new(0.55, 0.45);
        points[263] = Point::new(0.65, 0.45);
        points[385] = Point::new(0.58, 0.435);
        points[380] = Point::new(0.58, 0.465);
        points[387] = Point::new(0.62, 0.435);
        points[373] = Point::new(0.62, 0.465);

        // Closed mouth: lip gap 0.005 over width 0.10 -> MAR 0.05.
        points[13] = Point::new(0.50, 0.620);
        points[14] = Point::new(0.50, 0.625);
        points[61] = Point::new(0.45, 0.622);
        points[291] = Point::new(0.55, 0.622);

        LandmarkSet::new(points).unwrap()
    }

    #[test]
    fn test_empty_landmarks_yield_zero_geometry() {
        let empty = LandmarkSet::new(vec![]).unwrap();
        let geometry = analyze(&empty);
        assert_eq!(geometry.eye_openness(), 0.0);
        assert_eq!(geometry.mouth.openness, 0.0);
        assert!(geometry.jawline.points.is_empty());
    }

    #[test]
    fn test_two_points_never_panic() {
        let tiny =
            LandmarkSet::new(vec![Point::new(0.1, 0.1), Point::new(0.9, 0.9)]).unwrap();
        let geometry = analyze(&tiny);
        assert_eq!(geometry.eye_openness(), 0.0);
    }

    #[test]
    fn test_coincident_points_yield_zero_geometry() {
        let flat = LandmarkSet::new(vec![Point::new(0.5, 0.5); 10]).unwrap();
        let geometry = analyze(&flat);
        assert_eq!(geometry.eye_openness(), 0.0);
        assert_eq!(geometry.mouth.openness, 0.0);
    }

    #[test]
    fn test_bounding_box_min_max() {
        let set = LandmarkSet::new(vec![
            Point::new(0.2, 0.3),
            Point::new(0.7, 0.1),
            Point::new(0.4, 0.8),
        ])
        .unwrap();
        let b = bounding_box(set.points());
        assert_relative_eq!(b.min_x, 0.2);
        assert_relative_eq!(b.max_x, 0.7);
        assert_relative_eq!(b.min_y, 0.1);
        assert_relative_eq!(b.max_y, 0.8);
    }

    #[test]
    fn test_dense_ear_in_plausible_band() {
        let face = synthetic_dense_face();
        let geometry = analyze(&face);

        let openness = geometry.eye_openness();
        assert!(
            (0.25..=0.35).contains(&openness),
            "expected open-eye EAR in [0.25, 0.35], got {openness}"
        );
        assert!(
            geometry.mouth.openness < 0.1,
            "expected closed mouth, got MAR {}",
            geometry.mouth.openness
        );
    }

    #[test]
    fn test_dense_jawline_is_lower_face_only() {
        let face = synthetic_dense_face();
        let geometry = analyze(&face);
        assert!(!geometry.jawline.points.is_empty());

        let box_center_y = geometry.face_box.center_y();
        for p in &geometry.jawline.points {
            assert!(
                p.y >= box_center_y - 0.15,
                "jawline point unexpectedly high: {}",
                p.y
            );
        }
    }

    #[test]
    fn test_level_eyes_have_zero_roll() {
        let face = synthetic_dense_face();
        let geometry = analyze(&face);
        assert_relative_eq!(geometry.head_pose.roll, 0.0, epsilon = 1e-9);
        assert!(geometry.head_pose.yaw.abs() <= 1.0);
        assert!(geometry.head_pose.pitch.abs() <= 1.0);
    }

    #[test]
    fn test_sparse_jawline_sorted_and_thinned() {
        let mut points = Vec::new();
        for i in 0..300 {
            let fx = (i % 20) as f64 / 20.0;
            let fy = (i / 20) as f64 / 15.0;
            points.push(Point::new(fx, fy));
        }
        let set = LandmarkSet::new(points).unwrap();
        assert_eq!(set.mode(), MeshMode::Sparse);

        let jaw = sparse_jawline(set.points());
        assert!(jaw.points.len() <= SPARSE_JAW_MAX_POINTS);
        for pair in jaw.points.windows(2) {
            assert!(pair[0].x <= pair[1].x, "jawline not sorted by x");
        }
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&values, 0.0), 1.0);
        assert_relative_eq!(percentile(&values, 1.0), 5.0);
        assert_relative_eq!(percentile(&values, 0.5), 3.0);
        assert_relative_eq!(percentile(&values, 0.25), 2.0);
    }
}
