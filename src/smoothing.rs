//! Polyline smoothing
//!
//! Two stateless filters for jittery landmark contours:
//! - Chaikin corner-cutting subdivision for rounding a polyline
//! - A fixed 7-tap quadratic convolution over the vertical coordinate
//!
//! Both are no-ops on inputs too short to smooth, so callers can apply them
//! unconditionally per frame.

use crate::types::Point;

/// Quadratic smoothing kernel; taps sum to 21 so the filter preserves
/// constant sequences exactly.
const KERNEL_7: [f64; 7] = [-2.0, 3.0, 6.0, 7.0, 6.0, 3.0, -2.0];
const KERNEL_7_NORM: f64 = 21.0;

/// Chaikin corner-cutting subdivision.
///
/// Endpoints are preserved; every segment contributes points at 1/4 and 3/4
/// interpolation, roughly doubling the point count per iteration. Returns the
/// input unchanged for fewer than 3 points or 0 iterations.
pub fn chaikin_smooth(points: &[Point], iterations: usize) -> Vec<Point> {
    if points.len() < 3 || iterations == 0 {
        return points.to_vec();
    }

    let mut current = points.to_vec();
    for _ in 0..iterations {
        let mut next = Vec::with_capacity(current.len() * 2);
        next.push(current[0]);
        for pair in current.windows(2) {
            next.push(lerp(&pair[0], &pair[1], 0.25));
            next.push(lerp(&pair[0], &pair[1], 0.75));
        }
        next.push(current[current.len() - 1]);
        current = next;
    }
    current
}

/// Fixed-kernel vertical smoothing.
///
/// Applies the 7-tap kernel to y coordinates only; x (and z) pass through
/// unchanged and the point count is preserved. Indices past the sequence
/// boundary replicate the edge value. Defined only for `window == 7`; any
/// other window, or fewer than 3 points, returns the input unchanged.
pub fn kernel_smooth_y(points: &[Point], window: usize) -> Vec<Point> {
    if points.len() < 3 || window != KERNEL_7.len() {
        return points.to_vec();
    }

    let n = points.len();
    let mut out = points.to_vec();
    for i in 0..n {
        let mut acc = 0.0;
        for (k, tap) in KERNEL_7.iter().enumerate() {
            let offset = i as isize + k as isize - 3;
            let j = offset.clamp(0, n as isize - 1) as usize;
            acc += tap * points[j].y;
        }
        out[i].y = acc / KERNEL_7_NORM;
    }
    out
}

fn lerp(p: &Point, q: &Point, t: f64) -> Point {
    Point {
        x: p.x + (q.x - p.x) * t,
        y: p.y + (q.y - p.y) * t,
        z: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn zigzag(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(i as f64 * 0.1, if i % 2 == 0 { 0.2 } else { 0.4 }))
            .collect()
    }

    #[test]
    fn test_chaikin_zero_iterations_is_identity() {
        let points = zigzag(6);
        let out = chaikin_smooth(&points, 0);
        assert_eq!(out, points);
    }

    #[test]
    fn test_chaikin_short_input_is_identity() {
        let points = zigzag(2);
        assert_eq!(chaikin_smooth(&points, 3), points);
    }

    #[test]
    fn test_chaikin_preserves_endpoints_and_grows() {
        let points = zigzag(5);
        let out = chaikin_smooth(&points, 2);

        assert_eq!(out.first().copied(), points.first().copied());
        assert_eq!(out.last().copied(), points.last().copied());
        assert!(out.len() > points.len());
    }

    #[test]
    fn test_chaikin_reduces_corner_amplitude() {
        let points = zigzag(7);
        let out = chaikin_smooth(&points, 2);

        let spread = |pts: &[Point]| {
            let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
            for p in pts.iter().skip(1).take(pts.len() - 2) {
                lo = lo.min(p.y);
                hi = hi.max(p.y);
            }
            hi - lo
        };
        assert!(spread(&out) < spread(&points));
    }

    #[test]
    fn test_kernel_constant_sequence_unchanged() {
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64, 0.37)).collect();
        let out = kernel_smooth_y(&points, 7);

        assert_eq!(out.len(), points.len());
        for (a, b) in out.iter().zip(points.iter()) {
            assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
            assert_relative_eq!(a.x, b.x);
        }
    }

    #[test]
    fn test_kernel_preserves_x_and_count() {
        let points = zigzag(12);
        let out = kernel_smooth_y(&points, 7);

        assert_eq!(out.len(), points.len());
        for (a, b) in out.iter().zip(points.iter()) {
            assert_relative_eq!(a.x, b.x);
        }
    }

    #[test]
    fn test_kernel_other_window_is_noop() {
        let points = zigzag(12);
        assert_eq!(kernel_smooth_y(&points, 5), points);
        assert_eq!(kernel_smooth_y(&points, 9), points);
    }

    #[test]
    fn test_kernel_short_input_is_noop() {
        let points = zigzag(2);
        assert_eq!(kernel_smooth_y(&points, 7), points);
    }
}
