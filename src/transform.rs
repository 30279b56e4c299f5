//! Similarity transform solver
//!
//! Fits a full 2D affine map from exactly three point correspondences by
//! assembling the six linear equations into a 6x6 system and solving with
//! Gaussian elimination under partial pivoting.
//!
//! Used for mapping live landmarks onto a canonical template (stabilized
//! crops) and for estimating inter-frame rigid motion between facial anchor
//! triples so head motion can be cancelled out of displacement measurements.

use serde::{Deserialize, Serialize};

/// Pivot magnitude below which the correspondence set is considered
/// near-colinear and the fit is rejected.
const PIVOT_EPSILON: f64 = 1e-10;

/// A 6-parameter affine transform:
///
/// ```text
/// x' = a * x + b * y + tx
/// y' = c * x + d * y + ty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// The identity transform (1, 0, 0, 1, 0, 0).
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Fit the affine map taking `src` points onto `dst` points.
    ///
    /// Requires three correspondences on each side; fewer yields the identity
    /// transform. Near-colinear correspondences (a pivot underflowing the
    /// numerical epsilon during elimination) also yield the identity rather
    /// than a partially-solved, silently wrong transform.
    pub fn fit(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Self {
        if src.len() < 3 || dst.len() < 3 {
            return Self::identity();
        }

        // Unknown vector: [a, b, tx, c, d, ty].
        // Each correspondence contributes one row per output coordinate.
        let mut m = [[0.0f64; 7]; 6];
        for i in 0..3 {
            let (sx, sy) = src[i];
            let (dx, dy) = dst[i];
            m[2 * i] = [sx, sy, 1.0, 0.0, 0.0, 0.0, dx];
            m[2 * i + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, dy];
        }

        match solve_6x6(&mut m) {
            Some(x) => Self {
                a: x[0],
                b: x[1],
                tx: x[2],
                c: x[3],
                d: x[4],
                ty: x[5],
            },
            None => Self::identity(),
        }
    }

    /// Apply the transform to a point.
    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        (
            self.a * point.0 + self.b * point.1 + self.tx,
            self.c * point.0 + self.d * point.1 + self.ty,
        )
    }

    /// Translation magnitude, useful as a rigid-motion estimate between two
    /// anchor triples of consecutive frames.
    pub fn translation_magnitude(&self) -> f64 {
        (self.tx * self.tx + self.ty * self.ty).sqrt()
    }
}

/// Gaussian elimination with partial pivoting over an augmented 6x7 matrix.
/// Returns None when a pivot falls below the numerical epsilon.
fn solve_6x6(m: &mut [[f64; 7]; 6]) -> Option<[f64; 6]> {
    for col in 0..6 {
        // Select the largest-magnitude candidate pivot in this column.
        let mut max_row = col;
        let mut max_val = m[col][col].abs();
        for row in (col + 1)..6 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }
        if max_val < PIVOT_EPSILON {
            return None;
        }
        m.swap(col, max_row);

        let pivot = m[col][col];
        for row in (col + 1)..6 {
            let factor = m[row][col] / pivot;
            for j in col..7 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f64; 6];
    for i in (0..6).rev() {
        let mut acc = m[i][6];
        for j in (i + 1)..6 {
            acc -= m[i][j] * x[j];
        }
        x[i] = acc / m[i][i];
    }
    Some(x)
}
