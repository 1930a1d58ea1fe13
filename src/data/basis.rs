//! Minimal B-spline basis: the evaluation capability a [`Patch`] carries.
//!
//! The engine never needs more spline machinery than "evaluate all basis
//! functions at a parameter value"; richer bases (rational weights live on
//! the patch, not here) plug in behind the same struct. Degree 0 doubles as
//! the piecewise-constant basis used for cell-valued fields.
//!
//! [`Patch`]: crate::data::patch::Patch

use crate::mesh_error::MeshTesselateError;

/// Tolerance used when comparing knot values.
pub const KNOT_EPS: f64 = 1e-10;

/// A univariate B-spline basis over a clamped knot vector.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BSplineBasis {
    degree: usize,
    knots: Vec<f64>,
}

impl BSplineBasis {
    /// Create a basis of the given degree over `knots`.
    ///
    /// # Errors
    /// Returns `InvalidPatch` if the knot vector is too short for the degree
    /// or not non-decreasing.
    pub fn new(degree: usize, knots: Vec<f64>) -> Result<Self, MeshTesselateError> {
        if knots.len() < degree + 2 {
            return Err(MeshTesselateError::InvalidPatch(format!(
                "knot vector of length {} cannot carry degree {}",
                knots.len(),
                degree
            )));
        }
        if knots.windows(2).any(|w| w[1] < w[0] - KNOT_EPS) {
            return Err(MeshTesselateError::InvalidPatch(
                "knot vector is not non-decreasing".into(),
            ));
        }
        Ok(Self { degree, knots })
    }

    /// Linear (degree-1) basis interpolating the given breakpoints.
    pub fn linear(breakpoints: &[f64]) -> Result<Self, MeshTesselateError> {
        if breakpoints.len() < 2 {
            return Err(MeshTesselateError::InvalidPatch(
                "linear basis needs at least two breakpoints".into(),
            ));
        }
        let mut knots = Vec::with_capacity(breakpoints.len() + 2);
        knots.push(breakpoints[0]);
        knots.extend_from_slice(breakpoints);
        knots.push(breakpoints[breakpoints.len() - 1]);
        Self::new(1, knots)
    }

    /// Piecewise-constant (degree-0) basis over the same breakpoints.
    ///
    /// This is the collapse applied to a field basis when the field is
    /// cell-valued: one function per knot span.
    pub fn constant(breakpoints: &[f64]) -> Result<Self, MeshTesselateError> {
        if breakpoints.len() < 2 {
            return Err(MeshTesselateError::InvalidPatch(
                "constant basis needs at least two breakpoints".into(),
            ));
        }
        Self::new(0, breakpoints.to_vec())
    }

    /// Polynomial degree.
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Full knot vector, including repetitions.
    #[inline]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Number of basis functions carried by this knot vector.
    #[inline]
    pub fn num_functions(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    /// Parameter interval on which the basis forms a partition of unity.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        (
            self.knots[self.degree],
            self.knots[self.knots.len() - 1 - self.degree],
        )
    }

    /// Distinct knot values, with multiplicities removed.
    ///
    /// These are the default tesselation sample points for the direction.
    pub fn unique_knots(&self) -> Vec<f64> {
        let (lo, hi) = self.domain();
        let mut out: Vec<f64> = Vec::new();
        for &k in &self.knots {
            if k < lo - KNOT_EPS || k > hi + KNOT_EPS {
                continue;
            }
            if out.last().map_or(true, |&last| k > last + KNOT_EPS) {
                out.push(k);
            }
        }
        out
    }

    /// Evaluate all basis functions at `u`, clamped to the domain.
    ///
    /// Returns a dense vector of length [`num_functions`](Self::num_functions).
    /// Uses the Cox–de Boor recurrence with the 0/0 := 0 convention; the
    /// right endpoint is attached to the last non-empty span.
    pub fn evaluate(&self, u: f64) -> Vec<f64> {
        let (lo, hi) = self.domain();
        let u = u.clamp(lo, hi);
        let m = self.knots.len();
        let n = self.num_functions();

        // Span index: largest i with knots[i] <= u < knots[i+1]; for u at
        // the right end, the last non-empty span.
        let mut span = self.degree;
        if u >= hi {
            span = (0..m - 1)
                .rev()
                .find(|&i| self.knots[i] < self.knots[i + 1])
                .unwrap_or(self.degree);
        } else {
            for i in 0..m - 1 {
                if self.knots[i] <= u && u < self.knots[i + 1] {
                    span = i;
                    break;
                }
            }
        }

        let mut vals = vec![0.0; m - 1];
        vals[span] = 1.0;
        for p in 1..=self.degree {
            for i in 0..m - 1 - p {
                let left = {
                    let d = self.knots[i + p] - self.knots[i];
                    if d > KNOT_EPS {
                        (u - self.knots[i]) / d * vals[i]
                    } else {
                        0.0
                    }
                };
                let right = {
                    let d = self.knots[i + p + 1] - self.knots[i + 1];
                    if d > KNOT_EPS {
                        (self.knots[i + p + 1] - u) / d * vals[i + 1]
                    } else {
                        0.0
                    }
                };
                vals[i] = left + right;
            }
        }
        vals.truncate(n);
        vals
    }

    /// Evaluate at every point of `samples`, producing one dense row per
    /// sample.
    pub fn evaluate_all(&self, samples: &[f64]) -> Vec<Vec<f64>> {
        samples.iter().map(|&u| self.evaluate(u)).collect()
    }
}
