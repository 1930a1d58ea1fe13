//! `Patch`: one parametric piece of a multi-patch geometric model.
//!
//! A patch owns per-direction bases, a flat coefficient array and a rational
//! flag. The coefficient layout is fixed crate-wide: the component index
//! varies fastest, then function indices in Fortran order (first parametric
//! direction fastest). Element winding downstream depends on this layout, so
//! it is validated at construction and never reinterpreted.
//!
//! Cached patches are immutable for the duration of a run; promotion and
//! other mutations act on clones.

use crate::data::basis::BSplineBasis;
use crate::mesh_error::MeshTesselateError;

/// A parametric patch of dimension 1–3 embedded in up to three spatial
/// dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    bases: Vec<BSplineBasis>,
    /// Flat coefficients: component fastest, functions Fortran-ordered.
    /// Rational patches store multiply-through coordinates with the weight
    /// as a trailing component.
    coeffs: Vec<f64>,
    /// Embedding dimension, excluding the weight component.
    dimension: usize,
    rational: bool,
}

impl Patch {
    /// Construct a patch, validating the coefficient layout.
    ///
    /// # Errors
    /// `InvalidPatch` if the parametric dimension is outside 1–3 or the
    /// embedding dimension is outside 1–3; `ShapeMismatch` if the
    /// coefficient count does not equal the product of basis sizes times
    /// the component count.
    pub fn new(
        bases: Vec<BSplineBasis>,
        coeffs: Vec<f64>,
        dimension: usize,
        rational: bool,
    ) -> Result<Self, MeshTesselateError> {
        if bases.is_empty() || bases.len() > 3 {
            return Err(MeshTesselateError::InvalidPatch(format!(
                "parametric dimension {} not in 1..=3",
                bases.len()
            )));
        }
        if dimension == 0 || dimension > 3 {
            return Err(MeshTesselateError::InvalidPatch(format!(
                "embedding dimension {dimension} not in 1..=3"
            )));
        }
        let ncomp = dimension + usize::from(rational);
        let expected: usize = bases.iter().map(|b| b.num_functions()).product::<usize>() * ncomp;
        if coeffs.len() != expected {
            return Err(MeshTesselateError::ShapeMismatch {
                expected,
                found: coeffs.len(),
            });
        }
        Ok(Self {
            bases,
            coeffs,
            dimension,
            rational,
        })
    }

    /// Parametric dimension (number of directions).
    #[inline]
    pub fn pardim(&self) -> usize {
        self.bases.len()
    }

    /// Embedding dimension, excluding the rational weight.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Whether the patch carries rational weights.
    #[inline]
    pub fn rational(&self) -> bool {
        self.rational
    }

    /// Per-direction bases.
    #[inline]
    pub fn bases(&self) -> &[BSplineBasis] {
        &self.bases
    }

    /// Number of basis functions per direction.
    pub fn shape(&self) -> Vec<usize> {
        self.bases.iter().map(|b| b.num_functions()).collect()
    }

    /// Distinct knot values per direction: the patch's own tesselation
    /// schedule.
    pub fn knots(&self) -> Vec<Vec<f64>> {
        self.bases.iter().map(|b| b.unique_knots()).collect()
    }

    /// Stored components per control point, including the weight.
    #[inline]
    fn ncomp(&self) -> usize {
        self.dimension + usize::from(self.rational)
    }

    /// Promote the embedding to `dim` spatial components by zero-padding.
    ///
    /// Output geometry is always promoted to three components. Rational
    /// weights stay in the trailing slot. A no-op when already at `dim`.
    pub fn set_dimension(&mut self, dim: usize) -> Result<(), MeshTesselateError> {
        if dim < self.dimension || dim > 3 {
            return Err(MeshTesselateError::InvalidPatch(format!(
                "cannot change embedding dimension {} to {dim}",
                self.dimension
            )));
        }
        if dim == self.dimension {
            return Ok(());
        }
        let old = self.ncomp();
        let new = dim + usize::from(self.rational);
        let npts = self.coeffs.len() / old;
        let mut coeffs = vec![0.0; npts * new];
        for p in 0..npts {
            for c in 0..self.dimension {
                coeffs[p * new + c] = self.coeffs[p * old + c];
            }
            if self.rational {
                coeffs[p * new + new - 1] = self.coeffs[p * old + old - 1];
            }
        }
        self.coeffs = coeffs;
        self.dimension = dim;
        Ok(())
    }

    /// Evaluate the patch at the tensor grid spanned by `samples`
    /// (one sample vector per direction).
    ///
    /// Returns flat values with the component index fastest and grid points
    /// in Fortran order (first direction fastest). Rational patches are
    /// divided through by the evaluated weight.
    ///
    /// # Errors
    /// `ShapeMismatch` if `samples` does not provide one vector per
    /// parametric direction.
    pub fn evaluate(&self, samples: &[Vec<f64>]) -> Result<Vec<f64>, MeshTesselateError> {
        if samples.len() != self.pardim() {
            return Err(MeshTesselateError::ShapeMismatch {
                expected: self.pardim(),
                found: samples.len(),
            });
        }
        let ncomp = self.ncomp();
        let mut data = eval_tensor(&self.bases, &self.coeffs, ncomp, samples)?;
        if self.rational {
            let npts = data.len() / ncomp;
            let mut projected = Vec::with_capacity(npts * self.dimension);
            for p in 0..npts {
                let w = data[p * ncomp + ncomp - 1];
                for c in 0..self.dimension {
                    projected.push(data[p * ncomp + c] / w);
                }
            }
            data = projected;
        }
        Ok(data)
    }

    /// Spatial coordinates of the 2^d corner control points, zero-padded to
    /// three components, in Fortran order over the corner flags.
    ///
    /// Used by the topology catalogue to disambiguate orientations of
    /// structurally symmetric patches.
    pub fn corners(&self) -> Vec<[f64; 3]> {
        let shape = self.shape();
        let d = self.pardim();
        let ncomp = self.ncomp();
        let mut out = Vec::with_capacity(1 << d);
        for flags in 0..(1usize << d) {
            let mut idx = 0usize;
            let mut stride = 1usize;
            for (dir, &n) in shape.iter().enumerate() {
                if flags >> dir & 1 == 1 {
                    idx += (n - 1) * stride;
                }
                stride *= n;
            }
            let base = idx * ncomp;
            let w = if self.rational {
                self.coeffs[base + ncomp - 1]
            } else {
                1.0
            };
            let mut corner = [0.0; 3];
            for c in 0..self.dimension {
                corner[c] = self.coeffs[base + c] / w;
            }
            out.push(corner);
        }
        out
    }
}

/// Evaluate a tensor-product coefficient array at a sample grid.
///
/// `coeffs` holds `ncomp` components per function, component index fastest,
/// functions Fortran-ordered over `bases`. The result keeps the same layout
/// with sample indices in place of function indices. Shared by patch
/// evaluation and by field evaluation, where the component count is not
/// limited to spatial dimensions.
pub(crate) fn eval_tensor(
    bases: &[BSplineBasis],
    coeffs: &[f64],
    ncomp: usize,
    samples: &[Vec<f64>],
) -> Result<Vec<f64>, MeshTesselateError> {
    if samples.len() != bases.len() {
        return Err(MeshTesselateError::ShapeMismatch {
            expected: bases.len(),
            found: samples.len(),
        });
    }
    let expected: usize = bases.iter().map(|b| b.num_functions()).product::<usize>() * ncomp;
    if coeffs.len() != expected {
        return Err(MeshTesselateError::ShapeMismatch {
            expected,
            found: coeffs.len(),
        });
    }
    let mut data = coeffs.to_vec();
    // Contract one direction at a time. `lead` covers the component axis
    // plus all already-contracted sample axes; `trail` covers the
    // not-yet-contracted function axes.
    let mut lead = ncomp;
    for (d, basis) in bases.iter().enumerate() {
        let nf = basis.num_functions();
        let rows = basis.evaluate_all(&samples[d]);
        let ns = rows.len();
        let trail = data.len() / (lead * nf);
        let mut out = vec![0.0; lead * ns * trail];
        for t in 0..trail {
            for (s, row) in rows.iter().enumerate() {
                let dst = lead * (s + ns * t);
                for (f, &w) in row.iter().enumerate() {
                    if w == 0.0 {
                        continue;
                    }
                    let src = lead * (f + nf * t);
                    for l in 0..lead {
                        out[dst + l] += w * data[src + l];
                    }
                }
            }
        }
        data = out;
        lead *= ns;
    }
    Ok(data)
}
