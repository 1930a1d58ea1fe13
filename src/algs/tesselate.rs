//! Tesselation: discretize a parametric patch into a linear node/element
//! mesh at a fixed sample grid.
//!
//! The flattening convention is load-bearing: grid point `(i, j, k)` gets
//! flat node index `i + n0*(j + n1*k)` (first direction fastest), cells are
//! enumerated in the same order, and the per-cell corner order below fixes
//! the element winding consumed by visualization sinks. Changing any of
//! these breaks downstream interpretation silently, so all three live in
//! this module and nowhere else.

use crate::data::basis::BSplineBasis;
use crate::data::patch::{eval_tensor, Patch};
use crate::mesh_error::MeshTesselateError;

/// Linear element connectivity: `num_cells` cells of `2^pardim` corners,
/// indices local to the patch's own node block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Elements {
    pardim: usize,
    indices: Vec<usize>,
}

impl Elements {
    /// Empty connectivity for cells of parametric dimension `pardim`.
    pub fn new(pardim: usize) -> Self {
        Self {
            pardim,
            indices: Vec::new(),
        }
    }

    /// Parametric dimension of the cells.
    #[inline]
    pub fn pardim(&self) -> usize {
        self.pardim
    }

    /// Corners per cell: 2 for lines, 4 for quads, 8 for hexahedra.
    #[inline]
    pub fn nodes_per_cell(&self) -> usize {
        1 << self.pardim
    }

    /// Number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.indices.len() / self.nodes_per_cell()
    }

    /// Flat corner indices, cell-major.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Iterate over per-cell corner slices.
    pub fn cells(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.indices.chunks_exact(self.nodes_per_cell())
    }

    /// Append one cell.
    pub(crate) fn push_cell(&mut self, corners: &[usize]) {
        debug_assert_eq!(corners.len(), self.nodes_per_cell());
        self.indices.extend_from_slice(corners);
    }

    /// Apply `f` to every corner index in place.
    pub(crate) fn map_indices(&mut self, f: impl Fn(usize) -> usize) {
        for idx in &mut self.indices {
            *idx = f(*idx);
        }
    }
}

/// Base structured connectivity over a grid with `npts` nodes per
/// direction.
///
/// Cells follow the winding fixed in the module docs: for 2D the
/// counter-clockwise quad `(i,j), (i+1,j), (i+1,j+1), (i,j+1)`; for 3D the
/// 8-node hexahedron with that quad as bottom face and the same quad one
/// layer up as top face.
///
/// # Errors
/// `InvalidShape` if the dimension is outside 1..=3 or any extent is < 2.
pub fn structured_cells(npts: &[usize]) -> Result<Elements, MeshTesselateError> {
    if npts.is_empty() || npts.len() > 3 {
        return Err(MeshTesselateError::InvalidShape(format!(
            "{}-dimensional structured grid not supported",
            npts.len()
        )));
    }
    if let Some(&n) = npts.iter().find(|&&n| n < 2) {
        return Err(MeshTesselateError::InvalidShape(format!(
            "structured extent {n} is below the minimum of 2"
        )));
    }
    let mut elements = Elements::new(npts.len());
    match *npts {
        [n0] => {
            for i in 0..n0 - 1 {
                elements.push_cell(&[i, i + 1]);
            }
        }
        [n0, n1] => {
            let r = |i: usize, j: usize| i + j * n0;
            for j in 0..n1 - 1 {
                for i in 0..n0 - 1 {
                    elements.push_cell(&[r(i, j), r(i + 1, j), r(i + 1, j + 1), r(i, j + 1)]);
                }
            }
        }
        [n0, n1, n2] => {
            let r = |i: usize, j: usize, k: usize| i + n0 * (j + n1 * k);
            for k in 0..n2 - 1 {
                for j in 0..n1 - 1 {
                    for i in 0..n0 - 1 {
                        elements.push_cell(&[
                            r(i, j, k),
                            r(i + 1, j, k),
                            r(i + 1, j + 1, k),
                            r(i, j + 1, k),
                            r(i, j, k + 1),
                            r(i + 1, j, k + 1),
                            r(i + 1, j + 1, k + 1),
                            r(i, j + 1, k + 1),
                        ]);
                    }
                }
            }
        }
        _ => unreachable!(),
    }
    Ok(elements)
}

/// Field coefficients to evaluate alongside the geometry.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec<'a> {
    /// Flat coefficients over the patch's basis (or its degree-0 collapse
    /// when `as_cells`), component index fastest.
    pub coeffs: &'a [f64],
    /// Evaluate one value per cell (piecewise constant) instead of one per
    /// node.
    pub as_cells: bool,
    /// Promote a scalar result to three components for vector display, the
    /// value landing in the last channel. Multi-component results are
    /// zero-padded to three channels regardless of this flag.
    pub vectorize: bool,
}

/// Field values evaluated at the tesselation grid, component index fastest.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldValues {
    pub values: Vec<f64>,
    pub ncomps: usize,
}

impl FieldValues {
    /// Values of component `c`, one per grid point (or per cell).
    pub fn component(&self, c: usize) -> Vec<f64> {
        self.values
            .iter()
            .skip(c)
            .step_by(self.ncomps)
            .copied()
            .collect()
    }

    /// Number of grid points (or cells) covered.
    pub fn len(&self) -> usize {
        self.values.len() / self.ncomps
    }

    /// Whether no values are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of tesselating one patch.
#[derive(Clone, Debug, PartialEq)]
pub struct Tesselation {
    /// Node coordinates, promoted to three components.
    pub nodes: Vec<[f64; 3]>,
    /// Patch-local connectivity.
    pub elements: Elements,
    /// Field values at the same grid, when requested.
    pub field: Option<FieldValues>,
}

/// Discretize `patch` at `schedule` and optionally evaluate a field's
/// coefficients at the same grid.
///
/// Pure over its inputs: no caller-visible state is touched.
///
/// # Errors
/// `InvalidShape` for degenerate schedules (fewer than two samples in a
/// direction); `ShapeMismatch` if the field coefficient count does not
/// equal the product of basis sizes times a whole component count.
pub fn tesselate(
    patch: &Patch,
    schedule: &[Vec<f64>],
    field: Option<FieldSpec<'_>>,
) -> Result<Tesselation, MeshTesselateError> {
    if schedule.len() != patch.pardim() {
        return Err(MeshTesselateError::ShapeMismatch {
            expected: patch.pardim(),
            found: schedule.len(),
        });
    }
    if let Some(t) = schedule.iter().find(|t| t.len() < 2) {
        return Err(MeshTesselateError::InvalidShape(format!(
            "tesselation schedule with {} sample(s) in a direction",
            t.len()
        )));
    }

    let counts: Vec<usize> = schedule.iter().map(|t| t.len()).collect();
    let elements = structured_cells(&counts)?;

    let mut geometry = patch.clone();
    geometry.set_dimension(3)?;
    let flat = geometry.evaluate(schedule)?;
    let nodes: Vec<[f64; 3]> = flat
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let field = match field {
        None => None,
        Some(spec) => Some(evaluate_field(patch, schedule, spec)?),
    };

    Ok(Tesselation {
        nodes,
        elements,
        field,
    })
}

fn evaluate_field(
    patch: &Patch,
    schedule: &[Vec<f64>],
    spec: FieldSpec<'_>,
) -> Result<FieldValues, MeshTesselateError> {
    let (bases, points): (Vec<BSplineBasis>, Vec<Vec<f64>>) = if spec.as_cells {
        // Collapse to a piecewise-constant basis per direction and sample
        // at schedule midpoints: one value per cell.
        let bases = patch
            .knots()
            .iter()
            .map(|k| BSplineBasis::constant(k))
            .collect::<Result<Vec<_>, _>>()?;
        let midpoints = schedule
            .iter()
            .map(|t| t.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect())
            .collect();
        (bases, midpoints)
    } else {
        (patch.bases().to_vec(), schedule.to_vec())
    };

    let nfuncs: usize = bases.iter().map(|b| b.num_functions()).product();
    if nfuncs == 0 || spec.coeffs.len() % nfuncs != 0 || spec.coeffs.is_empty() {
        return Err(MeshTesselateError::ShapeMismatch {
            expected: nfuncs,
            found: spec.coeffs.len(),
        });
    }
    let ncomps = spec.coeffs.len() / nfuncs;
    let values = eval_tensor(&bases, spec.coeffs, ncomps, &points)?;

    // Multi-component values always reach the sink with three channels;
    // scalars stay scalar unless promoted for vector display.
    if (1 < ncomps && ncomps < 3) || (spec.vectorize && ncomps == 1) {
        let npts = values.len() / ncomps;
        let mut padded = vec![0.0; npts * 3];
        for p in 0..npts {
            if ncomps == 1 {
                // Scalar eigenmodes display as vectors along the last axis.
                padded[p * 3 + 2] = values[p];
            } else {
                for c in 0..ncomps {
                    padded[p * 3 + c] = values[p * ncomps + c];
                }
            }
        }
        return Ok(FieldValues {
            values: padded,
            ncomps: 3,
        });
    }
    Ok(FieldValues { values, ncomps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::basis::BSplineBasis;

    fn linear_patch(knots: &[&[f64]], coeffs: Vec<f64>, dim: usize) -> Patch {
        let bases = knots
            .iter()
            .map(|k| BSplineBasis::linear(k).unwrap())
            .collect();
        Patch::new(bases, coeffs, dim, false).unwrap()
    }

    fn unit_square() -> Patch {
        linear_patch(
            &[&[0.0, 1.0], &[0.0, 1.0]],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            2,
        )
    }

    #[test]
    fn single_quad_fixture() {
        // 2x2 samples, identity coefficients: four corner nodes and one
        // quad wound [0, 1, 3, 2] under first-direction-fastest indexing.
        let p = unit_square();
        let t = tesselate(&p, &p.knots(), None).unwrap();
        assert_eq!(
            t.nodes,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ]
        );
        assert_eq!(t.elements.num_cells(), 1);
        assert_eq!(t.elements.indices(), &[0, 1, 3, 2]);
        assert!(t.field.is_none());
    }

    #[test]
    fn element_count_law_2d() {
        let p = linear_patch(
            &[&[0.0, 0.5, 1.0], &[0.0, 1.0, 2.0, 3.0]],
            {
                let mut c = Vec::new();
                for y in [0.0, 1.0, 2.0, 3.0] {
                    for x in [0.0, 0.5, 1.0] {
                        c.extend_from_slice(&[x, y]);
                    }
                }
                c
            },
            2,
        );
        let t = tesselate(&p, &p.knots(), None).unwrap();
        assert_eq!(t.nodes.len(), 3 * 4);
        assert_eq!(t.elements.num_cells(), (3 - 1) * (4 - 1));
    }

    #[test]
    fn hex_connectivity_shares_winding() {
        let mut coeffs = Vec::new();
        for z in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for x in [0.0, 1.0] {
                    coeffs.extend_from_slice(&[x, y, z]);
                }
            }
        }
        let p = linear_patch(
            &[&[0.0, 1.0], &[0.0, 1.0], &[0.0, 1.0]],
            coeffs,
            3,
        );
        let t = tesselate(&p, &p.knots(), None).unwrap();
        assert_eq!(t.elements.num_cells(), 1);
        assert_eq!(t.elements.indices(), &[0, 1, 3, 2, 4, 5, 7, 6]);
    }

    #[test]
    fn line_elements_are_consecutive_pairs() {
        let p = linear_patch(&[&[0.0, 1.0, 2.0]], vec![0.0, 1.0, 2.0], 1);
        let t = tesselate(&p, &p.knots(), None).unwrap();
        assert_eq!(t.elements.indices(), &[0, 1, 1, 2]);
    }

    #[test]
    fn point_field_values_per_node() {
        let p = unit_square();
        let spec = FieldSpec {
            coeffs: &[1.0, 2.0, 3.0, 4.0],
            as_cells: false,
            vectorize: false,
        };
        let t = tesselate(&p, &p.knots(), Some(spec)).unwrap();
        let f = t.field.unwrap();
        assert_eq!(f.ncomps, 1);
        assert_eq!(f.values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn cell_field_values_per_element() {
        let p = linear_patch(
            &[&[0.0, 0.5, 1.0], &[0.0, 1.0, 2.0]],
            {
                let mut c = Vec::new();
                for y in [0.0, 1.0, 2.0] {
                    for x in [0.0, 0.5, 1.0] {
                        c.extend_from_slice(&[x, y]);
                    }
                }
                c
            },
            2,
        );
        // One value per knot span: 2 x 2 cells.
        let spec = FieldSpec {
            coeffs: &[10.0, 20.0, 30.0, 40.0],
            as_cells: true,
            vectorize: false,
        };
        let t = tesselate(&p, &p.knots(), Some(spec)).unwrap();
        let f = t.field.unwrap();
        assert_eq!(f.len(), t.elements.num_cells());
        assert_eq!(f.values, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn two_component_field_zero_padded_to_three_channels() {
        let p = unit_square();
        // Planar vector field (x, -x), component index fastest.
        let spec = FieldSpec {
            coeffs: &[0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, -1.0],
            as_cells: false,
            vectorize: false,
        };
        let t = tesselate(&p, &p.knots(), Some(spec)).unwrap();
        let f = t.field.unwrap();
        assert_eq!(f.ncomps, 3);
        assert_eq!(f.values.len(), 4 * 3);
        assert_eq!(
            f.values,
            vec![
                0.0, 0.0, 0.0, //
                1.0, -1.0, 0.0,
                0.0, 0.0, 0.0,
                1.0, -1.0, 0.0,
            ]
        );
    }

    #[test]
    fn vectorized_scalar_lands_in_last_channel() {
        let p = linear_patch(&[&[0.0, 1.0]], vec![0.0, 1.0], 1);
        let spec = FieldSpec {
            coeffs: &[5.0, 7.0],
            as_cells: false,
            vectorize: true,
        };
        let t = tesselate(&p, &p.knots(), Some(spec)).unwrap();
        let f = t.field.unwrap();
        assert_eq!(f.ncomps, 3);
        assert_eq!(f.values, vec![0.0, 0.0, 5.0, 0.0, 0.0, 7.0]);
    }

    #[test]
    fn field_shape_mismatch_is_fatal() {
        let p = unit_square();
        let spec = FieldSpec {
            coeffs: &[1.0, 2.0, 3.0],
            as_cells: false,
            vectorize: false,
        };
        let err = tesselate(&p, &p.knots(), Some(spec)).unwrap_err();
        assert!(matches!(err, MeshTesselateError::ShapeMismatch { .. }));
    }

    #[test]
    fn degenerate_schedule_rejected() {
        let p = unit_square();
        let err = tesselate(&p, &[vec![0.0], vec![0.0, 1.0]], None).unwrap_err();
        assert!(matches!(err, MeshTesselateError::InvalidShape(_)));
    }

    #[test]
    fn component_extraction() {
        let f = FieldValues {
            values: vec![1.0, 10.0, 2.0, 20.0],
            ncomps: 2,
        };
        assert_eq!(f.component(0), vec![1.0, 2.0]);
        assert_eq!(f.component(1), vec![10.0, 20.0]);
        assert_eq!(f.len(), 2);
    }
}
