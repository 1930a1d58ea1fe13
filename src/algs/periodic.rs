//! Periodic stitching: close a wrap-around structured grid into a seamless
//! unstructured mesh, optionally collapsing the polar boundary rows onto
//! synthetic pole nodes.
//!
//! Axis convention (fixed): direction 0 runs pole to pole, direction 1 is
//! the wrap-around direction, direction 2 (volumetric grids) indexes
//! vertical layers. Node indices follow the crate-wide first-direction-
//! fastest flattening; when poles are present on a volumetric grid, every
//! layer reserves two trailing pole slots, so regular indices are offset by
//! `layer * 2`.
//!
//! The pole caps are intentionally degenerate cells: every quad/hexahedron
//! in a cap aliases two or more corners to the same pole index, which
//! visualization tools render as triangular or pyramidal caps.

use crate::algs::tesselate::{structured_cells, Elements};
use crate::mesh_error::MeshTesselateError;

/// Builder for globally periodic structured meshes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodicMeshBuilder {
    shape: Vec<usize>,
    has_poles: bool,
}

impl PeriodicMeshBuilder {
    /// Create a builder for a grid with `shape` nodes per direction.
    ///
    /// `shape` must name 2 or 3 directions (planar or volumetric) with at
    /// least 2 nodes each.
    ///
    /// # Errors
    /// `InvalidShape` otherwise.
    pub fn new(shape: &[usize], has_poles: bool) -> Result<Self, MeshTesselateError> {
        if shape.len() < 2 || shape.len() > 3 {
            return Err(MeshTesselateError::InvalidShape(format!(
                "periodic stitching supports 2 or 3 directions, got {}",
                shape.len()
            )));
        }
        if let Some(&n) = shape.iter().find(|&&n| n < 2) {
            return Err(MeshTesselateError::InvalidShape(format!(
                "periodic extent {n} is below the minimum of 2"
            )));
        }
        Ok(Self {
            shape: shape.to_vec(),
            has_poles,
        })
    }

    /// Parametric dimension of the produced cells.
    #[inline]
    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    /// Nodes in the regular structured block, poles excluded.
    #[inline]
    pub fn num_regular_nodes(&self) -> usize {
        self.shape.iter().product()
    }

    /// Pole nodes appended after the regular block: two per vertical layer
    /// for volumetric grids, two total for planar ones, zero without poles.
    pub fn num_pole_nodes(&self) -> usize {
        if !self.has_poles {
            0
        } else if self.dim() == 3 {
            2 * self.shape[2]
        } else {
            2
        }
    }

    /// Total node count the produced connectivity addresses.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_regular_nodes() + self.num_pole_nodes()
    }

    /// Build the stitched connectivity: the interior block, the seam block
    /// closing the wrap direction, and (with poles) one cap block per pole.
    pub fn build(&self) -> Result<Elements, MeshTesselateError> {
        match *self.shape.as_slice() {
            [n0, n1] => self.build_planar(n0, n1),
            [n0, n1, nv] => self.build_volumetric(n0, n1, nv),
            _ => unreachable!("validated in new"),
        }
    }

    fn build_planar(&self, n0: usize, n1: usize) -> Result<Elements, MeshTesselateError> {
        let r = |i: usize, j: usize| i + j * n0;
        let mut cells = structured_cells(&[n0, n1])?;

        // Seam: join the last wrap column back to column zero.
        for i in 0..n0 - 1 {
            cells.push_cell(&[r(i, n1 - 1), r(i + 1, n1 - 1), r(i + 1, 0), r(i, 0)]);
        }

        if self.has_poles {
            let south = n0 * n1;
            let north = south + 1;
            for j in 0..n1 {
                let jn = (j + 1) % n1;
                cells.push_cell(&[r(0, j), south, south, r(0, jn)]);
            }
            for j in 0..n1 {
                let jn = (j + 1) % n1;
                cells.push_cell(&[north, r(n0 - 1, j), r(n0 - 1, jn), north]);
            }
        }
        Ok(cells)
    }

    fn build_volumetric(
        &self,
        n0: usize,
        n1: usize,
        nv: usize,
    ) -> Result<Elements, MeshTesselateError> {
        let planar = n0 * n1;
        // Per-layer stride includes the two reserved pole slots.
        let layer = planar + if self.has_poles { 2 } else { 0 };
        let r = |i: usize, j: usize, k: usize| i + j * n0 + k * layer;

        let mut cells = structured_cells(&[n0, n1, nv])?;
        if self.has_poles {
            // Skip the two pole slots of every layer below a given index.
            cells.map_indices(|idx| idx + idx / planar * 2);
        }

        for k in 0..nv - 1 {
            for i in 0..n0 - 1 {
                cells.push_cell(&[
                    r(i, n1 - 1, k),
                    r(i + 1, n1 - 1, k),
                    r(i + 1, 0, k),
                    r(i, 0, k),
                    r(i, n1 - 1, k + 1),
                    r(i + 1, n1 - 1, k + 1),
                    r(i + 1, 0, k + 1),
                    r(i, 0, k + 1),
                ]);
            }
        }

        if self.has_poles {
            let south = |k: usize| k * layer + planar;
            let north = |k: usize| k * layer + planar + 1;
            for k in 0..nv - 1 {
                for j in 0..n1 {
                    let jn = (j + 1) % n1;
                    cells.push_cell(&[
                        r(0, j, k),
                        south(k),
                        south(k),
                        r(0, jn, k),
                        r(0, j, k + 1),
                        south(k + 1),
                        south(k + 1),
                        r(0, jn, k + 1),
                    ]);
                }
            }
            for k in 0..nv - 1 {
                for j in 0..n1 {
                    let jn = (j + 1) % n1;
                    cells.push_cell(&[
                        north(k),
                        r(n0 - 1, j, k),
                        r(n0 - 1, jn, k),
                        north(k),
                        north(k + 1),
                        r(n0 - 1, j, k + 1),
                        r(n0 - 1, jn, k + 1),
                        north(k + 1),
                    ]);
                }
            }
        }
        Ok(cells)
    }
}
