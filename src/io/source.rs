//! Source trait: the reader-side collaborator interface.

use crate::data::patch::Patch;
use crate::io::{BasisInfo, FieldInfo, StepMeta};
use crate::mesh_error::MeshTesselateError;

/// One simulation data producer.
///
/// Implementations parse a concrete container format; the pipeline only
/// relies on the accessors below. Patch reads must be stable for a given
/// `(step, basis, index)` key: the pipeline memoizes them for the run.
pub trait Source {
    /// Step metadata in output order, one entry per timestep.
    fn steps(&mut self) -> Result<Vec<StepMeta>, MeshTesselateError>;

    /// All bases carrying geometry, with their update steps.
    fn bases(&mut self) -> Result<Vec<BasisInfo>, MeshTesselateError>;

    /// All regular (non-eigenmode) fields.
    fn fields(&mut self) -> Result<Vec<FieldInfo>, MeshTesselateError>;

    /// Names of the fields updated at `step`.
    fn fields_at(&mut self, step: usize) -> Result<Vec<String>, MeshTesselateError>;

    /// Eigenmode fields, at most one per basis. An empty result selects
    /// the timestep flow.
    fn eigenmode_fields(&mut self) -> Result<Vec<FieldInfo>, MeshTesselateError> {
        Ok(Vec::new())
    }

    /// Number of eigenmodes stored for `basis`.
    fn num_modes(&mut self, _basis: &str) -> Result<usize, MeshTesselateError> {
        Ok(0)
    }

    /// Number of patches of `basis` at geometry level `step`.
    fn num_patches(&mut self, step: usize, basis: &str) -> Result<usize, MeshTesselateError>;

    /// Read one patch at a resolved geometry level, promoted to a 3D
    /// embedding.
    fn patch(
        &mut self,
        step: usize,
        basis: &str,
        index: usize,
    ) -> Result<Patch, MeshTesselateError>;

    /// Field coefficients for one patch at one step.
    fn field_coeffs(
        &mut self,
        field: &FieldInfo,
        step: usize,
        index: usize,
    ) -> Result<Vec<f64>, MeshTesselateError>;

    /// Eigenmode coefficients for one patch, with the step tag (eigenvalue
    /// or frequency) attached to the mode.
    fn mode_coeffs(
        &mut self,
        _field: &FieldInfo,
        _mode: usize,
        _index: usize,
    ) -> Result<(Vec<f64>, StepMeta), MeshTesselateError> {
        Err(MeshTesselateError::External(
            "source exposes no eigenmodes".into(),
        ))
    }
}
