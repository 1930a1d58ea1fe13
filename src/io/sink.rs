//! Sink trait: the writer-side collaborator interface.

use crate::algs::tesselate::Elements;
use crate::mesh_error::MeshTesselateError;
use crate::io::StepMeta;

/// Whether a field update carries scalar or vector data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ValueKind {
    Scalar,
    Vector,
}

/// One mesh/field consumer. Implementations encode the data in their own
/// format; the call ordering they may rely on is guaranteed by
/// [`Protocol`](crate::io::protocol::Protocol).
pub trait Sink {
    /// A new output step was opened. `step` counts from 0 in protocol
    /// order, independent of source timestep numbering.
    fn begin_step(&mut self, step: usize, meta: StepMeta) -> Result<(), MeshTesselateError>;

    /// Geometry for one global patch: flattened nodes and patch-local
    /// connectivity.
    fn geometry(
        &mut self,
        patch_id: usize,
        nodes: &[[f64; 3]],
        elements: &Elements,
    ) -> Result<(), MeshTesselateError>;

    /// All geometry for the current step has been issued.
    fn finalize_geometry(&mut self) -> Result<(), MeshTesselateError> {
        Ok(())
    }

    /// Field values on one global patch, flattened with the component
    /// index fastest. `cells` marks per-cell (piecewise constant) data.
    fn field(
        &mut self,
        name: &str,
        patch_id: usize,
        values: &[f64],
        kind: ValueKind,
        cells: bool,
    ) -> Result<(), MeshTesselateError>;

    /// The current step is complete.
    fn finalize_step(&mut self) -> Result<(), MeshTesselateError> {
        Ok(())
    }
}
