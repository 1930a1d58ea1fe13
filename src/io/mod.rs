//! Interface boundary with the excluded reader and writer layers.
//!
//! The engine owns no on-disk format: sources hand in patches and
//! coefficient arrays, sinks receive flattened node/element arrays and
//! global patch IDs. The writer-side call ordering is enforced by
//! [`protocol::Protocol`].

pub mod protocol;
pub mod sink;
pub mod source;

pub use protocol::{Protocol, WriterState};
pub use sink::{Sink, ValueKind};
pub use source::Source;

/// Scalar metadata attached to one output step.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StepMeta {
    /// Physical time of a timestep.
    Time(f64),
    /// Eigenvalue of an eigenmode step.
    Value(f64),
    /// Eigenfrequency of an eigenmode step.
    Frequency(f64),
}

/// How a field samples its patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FieldKind {
    /// One value per node.
    Point,
    /// One value per cell (piecewise constant).
    Cell,
    /// Mode shape: per-node, promoted to a displacement vector.
    Eigenmode,
}

/// Metadata for one field exposed by a source.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldInfo {
    pub name: String,
    /// Name of the basis the field's coefficients live on.
    pub basis: String,
    pub ncomps: usize,
    pub kind: FieldKind,
}

/// Metadata for one basis exposed by a source.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BasisInfo {
    pub name: String,
    /// Steps at which the basis geometry is updated, ascending.
    pub updates: Vec<usize>,
}

impl BasisInfo {
    /// Resolve the geometry level for `step`: the greatest update at or
    /// before it.
    ///
    /// # Errors
    /// `NoGeometryAtStep` if the basis has no update at or before `step`.
    pub fn level_at(&self, step: usize) -> Result<usize, crate::mesh_error::MeshTesselateError> {
        self.updates
            .iter()
            .rev()
            .copied()
            .find(|&u| u <= step)
            .ok_or_else(|| crate::mesh_error::MeshTesselateError::NoGeometryAtStep {
                step,
                basis: self.name.clone(),
            })
    }
}
