//! `MeshTesselateError`: unified error type for the public API.
//!
//! Every failure aborts the current conversion run; there is no partial
//! success. Variants carry enough context (step, basis, patch index) to
//! diagnose the offending read without re-running.

use thiserror::Error;

/// Unified error type for tesselation and consolidation operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshTesselateError {
    /// Coefficient array size disagrees with the product of basis sizes
    /// times the component count.
    #[error("coefficient shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// Malformed structured extents passed to the periodic mesh builder
    /// or to structured cell construction.
    #[error("invalid structured shape: {0}")]
    InvalidShape(String),

    /// Writer-protocol ordering violated. Indicates a caller bug; never
    /// retried.
    #[error("writer protocol violation: {0}")]
    ProtocolViolation(String),

    /// A discovered patch cannot be matched against or registered in the
    /// topology catalogue.
    #[error("topology unresolvable: {0}")]
    TopologyUnresolvable(String),

    /// No geometry update exists at or before the requested timestep for
    /// the named basis.
    #[error("no geometry for basis `{basis}` at or before step {step}")]
    NoGeometryAtStep { step: usize, basis: String },

    /// Patch construction rejected: basis layout and coefficient data
    /// disagree, or the embedding dimension is out of range.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// Failure reported by a source or sink collaborator.
    #[error("source/sink error: {0}")]
    External(String),
}
