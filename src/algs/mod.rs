//! Discretization algorithms: structured tesselation and periodic
//! stitching.

pub mod periodic;
pub mod tesselate;

pub use periodic::PeriodicMeshBuilder;
pub use tesselate::{structured_cells, tesselate, Elements, FieldSpec, FieldValues, Tesselation};
