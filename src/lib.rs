//! # mesh-tesselate
//!
//! mesh-tesselate is a Rust library for consolidating parametric (spline)
//! patch geometry into unstructured meshes for post-processing pipelines. It
//! recognizes patches that are the same topological object seen under
//! different parametrizations, assigns them stable global IDs, tesselates
//! them once per geometry update, and evaluates point-, cell- and
//! eigenmode-valued fields on the resulting nodes and cells.
//!
//! ## Features
//! - Tensor-product patch evaluation (B-spline bases of any degree, rational
//!   weights, 1–3 parametric dimensions)
//! - Topology catalogue matching patches up to direction permutation and
//!   reversal, with geometric corner verification
//! - Geometry manager with update-step tracking, so unchanged geometry is
//!   never re-emitted downstream
//! - A writer protocol state machine guarding sink call ordering
//! - Periodic mesh stitching (planar and volumetric wrap-around with
//!   optional pole collapse)
//! - Reader/writer seams as plain traits ([`io::Source`], [`io::Sink`]) so
//!   container formats plug in without touching the engine
//!
//! ## Determinism
//!
//! Conversion is single-threaded and fully deterministic: global patch IDs
//! follow first-discovery order, catalogue candidates are scanned in
//! creation order, and orientation search enumerates permutations and flips
//! in a fixed lexicographic order.
//!
//! ## Usage
//!
//! Implement [`io::Source`] over your container format, pick a
//! [`io::Sink`], and run [`pipeline::convert`]. For finer control, drive
//! [`io::Protocol`] directly.

pub mod algs;
pub mod data;
pub mod io;
pub mod mesh_error;
pub mod pipeline;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::periodic::PeriodicMeshBuilder;
    pub use crate::algs::tesselate::{tesselate, Elements, FieldSpec, FieldValues, Tesselation};
    pub use crate::data::basis::BSplineBasis;
    pub use crate::data::cache::{PatchCache, PatchKey};
    pub use crate::data::patch::Patch;
    pub use crate::io::{
        BasisInfo, FieldInfo, FieldKind, Protocol, Sink, Source, StepMeta, ValueKind, WriterState,
    };
    pub use crate::mesh_error::MeshTesselateError;
    pub use crate::pipeline::convert;
    pub use crate::topology::catalogue::{NodeId, Signature, TopologyCatalogue};
    pub use crate::topology::manager::{Emission, GeometryManager};
    pub use crate::topology::orientation::Orientation;
}
