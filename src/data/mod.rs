//! Patch data: bases, coefficient containers and the per-run patch cache.

pub mod basis;
pub mod cache;
pub mod patch;

pub use basis::BSplineBasis;
pub use cache::{PatchCache, PatchKey};
pub use patch::Patch;
