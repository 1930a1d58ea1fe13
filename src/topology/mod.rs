//! Patch topology: canonical identities, orientation resolution and global
//! patch numbering.

pub mod catalogue;
pub mod manager;
pub mod orientation;

pub use catalogue::{CatalogueNode, NodeId, Signature, TopologyCatalogue};
pub use manager::{Emission, GeometryManager};
pub use orientation::Orientation;
