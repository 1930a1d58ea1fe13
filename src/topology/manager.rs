//! Global patch numbering and re-emission control.
//!
//! The manager owns the topology catalogue and is the only component that
//! writes `last_emitted_step`. Global IDs are handed out in first-discovery
//! order starting at 0 and never reused or renumbered; downstream writers
//! correlate field updates against these IDs.

use log::debug;

use crate::algs::tesselate::{tesselate, Elements};
use crate::data::patch::Patch;
use crate::mesh_error::MeshTesselateError;
use crate::topology::catalogue::{NodeId, TopologyCatalogue};

/// Outcome of [`GeometryManager::maybe_emit`].
#[derive(Clone, Debug, PartialEq)]
pub enum Emission {
    /// Geometry downstream is already current; only the stable global ID is
    /// returned for correlation.
    Current { id: usize },
    /// Geometry was (re-)tesselated and must be forwarded to the sink.
    Emitted {
        id: usize,
        nodes: Vec<[f64; 3]>,
        elements: Elements,
    },
}

impl Emission {
    /// The stable global patch ID, regardless of whether geometry was
    /// emitted.
    pub fn id(&self) -> usize {
        match self {
            Emission::Current { id } | Emission::Emitted { id, .. } => *id,
        }
    }
}

/// Owner of global patch numbering and per-node emission state.
#[derive(Clone, Debug)]
pub struct GeometryManager {
    catalogue: TopologyCatalogue,
    next_id: usize,
}

impl GeometryManager {
    /// Create a manager cataloguing patches of parametric dimension up to
    /// `pardim`.
    pub fn new(pardim: usize) -> Self {
        Self {
            catalogue: TopologyCatalogue::new(pardim),
            next_id: 0,
        }
    }

    /// Read access to the underlying catalogue.
    #[inline]
    pub fn catalogue(&self) -> &TopologyCatalogue {
        &self.catalogue
    }

    /// Number of global IDs assigned so far.
    #[inline]
    pub fn assigned(&self) -> usize {
        self.next_id
    }

    /// Resolve the patch and return its stable global ID, assigning the
    /// next free ID on first discovery.
    pub fn global_id(&mut self, patch: &Patch) -> Result<usize, MeshTesselateError> {
        let (node, _) = self.catalogue.lookup_or_create(patch)?;
        Ok(self.assign_id(node))
    }

    /// Resolve the patch at `step` and tesselate it unless the node's
    /// geometry is already current downstream.
    ///
    /// The canonical tesselation schedule is derived from the canonical
    /// knots the first time the node is emitted and reused afterwards; the
    /// resolved orientation reorders it to match the discovered patch.
    pub fn maybe_emit(
        &mut self,
        patch: &Patch,
        step: usize,
    ) -> Result<Emission, MeshTesselateError> {
        let (node_id, orientation) = self.catalogue.lookup_or_create(patch)?;
        let id = self.assign_id(node_id);

        let node = self.catalogue.node(node_id);
        if node.last_emitted_step().is_some_and(|last| last >= step) {
            debug!("skipping patch {id}: geometry current at step {step}");
            return Ok(Emission::Current { id });
        }

        let canonical = match node.tesselation() {
            Some(t) => t.to_vec(),
            None => {
                let t = node.canonical_knots().to_vec();
                self.catalogue.node_mut(node_id).tesselation = Some(t.clone());
                t
            }
        };
        let schedule = orientation.apply(&canonical);

        let mesh = tesselate(patch, &schedule, None)?;
        self.catalogue.node_mut(node_id).last_emitted_step = Some(step);
        debug!(
            "emitting patch {id} at step {step}: {} nodes, {} cells",
            mesh.nodes.len(),
            mesh.elements.num_cells()
        );
        Ok(Emission::Emitted {
            id,
            nodes: mesh.nodes,
            elements: mesh.elements,
        })
    }

    /// Resolve the schedule a field evaluation must use for `patch`:
    /// the node's canonical schedule reoriented onto this discovery.
    ///
    /// # Errors
    /// `TopologyUnresolvable` if the patch was never catalogued;
    /// `ProtocolViolation` if its geometry was never emitted (no schedule
    /// or global ID exists yet).
    pub fn field_schedule(
        &self,
        patch: &Patch,
    ) -> Result<(usize, Vec<Vec<f64>>), MeshTesselateError> {
        let (node_id, orientation) = self.catalogue.lookup(patch)?;
        let node = self.catalogue.node(node_id);
        let (Some(id), Some(tess)) = (node.patch_id(), node.tesselation()) else {
            return Err(MeshTesselateError::ProtocolViolation(
                "field update requested before the patch geometry was emitted".into(),
            ));
        };
        Ok((id, orientation.apply(tess)))
    }

    fn assign_id(&mut self, node: NodeId) -> usize {
        if let Some(id) = self.catalogue.node(node).patch_id() {
            return id;
        }
        let id = self.next_id;
        self.catalogue.node_mut(node).patch_id = Some(id);
        self.next_id += 1;
        id
    }
}
