//! Topology catalogue: canonical identities for re-discovered patches.
//!
//! Patches arrive once per timestep and per source index, often with a
//! reversed or permuted parametrization of geometry seen before. The
//! catalogue keys every patch by its boundary signature (per-direction
//! sample counts, no coordinates), and resolves the orientation of each
//! discovery against the canonical record so repeated geometry keeps one
//! identity across the whole run.
//!
//! Candidate records are scanned in creation order and the lowest-indexed
//! match wins. A match requires the knot structure to align under some
//! flip/permutation and the corner coordinates to agree under the same
//! orientation; corner agreement is what keeps same-topology patches of a
//! multi-patch model apart.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::data::basis::KNOT_EPS;
use crate::data::patch::Patch;
use crate::mesh_error::MeshTesselateError;
use crate::topology::orientation::Orientation;

/// Absolute tolerance for corner coordinate comparison.
const COORD_EPS: f64 = 1e-8;

/// Boundary signature of a patch: the multiset of per-direction sample
/// counts. Topology only; coordinate values never enter the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Signature {
    counts: Vec<usize>,
}

impl Signature {
    /// Signature of a patch's boundary knot structure.
    pub fn of(patch: &Patch) -> Self {
        let mut counts: Vec<usize> = patch.knots().iter().map(|k| k.len()).collect();
        counts.sort_unstable();
        Self { counts }
    }

    /// Number of parametric directions covered by the signature.
    #[inline]
    pub fn pardim(&self) -> usize {
        self.counts.len()
    }
}

/// Handle to a catalogue node, valid for the lifetime of the catalogue.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in discovery order.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Canonical record for one physical geometric entity.
///
/// Created on first discovery of an unseen boundary signature; mutated on
/// every discovery (orientation, global ID); never destroyed during a run.
#[derive(Clone, Debug)]
pub struct CatalogueNode {
    pardim: usize,
    canonical_knots: Vec<Vec<f64>>,
    corners: Vec<[f64; 3]>,
    /// Canonical tesselation schedule; fixed once assigned.
    pub(crate) tesselation: Option<Vec<Vec<f64>>>,
    /// Global patch ID; assigned on first emission, never renumbered.
    pub(crate) patch_id: Option<usize>,
    /// Timestep of the last geometry emission. Written only by the
    /// geometry manager.
    pub(crate) last_emitted_step: Option<usize>,
    /// Orientation resolved for the most recent discovery.
    pub(crate) orientation: Orientation,
}

impl CatalogueNode {
    fn from_patch(patch: &Patch) -> Self {
        Self {
            pardim: patch.pardim(),
            canonical_knots: patch.knots(),
            corners: patch.corners(),
            tesselation: None,
            patch_id: None,
            last_emitted_step: None,
            orientation: Orientation::identity(patch.pardim()),
        }
    }

    /// Parametric dimension of the canonical patch.
    #[inline]
    pub fn pardim(&self) -> usize {
        self.pardim
    }

    /// Unique knot values per canonical direction.
    #[inline]
    pub fn canonical_knots(&self) -> &[Vec<f64>] {
        &self.canonical_knots
    }

    /// Canonical tesselation schedule, once assigned.
    #[inline]
    pub fn tesselation(&self) -> Option<&[Vec<f64>]> {
        self.tesselation.as_deref()
    }

    /// Global patch ID, once assigned.
    #[inline]
    pub fn patch_id(&self) -> Option<usize> {
        self.patch_id
    }

    /// Timestep of the last geometry emission.
    #[inline]
    pub fn last_emitted_step(&self) -> Option<usize> {
        self.last_emitted_step
    }

    /// Orientation resolved for the most recent discovery.
    #[inline]
    pub fn orientation(&self) -> &Orientation {
        &self.orientation
    }
}

/// Registry mapping boundary signatures to canonical node records.
#[derive(Clone, Debug)]
pub struct TopologyCatalogue {
    pardim: usize,
    nodes: Vec<CatalogueNode>,
    by_signature: HashMap<Signature, Vec<usize>>,
}

impl TopologyCatalogue {
    /// Create a catalogue for patches of parametric dimension up to
    /// `pardim`.
    pub fn new(pardim: usize) -> Self {
        Self {
            pardim,
            nodes: Vec::new(),
            by_signature: HashMap::new(),
        }
    }

    /// Number of canonical records discovered so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no patches have been catalogued yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Shared access to a node record.
    #[inline]
    pub fn node(&self, id: NodeId) -> &CatalogueNode {
        &self.nodes[id.0]
    }

    /// Mutable access for the geometry manager.
    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut CatalogueNode {
        &mut self.nodes[id.0]
    }

    /// Iterate over node handles in discovery order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Resolve `patch` against the catalogue, creating a new canonical
    /// record when no existing one matches.
    ///
    /// The returned orientation maps the canonical record onto the
    /// discovered patch; it is also stored on the node.
    ///
    /// # Errors
    /// `TopologyUnresolvable` if the patch's direction count exceeds the
    /// catalogue's parametric dimension.
    pub fn lookup_or_create(
        &mut self,
        patch: &Patch,
    ) -> Result<(NodeId, Orientation), MeshTesselateError> {
        self.check_pardim(patch)?;
        if let Some((id, orientation)) = self.resolve_existing(patch) {
            self.nodes[id.0].orientation = orientation.clone();
            return Ok((id, orientation));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(CatalogueNode::from_patch(patch));
        self.by_signature
            .entry(Signature::of(patch))
            .or_default()
            .push(id.0);
        Ok((id, Orientation::identity(patch.pardim())))
    }

    /// Resolve `patch` against the catalogue without creating records.
    ///
    /// Field updates use this path: the geometry must already have been
    /// catalogued.
    ///
    /// # Errors
    /// `TopologyUnresolvable` if the patch is unknown or its direction
    /// count conflicts with the catalogue.
    pub fn lookup(&self, patch: &Patch) -> Result<(NodeId, Orientation), MeshTesselateError> {
        self.check_pardim(patch)?;
        self.resolve_existing(patch).ok_or_else(|| {
            MeshTesselateError::TopologyUnresolvable(format!(
                "no catalogued record matches a {}-directional patch with signature {:?}",
                patch.pardim(),
                Signature::of(patch)
            ))
        })
    }

    fn check_pardim(&self, patch: &Patch) -> Result<(), MeshTesselateError> {
        if patch.pardim() > self.pardim {
            return Err(MeshTesselateError::TopologyUnresolvable(format!(
                "patch has {} directions but the catalogue holds at most {}",
                patch.pardim(),
                self.pardim
            )));
        }
        Ok(())
    }

    fn resolve_existing(&self, patch: &Patch) -> Option<(NodeId, Orientation)> {
        let sig = Signature::of(patch);
        let knots = patch.knots();
        let corners = patch.corners();
        let candidates = self.by_signature.get(&sig)?;
        for &i in candidates {
            if let Some(orientation) = self.resolve(&self.nodes[i], &knots, &corners) {
                return Some((NodeId(i), orientation));
            }
        }
        None
    }

    /// Find the orientation mapping `node`'s canonical directions onto the
    /// discovered knot vectors, or `None` if the structures cannot be
    /// aligned.
    fn resolve(
        &self,
        node: &CatalogueNode,
        knots: &[Vec<f64>],
        corners: &[[f64; 3]],
    ) -> Option<Orientation> {
        let d = node.pardim;
        if knots.len() != d {
            return None;
        }
        // Enumerate direction permutations lexicographically and flip sets
        // with unflipped directions first, so resolution is deterministic
        // for repeated identical input. Knot structure narrows the
        // candidates; corner coordinates must agree as well, so patches
        // that merely share a topology keep separate identities.
        for perm in (0..d).permutations(d) {
            if (0..d).any(|c| node.canonical_knots[c].len() != knots[perm[c]].len()) {
                continue;
            }
            for flags in 0..(1usize << d) {
                let flip: Vec<bool> = (0..d).map(|c| flags >> c & 1 == 1).collect();
                let aligned = (0..d)
                    .all(|c| knots_match(&node.canonical_knots[c], &knots[perm[c]], flip[c]));
                if !aligned {
                    continue;
                }
                let Ok(orientation) = Orientation::new(flip, perm.clone()) else {
                    continue;
                };
                if corners_match(&node.corners, corners, &orientation) {
                    return Some(orientation);
                }
            }
        }
        None
    }
}

/// Compare a canonical sample vector against a discovered one, either
/// directly or mirrored about the canonical domain.
fn knots_match(canonical: &[f64], discovered: &[f64], flipped: bool) -> bool {
    if canonical.len() != discovered.len() {
        return false;
    }
    if !flipped {
        return canonical
            .iter()
            .zip(discovered)
            .all(|(a, b)| (a - b).abs() < KNOT_EPS);
    }
    let lo = canonical[0];
    let hi = canonical[canonical.len() - 1];
    canonical
        .iter()
        .rev()
        .zip(discovered)
        .all(|(a, b)| (lo + hi - a - b).abs() < KNOT_EPS)
}

/// Check that the discovered corner coordinates agree with the canonical
/// ones under the candidate orientation.
fn corners_match(canonical: &[[f64; 3]], discovered: &[[f64; 3]], o: &Orientation) -> bool {
    let d = o.pardim();
    if canonical.len() != 1 << d || discovered.len() != 1 << d {
        return false;
    }
    for bc in 0..(1usize << d) {
        let mut bd = 0usize;
        for c in 0..d {
            let end = (bc >> c & 1 == 1) != o.flip()[c];
            if end {
                bd |= 1 << o.perm()[c];
            }
        }
        let a = canonical[bc];
        let b = discovered[bd];
        if (0..3).any(|k| (a[k] - b[k]).abs() > COORD_EPS) {
            return false;
        }
    }
    true
}
