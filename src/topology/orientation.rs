//! Orientation of a discovered patch relative to its canonical record.
//!
//! An orientation is a per-direction flip vector plus a permutation of
//! parametric directions. Flips are indexed in canonical direction space
//! and applied before the permutation; `perm[c]` names the discovered
//! direction that canonical direction `c` maps onto.

use crate::mesh_error::MeshTesselateError;

/// Axis flips and direction permutation mapping a canonical record onto a
/// discovered patch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Orientation {
    flip: Vec<bool>,
    perm: Vec<usize>,
}

impl Orientation {
    /// Identity orientation for `pardim` directions.
    pub fn identity(pardim: usize) -> Self {
        Self {
            flip: vec![false; pardim],
            perm: (0..pardim).collect(),
        }
    }

    /// Construct from explicit flips (canonical direction space) and a
    /// canonical-to-discovered permutation.
    ///
    /// # Errors
    /// `TopologyUnresolvable` if the lengths disagree or `perm` is not a
    /// permutation of `0..pardim`.
    pub fn new(flip: Vec<bool>, perm: Vec<usize>) -> Result<Self, MeshTesselateError> {
        if flip.len() != perm.len() {
            return Err(MeshTesselateError::TopologyUnresolvable(format!(
                "flip vector of length {} against permutation of length {}",
                flip.len(),
                perm.len()
            )));
        }
        let mut seen = vec![false; perm.len()];
        for &q in &perm {
            if q >= perm.len() || seen[q] {
                return Err(MeshTesselateError::TopologyUnresolvable(format!(
                    "invalid direction permutation {perm:?}"
                )));
            }
            seen[q] = true;
        }
        Ok(Self { flip, perm })
    }

    /// Number of parametric directions.
    #[inline]
    pub fn pardim(&self) -> usize {
        self.perm.len()
    }

    /// Per-direction flip flags, indexed by canonical direction.
    #[inline]
    pub fn flip(&self) -> &[bool] {
        &self.flip
    }

    /// Permutation mapping canonical direction to discovered direction.
    #[inline]
    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    /// Whether this orientation leaves the parametrization unchanged.
    pub fn is_identity(&self) -> bool {
        !self.flip.iter().any(|&f| f) && self.perm.iter().enumerate().all(|(c, &q)| c == q)
    }

    /// Inverse permutation: discovered direction to canonical direction.
    pub fn perm_inv(&self) -> Vec<usize> {
        let mut inv = vec![0usize; self.perm.len()];
        for (c, &q) in self.perm.iter().enumerate() {
            inv[q] = c;
        }
        inv
    }

    /// Reorder a canonical tesselation schedule to match the discovered
    /// patch: flipped directions get their sample values mirrored about the
    /// direction's span (`u -> lo + hi - u`) and the order reversed, so the
    /// result is ascending in the discovered parametrization; then the
    /// directions are permuted so that slot `q` carries canonical direction
    /// `perm_inv(q)`.
    pub fn apply(&self, schedule: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let mut flipped: Vec<Vec<f64>> = schedule.to_vec();
        for (c, &f) in self.flip.iter().enumerate() {
            if f {
                let dir = &mut flipped[c];
                if let (Some(&lo), Some(&hi)) = (dir.first(), dir.last()) {
                    for v in dir.iter_mut() {
                        *v = lo + hi - *v;
                    }
                }
                dir.reverse();
            }
        }
        self.perm_inv()
            .iter()
            .map(|&c| flipped[c].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_roundtrip() {
        let o = Orientation::identity(2);
        assert!(o.is_identity());
        let sched = vec![vec![0.0, 1.0], vec![0.0, 0.5, 1.0]];
        assert_eq!(o.apply(&sched), sched);
    }

    #[test]
    fn flip_mirrors_samples_about_the_span() {
        let o = Orientation::new(vec![true], vec![0]).unwrap();
        // u -> 1 - u, kept ascending: an interior sample moves to the
        // mirrored position.
        assert_eq!(o.apply(&[vec![0.0, 0.25, 1.0]]), vec![vec![0.0, 0.75, 1.0]]);
        // A symmetric span reproduces itself.
        assert_eq!(o.apply(&[vec![0.0, 1.0, 2.0]]), vec![vec![0.0, 1.0, 2.0]]);
    }

    #[test]
    fn permutation_reorders_directions() {
        // Canonical direction 0 maps to discovered direction 1.
        let o = Orientation::new(vec![false, false], vec![1, 0]).unwrap();
        let sched = vec![vec![0.0, 1.0], vec![0.0, 0.5, 1.0]];
        let applied = o.apply(&sched);
        assert_eq!(applied[0], vec![0.0, 0.5, 1.0]);
        assert_eq!(applied[1], vec![0.0, 1.0]);
    }

    #[test]
    fn flip_indexed_in_canonical_space() {
        // Flip canonical direction 0, which lands in discovered slot 1.
        let o = Orientation::new(vec![true, false], vec![1, 0]).unwrap();
        let sched = vec![vec![0.0, 0.25, 1.0], vec![0.0, 1.0]];
        let applied = o.apply(&sched);
        assert_eq!(applied[0], vec![0.0, 1.0]);
        assert_eq!(applied[1], vec![0.0, 0.75, 1.0]);
    }

    #[test]
    fn malformed_permutation_rejected() {
        assert!(Orientation::new(vec![false, false], vec![0, 0]).is_err());
        assert!(Orientation::new(vec![false], vec![1]).is_err());
        assert!(Orientation::new(vec![false, false], vec![0]).is_err());
    }
}
