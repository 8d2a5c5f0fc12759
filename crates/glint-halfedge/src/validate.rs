//! Connectivity invariant verification.
//!
//! Surrounding tooling runs [`HalfedgeMesh::validate`] after every edit
//! and rejects the edit if it fails. The checks run on the pre-sweep
//! view: entities marked erased are treated as absent, so an operation
//! may be validated before its remnants are physically reclaimed.

use crate::mesh::{EdgeId, FaceId, HalfedgeId, HalfedgeMesh, VertexId, MAX_LOOP_ITERATIONS};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// A specific broken invariant, naming the failing entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    /// A mesh must keep at least one vertex.
    #[error("mesh has no vertices")]
    Empty,
    /// An entity references a handle that is erased or never existed.
    #[error("{from} references a dead {what} handle")]
    Dangling {
        /// Description of the referencing entity.
        from: String,
        /// Kind of the dead referent.
        what: &'static str,
    },
    /// `h.twin.twin != h`, or a half-edge is its own twin.
    #[error("half-edge {0:?} twin pairing is broken")]
    TwinPairing(HalfedgeId),
    /// `h.edge != h.twin.edge`.
    #[error("half-edge {0:?} and its twin disagree on their edge")]
    EdgeMismatch(HalfedgeId),
    /// `h.twin.vertex != h.next.vertex`.
    #[error("half-edge {0:?} target disagrees with its successor's source")]
    TargetMismatch(HalfedgeId),
    /// A face's `next` ring fails to close or leaves the face.
    #[error("face {0:?} ring does not close on itself")]
    RingBroken(FaceId),
    /// A half-edge belongs to no face ring.
    #[error("half-edge {0:?} is unreachable from its face")]
    Orphaned(HalfedgeId),
    /// An edge does not have exactly two half-edges.
    #[error("edge {0:?} does not have exactly two half-edges")]
    EdgeSides(EdgeId),
    /// A vertex's outgoing orbit fails to close or leaves the vertex.
    #[error("vertex {0:?} orbit is broken")]
    OrbitBroken(VertexId),
    /// Two boundary faces share an edge.
    #[error("edge {0:?} has boundary faces on both sides")]
    HoleTouchesHole(EdgeId),
    /// Two distinct edges with the same endpoints bound the same face.
    #[error("face {0:?} is bounded by two parallel edges")]
    DoubledEdge(FaceId),
}

impl HalfedgeMesh {
    /// Re-verify every connectivity invariant, plus the export rules:
    /// the mesh is non-empty, every referenced handle resolves, and no
    /// two boundary faces touch.
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.n_vertices() == 0 {
            return Err(ValidateError::Empty);
        }

        // Per-half-edge local invariants.
        for h in self.halfedge_ids() {
            let he = &self[h];
            if !self.halfedge_live(he.twin) {
                return Err(dangling(format!("half-edge {h:?}"), "twin"));
            }
            if !self.halfedge_live(he.next) {
                return Err(dangling(format!("half-edge {h:?}"), "next"));
            }
            if !self.vertex_live(he.vertex) {
                return Err(dangling(format!("half-edge {h:?}"), "vertex"));
            }
            if !self.edge_live(he.edge) {
                return Err(dangling(format!("half-edge {h:?}"), "edge"));
            }
            if !self.face_live(he.face) {
                return Err(dangling(format!("half-edge {h:?}"), "face"));
            }
            if he.twin == h || self[he.twin].twin != h {
                return Err(ValidateError::TwinPairing(h));
            }
            if self[he.twin].edge != he.edge {
                return Err(ValidateError::EdgeMismatch(h));
            }
            if self[he.twin].vertex != self[he.next].vertex {
                return Err(ValidateError::TargetMismatch(h));
            }
        }

        // Face rings: close, stay on the face, and jointly cover every
        // half-edge exactly once.
        let mut seen_in_ring: HashSet<HalfedgeId> = HashSet::new();
        for f in self.face_ids() {
            let start = self[f].halfedge;
            if !self.halfedge_live(start) {
                return Err(dangling(format!("face {f:?}"), "halfedge"));
            }
            let mut h = start;
            let mut closed = false;
            let mut pairs: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();
            for _ in 0..MAX_LOOP_ITERATIONS {
                if self[h].face != f || !seen_in_ring.insert(h) {
                    return Err(ValidateError::RingBroken(f));
                }
                let (a, b) = self.endpoints(self[h].edge);
                let key = if a < b { (a, b) } else { (b, a) };
                if let Some(prev) = pairs.insert(key, self[h].edge) {
                    if prev != self[h].edge {
                        return Err(ValidateError::DoubledEdge(f));
                    }
                }
                h = self[h].next;
                if h == start {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(ValidateError::RingBroken(f));
            }
        }
        if let Some(h) = self.halfedge_ids().find(|h| !seen_in_ring.contains(h)) {
            return Err(ValidateError::Orphaned(h));
        }

        // Edges: exactly two half-edges, stored half-edge consistent.
        let mut sides: HashMap<EdgeId, usize> = HashMap::new();
        for h in self.halfedge_ids() {
            *sides.entry(self[h].edge).or_insert(0) += 1;
        }
        for e in self.edge_ids() {
            let h = self[e].halfedge;
            if !self.halfedge_live(h) {
                return Err(dangling(format!("edge {e:?}"), "halfedge"));
            }
            if self[h].edge != e || sides.get(&e) != Some(&2) {
                return Err(ValidateError::EdgeSides(e));
            }
            if self.on_boundary(e) {
                let t = self[h].twin;
                if self[self[h].face].boundary && self[self[t].face].boundary {
                    return Err(ValidateError::HoleTouchesHole(e));
                }
            }
        }

        // Vertex orbits: close, stay on the vertex, and jointly cover
        // every half-edge exactly once.
        let mut seen_in_orbit: HashSet<HalfedgeId> = HashSet::new();
        for v in self.vertices() {
            let start = self[v].halfedge;
            if !self.halfedge_live(start) {
                return Err(dangling(format!("vertex {v:?}"), "halfedge"));
            }
            let mut h = start;
            let mut closed = false;
            for _ in 0..MAX_LOOP_ITERATIONS {
                if self[h].vertex != v || !seen_in_orbit.insert(h) {
                    return Err(ValidateError::OrbitBroken(v));
                }
                h = self[self[h].twin].next;
                if h == start {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(ValidateError::OrbitBroken(v));
            }
        }
        if let Some(h) = self.halfedge_ids().find(|h| !seen_in_orbit.contains(h)) {
            return Err(ValidateError::OrbitBroken(self[h].vertex));
        }

        Ok(())
    }
}

fn dangling(from: String, what: &'static str) -> ValidateError {
    ValidateError::Dangling { from, what }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_math::Point3;

    #[test]
    fn test_cube_validates() {
        HalfedgeMesh::cube(1.0).validate().unwrap();
    }

    #[test]
    fn test_open_mesh_validates() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh =
            HalfedgeMesh::from_polygons(&positions, &[vec![0, 1, 3], vec![1, 2, 3]]).unwrap();
        mesh.validate().unwrap();
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let mesh = HalfedgeMesh::new();
        assert_eq!(mesh.validate(), Err(ValidateError::Empty));
    }

    #[test]
    fn test_broken_twin_detected() {
        let mut mesh = HalfedgeMesh::cube(1.0);
        let h = mesh.halfedge_ids().next().unwrap();
        mesh[h].twin = h;
        assert!(matches!(
            mesh.validate(),
            Err(ValidateError::TwinPairing(_))
        ));
    }

    #[test]
    fn test_broken_next_detected() {
        let mut mesh = HalfedgeMesh::cube(1.0);
        let h = mesh.halfedge_ids().next().unwrap();
        // Short-circuit the ring: h.next = h breaks target matching or
        // the ring walk, depending on which check fires first.
        mesh[h].next = h;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_erased_entities_are_absent() {
        let mut mesh = HalfedgeMesh::cube(1.0);
        // Marking a vertex without rewiring leaves dangling references.
        let v = mesh.vertices().next().unwrap();
        mesh.discard_vertex(v);
        assert!(matches!(
            mesh.validate(),
            Err(ValidateError::Dangling { what: "vertex", .. })
        ));
    }
}
