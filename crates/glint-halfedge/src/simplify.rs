//! Quadric-error-metric mesh simplification.
//!
//! Classic Garland-Heckbert: accumulate a plane quadric per vertex,
//! rank every edge by the error of its optimal collapse point, and
//! greedily collapse the cheapest edges until the face budget is met.
//! [`edge_collapsable`] gates each collapse so that greedy ordering can
//! never drive the mesh non-manifold.

use crate::mesh::{EdgeId, HalfedgeMesh, VertexId};
use glint_math::{Mat4, Point3, Vec4};
use nalgebra::Matrix3;
use slotmap::Key;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Scale-invariant threshold on `det(A)` below which the quadric
/// system is treated as singular.
const INVERTIBLE_THRESHOLD: f64 = 1e-6;

/// Simplification reduces the non-boundary face count by
/// `(factor - 1) / factor`.
const SIMPLIFICATION_FACTOR: usize = 4;

/// The plane quadric of a face: `n4 * n4^T` for the homogeneous plane
/// `n4 = (n, -n . p)`.
fn face_quadric(mesh: &HalfedgeMesh, f: crate::FaceId) -> Mat4 {
    let n = mesh.face_normal(f);
    let p = mesh[mesh[mesh[f].halfedge].vertex].pos;
    let n4 = Vec4::new(n.x, n.y, n.z, -n.dot(&p.coords));
    n4 * n4.transpose()
}

/// Sum of the quadrics of the non-boundary faces around a vertex.
fn vertex_quadric(
    mesh: &HalfedgeMesh,
    v: VertexId,
    face_quadrics: &HashMap<crate::FaceId, Mat4>,
) -> Mat4 {
    let mut q = Mat4::zeros();
    for h in mesh.vertex_halfedges(v) {
        if let Some(fq) = face_quadrics.get(&mesh[h].face) {
            q += fq;
        }
    }
    q
}

/// Evaluate a quadric at a point in homogeneous coordinates.
fn quadric_error(k: &Mat4, p: &Point3) -> f64 {
    let h = Vec4::new(p.x, p.y, p.z, 1.0);
    h.dot(&(k * h))
}

/// A queued candidate collapse: the optimal placement for the merged
/// vertex and the quadric error it would incur.
#[derive(Debug, Clone, Copy)]
struct EdgeRecord {
    cost: f64,
    edge: EdgeId,
    optimal: Point3,
}

impl EdgeRecord {
    /// Solve for the optimal collapse point of `e` under the combined
    /// endpoint quadric `K`.
    ///
    /// When the 3x3 system `A` is well conditioned (`det(A)` above a
    /// threshold scaled by the cubed edge length) the minimizer is
    /// `-A^-1 b`. Otherwise the error is sampled at both endpoints and
    /// the midpoint, a 1-D quadratic is fit through the three samples,
    /// and its minimizer is clamped to the segment.
    fn new(mesh: &HalfedgeMesh, k: &Mat4, e: EdgeId) -> Self {
        let b = glint_math::Vec3::new(k[(0, 3)], k[(1, 3)], k[(2, 3)]);
        let a: Matrix3<f64> = k.fixed_view::<3, 3>(0, 0).into_owned();
        let well_conditioned = a.determinant() > INVERTIBLE_THRESHOLD * mesh.edge_length(e).powi(3);
        if well_conditioned {
            if let Some(inv) = a.try_inverse() {
                let optimal = Point3::from(-(inv * b));
                return Self {
                    cost: quadric_error(k, &optimal),
                    edge: e,
                    optimal,
                };
            }
        }

        let (v1, v2) = mesh.endpoints(e);
        let p1 = mesh[v1].pos;
        let p2 = mesh[v2].pos;
        let mid = Point3::from((p1.coords + p2.coords) * 0.5);
        let c1 = quadric_error(k, &p1);
        let c2 = quadric_error(k, &p2);
        let cm = quadric_error(k, &mid);
        // c(t) = qa t^2 + qb t + qc through c(0)=c1, c(1/2)=cm, c(1)=c2.
        let qa = 2.0 * (c2 - 2.0 * cm + c1);
        let qb = c2 - c1 - qa;
        let qc = c1;
        let t = if qa.abs() < f64::EPSILON {
            0.5
        } else {
            (-qb / (2.0 * qa)).clamp(0.0, 1.0)
        };
        Self {
            cost: qa * t * t + qb * t + qc,
            edge: e,
            optimal: Point3::from(p1.coords + (p2.coords - p1.coords) * t),
        }
    }
}

// Total order on (cost, edge identity) so records can live in an
// ordered set that supports targeted removal.
impl Ord for EdgeRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.edge.data().as_ffi().cmp(&other.edge.data().as_ffi()))
    }
}

impl PartialOrd for EdgeRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EdgeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EdgeRecord {}

/// Whether collapsing `e` keeps the mesh manifold.
///
/// Rejects: identical endpoints, an incident 2-gon, a doubled edge
/// shared with a neighboring face, and any shared neighbor `v3` of the
/// endpoints that does not close a triangle with them (collapse would
/// pile more than two faces onto the merged `v3` edge), including the
/// configurations where the faces around `v3` would become identical.
pub fn edge_collapsable(mesh: &HalfedgeMesh, e: EdgeId) -> bool {
    let h1 = mesh[e].halfedge;
    let h2 = mesh[h1].twin;
    let v1 = mesh[h1].vertex;
    let v2 = mesh[h2].vertex;
    if v1 == v2 {
        return false;
    }
    let h1n = mesh[h1].next;
    let h2n = mesh[h2].next;
    if mesh[h1n].next == h1 || mesh[h2n].next == h2 {
        return false;
    }
    if mesh[mesh[h1n].twin].next == h2 || mesh[mesh[h2n].twin].next == h1 {
        return false;
    }

    let m1 = mesh.vertex_neighborhood(v1);
    let m2 = mesh.vertex_neighborhood(v2);
    for (&v3, &he_13) in &m1 {
        let Some(&he_23) = m2.get(&v3) else { continue };
        // v1, v2, v3 must already close a triangle on one side of e.
        let tri_123 = mesh[mesh[he_13].twin].next == h1 && mesh[h1].next == he_23;
        let tri_321 = mesh[mesh[he_23].twin].next == h2 && mesh[h2].next == he_13;
        if !tri_123 && !tri_321 {
            return false;
        }
        // The faces following the two spokes must not fold onto the
        // same edge around v3 after the merge.
        if mesh[mesh[mesh[he_13].next].twin].next == mesh[he_23].twin
            || mesh[mesh[mesh[he_23].next].twin].next == mesh[he_13].twin
        {
            return false;
        }
        // Nor may the spokes share both of their faces.
        if mesh[mesh[he_13].twin].face == mesh[he_23].face
            && mesh[mesh[he_23].twin].face == mesh[he_13].face
        {
            return false;
        }
    }
    true
}

impl HalfedgeMesh {
    /// Reduce the face count to roughly a quarter by greedy
    /// quadric-error edge collapses.
    ///
    /// Requires every non-boundary face to be a triangle; returns
    /// `false` without touching the mesh otherwise. Returns `true` iff
    /// at least one collapse happened. Collapsed remnants are swept as
    /// the queue drains, so the mesh is left fully compacted.
    pub fn simplify(&mut self) -> bool {
        for f in self.face_ids() {
            if !self[f].boundary && !self.is_triangle(f) {
                return false;
            }
        }

        let mut face_quadrics = HashMap::new();
        for f in self.face_ids().collect::<Vec<_>>() {
            if !self[f].boundary {
                face_quadrics.insert(f, face_quadric(self, f));
            }
        }
        let mut vertex_quadrics = HashMap::new();
        for v in self.vertices().collect::<Vec<_>>() {
            vertex_quadrics.insert(v, vertex_quadric(self, v, &face_quadrics));
        }
        let mut records: HashMap<EdgeId, EdgeRecord> = HashMap::new();
        let mut queue: BTreeSet<EdgeRecord> = BTreeSet::new();
        for e in self.edge_ids().collect::<Vec<_>>() {
            let (v1, v2) = self.endpoints(e);
            let k = vertex_quadrics[&v1] + vertex_quadrics[&v2];
            let rec = EdgeRecord::new(self, &k, e);
            records.insert(e, rec);
            queue.insert(rec);
        }

        let surface_faces = face_quadrics.len();
        let target =
            self.n_faces() - (surface_faces - surface_faces / SIMPLIFICATION_FACTOR);
        let mut collapsed = false;

        while self.n_faces() > target {
            let Some(&top) = queue.iter().next() else { break };
            queue.remove(&top);
            records.remove(&top.edge);
            if !self.edge_live(top.edge) || !edge_collapsable(self, top.edge) {
                continue;
            }

            let (v1, v2) = self.endpoints(top.edge);
            let (Some(q1), Some(q2)) = (vertex_quadrics.get(&v1), vertex_quadrics.get(&v2))
            else {
                continue;
            };
            let k = q1 + q2;

            // Drop every record touching either endpoint before the
            // collapse invalidates them.
            for v in [v1, v2] {
                vertex_quadrics.remove(&v);
                for h in self.vertex_halfedges(v) {
                    let e = self[h].edge;
                    if let Some(rec) = records.remove(&e) {
                        queue.remove(&rec);
                    }
                }
            }

            let Ok(survivor) = self.collapse_edge(top.edge) else {
                continue;
            };
            self.sweep();
            collapsed = true;

            vertex_quadrics.insert(survivor, k);
            for h in self.vertex_halfedges(survivor) {
                let e = self[h].edge;
                if records.contains_key(&e) {
                    continue;
                }
                let (a, b) = self.endpoints(e);
                let (Some(qa), Some(qb)) = (vertex_quadrics.get(&a), vertex_quadrics.get(&b))
                else {
                    continue;
                };
                let ke = qa + qb;
                let rec = EdgeRecord::new(self, &ke, e);
                records.insert(e, rec);
                queue.insert(rec);
            }
        }
        collapsed
    }
}
