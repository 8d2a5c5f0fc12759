//! Local topology operations.
//!
//! Each operation returns the principal new entity on success, or an
//! [`EditError`] without touching the mesh. Successful operations leave
//! the mesh valid per [`HalfedgeMesh::validate`]; erased remnants stay
//! resolvable until [`HalfedgeMesh::sweep`].

use crate::mesh::{EdgeId, FaceId, HalfedgeMesh, VertexId};
use crate::EditError;
use glint_math::{centroid, polygon_normal, Point3};

impl HalfedgeMesh {
    /// Replace edge `(a, b)` between two faces with the edge between the
    /// two opposite corners, rotating it inside the joint quadrilateral.
    ///
    /// Works on faces of any degree; refuses on boundary edges.
    pub fn flip_edge(&mut self, e: EdgeId) -> Result<EdgeId, EditError> {
        if self.on_boundary(e) {
            return Err(EditError::BoundaryEdge);
        }

        let h0 = self[e].halfedge;
        let t0 = self[h0].twin;
        let f0 = self[h0].face;
        let f1 = self[t0].face;
        let ring0 = self.ring_from(h0);
        let ring1 = self.ring_from(t0);
        let l0 = ring0.len();
        let l1 = ring1.len();

        let va = self[h0].vertex;
        let vb = self[t0].vertex;
        // The flipped edge connects the two next-next corners.
        let vc = self[ring0[2]].vertex;
        let vd = self[ring1[2]].vertex;

        self[h0].next = ring0[2];
        self[h0].vertex = vd;
        self[t0].next = ring1[2];
        self[t0].vertex = vc;

        // One half-edge migrates across the edge in each direction.
        self[ring0[l0 - 1]].next = ring1[1];
        self[ring1[1]].next = h0;
        self[ring1[1]].face = f0;
        self[ring1[l1 - 1]].next = ring0[1];
        self[ring0[1]].next = t0;
        self[ring0[1]].face = f1;

        // The old endpoints may have pointed out along the flipped edge.
        self[va].halfedge = ring1[1];
        self[vb].halfedge = ring0[1];

        self[e].halfedge = h0;
        self[f0].halfedge = h0;
        self[f1].halfedge = t0;
        Ok(e)
    }

    /// Insert a midpoint vertex on `e` and fan it out to the two
    /// opposite corners, replacing two triangles with four.
    ///
    /// Requires triangles on both sides, so boundary edges refuse too.
    /// The returned vertex's outgoing half-edge continues the split
    /// edge's direction; the two transverse edges are flagged `is_new`.
    pub fn split_edge(&mut self, e: EdgeId) -> Result<VertexId, EditError> {
        let h0 = self[e].halfedge;
        let t0 = self[h0].twin;
        if self.on_boundary(e) || !self.is_triangle(self[h0].face) || !self.is_triangle(self[t0].face)
        {
            return Err(EditError::NonTriangleNeighborhood);
        }

        /*
                 vc                          vc
                /  \                        / | \
               / f0 \          h7:m->vb   /  |  \
              /      \                   / f0|f2 \
            va--------vb      =>       va----m----vb
              \ h0->  \                  \ f1|f3 /
               \ f1   /                   \  |  /
                \    /                     \ | /
                 vd                          vd
        */
        let ring0 = self.ring_from(h0); // [h0, h1, h2]
        let ring1 = self.ring_from(t0); // [t0, h4, h5]
        let (h1, h2) = (ring0[1], ring0[2]);
        let (h4, h5) = (ring1[1], ring1[2]);
        let va = self[h0].vertex;
        let vb = self[h1].vertex;
        let vc = self[h2].vertex;
        let vd = self[h5].vertex;
        let f0 = self[h0].face;
        let f1 = self[t0].face;

        let mid = Point3::from((self[va].pos.coords + self[vb].pos.coords) * 0.5);
        let m = self.new_vertex(mid);
        self[m].is_new = true;

        let h6 = self.new_halfedge();
        let h7 = self.new_halfedge();
        let h8 = self.new_halfedge();
        let h9 = self.new_halfedge();
        let h10 = self.new_halfedge();
        let h11 = self.new_halfedge();
        let e1 = self.new_edge(); // m--vb, second half of the split edge
        let e2 = self.new_edge(); // m--vc
        let e3 = self.new_edge(); // m--vd
        self[e2].is_new = true;
        self[e3].is_new = true;
        let f2 = self.new_face(false);
        let f3 = self.new_face(false);

        // f0 keeps (va, m, vc); the old twin is repurposed as m->vc.
        self.set_neighbors(h0, t0, h11, va, e, f0);
        self.set_neighbors(t0, h2, h6, m, e2, f0);
        self[h2].next = h0;
        self[h2].face = f0;
        // f2 = (vc, m, vb)
        self.set_neighbors(h6, h7, t0, vc, e2, f2);
        self.set_neighbors(h7, h1, h8, m, e1, f2);
        self[h1].next = h6;
        self[h1].face = f2;
        // f3 = (vb, m, vd)
        self.set_neighbors(h8, h9, h7, vb, e1, f3);
        self.set_neighbors(h9, h5, h10, m, e3, f3);
        self[h5].next = h8;
        self[h5].face = f3;
        // f1 keeps (vd, m, va)
        self.set_neighbors(h10, h11, h9, vd, e3, f1);
        self.set_neighbors(h11, h4, h0, m, e, f1);
        self[h4].next = h10;
        self[h4].face = f1;

        self[va].halfedge = h4;
        self[vb].halfedge = h1;
        self[vc].halfedge = h2;
        self[vd].halfedge = h5;
        self[m].halfedge = h7;

        self[e].halfedge = h0;
        self[e1].halfedge = h7;
        self[e2].halfedge = t0;
        self[e3].halfedge = h9;

        self[f0].halfedge = h0;
        self[f1].halfedge = h4;
        self[f2].halfedge = h1;
        self[f3].halfedge = h5;
        Ok(m)
    }

    /// Collapse `e`, merging its endpoints into the first one at their
    /// midpoint.
    ///
    /// Triangular neighbor faces dissolve entirely (their remaining two
    /// edges fuse); larger faces just lose one half-edge. Afterwards any
    /// fused edge bounded by boundary faces on both sides is dissolved.
    ///
    /// The structural rewiring itself is unconditional; callers that
    /// must stay manifold gate with [`crate::edge_collapsable`] first.
    pub fn collapse_edge(&mut self, e: EdgeId) -> Result<VertexId, EditError> {
        let h1 = self[e].halfedge;
        let h2 = self[h1].twin;
        let v1 = self[h1].vertex;
        let v2 = self[h2].vertex;
        if v1 == v2 {
            return Err(EditError::DegenerateCollapse);
        }
        let h1n = self[h1].next;
        let h2n = self[h2].next;
        let h1p = self.prev(h1);
        let h2p = self.prev(h2);

        let mid = Point3::from((self[v1].pos.coords + self[v2].pos.coords) * 0.5);

        // Every half-edge leaving v2 now leaves v1.
        for h in self.vertex_halfedges(v2) {
            self[h].vertex = v1;
        }

        // Side of h1.
        let h1n_twin = self[h1n].twin;
        let h1p_twin = self[h1p].twin;
        let e1n = self[h1n].edge;
        let e1p = self[h1p].edge;
        self[e1n].halfedge = h1n_twin;
        self[e1p].halfedge = h1p_twin;
        if self[h1n].next == h1p {
            // Triangle: the two remaining edges fuse into e1p.
            self[h1n_twin].twin = h1p_twin;
            self[h1p_twin].twin = h1n_twin;
            self[h1n_twin].edge = e1p;
            let v3 = self[h1p].vertex;
            self[v3].halfedge = h1n_twin;
            let dead_face = self[h1n].face;
            self.discard_halfedge(h1n);
            self.discard_halfedge(h1p);
            self.discard_edge(e1n);
            self.discard_face(dead_face);
        } else {
            self[h1p].next = h1n;
            let f = self[h1p].face;
            self[f].halfedge = h1p;
        }

        // Side of h2; twins read after the first side's rewiring.
        let h2n_twin = self[h2n].twin;
        let h2p_twin = self[h2p].twin;
        let e2n = self[h2n].edge;
        let e2p = self[h2p].edge;
        self[e2n].halfedge = h2n_twin;
        self[e2p].halfedge = h2p_twin;
        if self[h2n].next == h2p {
            self[h2n_twin].twin = h2p_twin;
            self[h2p_twin].twin = h2n_twin;
            self[h2n_twin].edge = e2p;
            let v3 = self[h2p].vertex;
            self[v3].halfedge = h2n_twin;
            let dead_face = self[h2n].face;
            self.discard_halfedge(h2n);
            self.discard_halfedge(h2p);
            self.discard_edge(e2n);
            self.discard_face(dead_face);
        } else {
            self[h2p].next = h2n;
            let f = self[h2p].face;
            self[f].halfedge = h2p;
        }

        self[v1].halfedge = h2p_twin;
        self[v1].pos = mid;

        self.discard_halfedge(h1);
        self.discard_halfedge(h2);
        self.discard_vertex(v2);
        self.discard_edge(e);

        // A fused edge squeezed between two holes carries no surface.
        for fused in [h1n_twin, h2n_twin] {
            let fe = self[fused].edge;
            let fa = self[fused].face;
            let fb = self[self[fused].twin].face;
            if self[fa].boundary && self[fb].boundary {
                let _ = self.erase_edge(fe);
            }
        }
        Ok(v1)
    }

    /// Dissolve `e`, merging its two incident faces into one.
    ///
    /// Refuses when the edge's half-edges follow each other (removing
    /// it would pinch the ring apart) and when both sides already bound
    /// the same face. The surviving face inherits the boundary flag of
    /// either side.
    pub fn erase_edge(&mut self, e: EdgeId) -> Result<FaceId, EditError> {
        let h1 = self[e].halfedge;
        let h2 = self[h1].twin;
        if self[h1].next == h2 || self[h2].next == h1 {
            return Err(EditError::WouldPinch);
        }
        let f1 = self[h1].face;
        let f2 = self[h2].face;
        if f1 == f2 {
            return Err(EditError::WouldPinch);
        }
        let h1n = self[h1].next;
        let h2n = self[h2].next;
        let v1 = self[h1].vertex;
        let v2 = self[h2].vertex;
        let h1p = self.prev(h1);
        let h2p = self.prev(h2);

        self[h2p].next = h1n;
        self[h1p].next = h2n;
        for h in self.ring_from(h1n) {
            self[h].face = f1;
        }
        self[v1].halfedge = h2n;
        self[v2].halfedge = h1n;
        self[f1].halfedge = h1n;
        let hole = self[f2].boundary;
        if hole {
            self[f1].boundary = true;
        }

        self.discard_edge(e);
        self.discard_halfedge(h1);
        self.discard_halfedge(h2);
        self.discard_face(f2);
        Ok(f1)
    }

    /// Remove an interior vertex together with its edges, merging all
    /// incident faces into one.
    pub fn erase_vertex(&mut self, v: VertexId) -> Result<FaceId, EditError> {
        if self.n_vertices() <= 1 {
            return Err(EditError::LastVertex);
        }
        let hi = self[v].halfedge;
        let f = self[hi].face;
        let spokes = self.vertex_halfedges(v);
        let n = spokes.len();

        // For each wedge between consecutive spokes, relabel the kept
        // arc to the surviving face and splice it past the vertex.
        for i in 0..n {
            let he_next = spokes[i];
            let he_cur = spokes[(i + 1) % n];
            let v_cur = self[self[he_cur].twin].vertex;
            self[v_cur].halfedge = self[he_cur].next;

            let incoming = self[he_next].twin;
            let mut he = he_cur;
            loop {
                let nx = self[he].next;
                if nx == incoming {
                    break;
                }
                he = nx;
                self[he].face = f;
            }
            self[he].next = self[he_next].next;
        }
        self[f].halfedge = self[hi].next;

        for &h in &spokes {
            let t = self[h].twin;
            let e = self[h].edge;
            let hf = self[h].face;
            self.discard_edge(e);
            self.discard_halfedge(h);
            self.discard_halfedge(t);
            if hf != f {
                self.discard_face(hf);
            }
        }
        self.discard_vertex(v);
        Ok(f)
    }

    /// Replace `f` with an inset copy of itself connected to the
    /// original boundary by a ring of quads.
    ///
    /// New vertices start exactly on top of the originals; use
    /// [`bevel_face_positions`](Self::bevel_face_positions) to offset
    /// them. Returns the inset face (the original handle, re-bounded).
    pub fn bevel_face(&mut self, f: FaceId) -> Result<FaceId, EditError> {
        if self[f].boundary {
            return Err(EditError::BoundaryFace);
        }

        /*
            Per original corner i, one inset vertex and one quad:

                      he_n[i]
                vs[i] <----------- vs[i+1]
                     |   he_3[i]   |
              he_4[i]|             |he_2[i]
                     |   ring[i]   |
                  v1  -----------> v2
        */
        let ring = self.face_halfedges(f);
        let n = ring.len();
        let mut hes_2 = Vec::with_capacity(n);
        let mut hes_3 = Vec::with_capacity(n);
        let mut hes_4 = Vec::with_capacity(n);
        let mut hes_n = Vec::with_capacity(n);
        let mut rail_edges = Vec::with_capacity(n);
        let mut inset_edges = Vec::with_capacity(n);
        let mut vs = Vec::with_capacity(n);
        let mut quads = Vec::with_capacity(n);
        for &h in &ring {
            hes_2.push(self.new_halfedge());
            hes_3.push(self.new_halfedge());
            hes_4.push(self.new_halfedge());
            hes_n.push(self.new_halfedge());
            rail_edges.push(self.new_edge());
            inset_edges.push(self.new_edge());
            let pos = self[self[h].vertex].pos;
            vs.push(self.new_vertex(pos));
            quads.push(self.new_face(false));
        }

        for i in 0..n {
            let j = (i + 1) % n;
            let k = (i + n - 1) % n;
            let he_1 = ring[i];
            let (he_2, he_3, he_4, he_n) = (hes_2[i], hes_3[i], hes_4[i], hes_n[i]);
            let v2 = self[ring[j]].vertex;
            let (v3, v4) = (vs[j], vs[i]);
            let (e_2, e_3, e_4) = (rail_edges[j], inset_edges[i], rail_edges[i]);
            let nf = quads[i];

            self[he_1].next = he_2;
            self[he_1].face = nf;
            self.set_neighbors(he_2, he_3, hes_4[j], v2, e_2, nf);
            self.set_neighbors(he_3, he_4, he_n, v3, e_3, nf);
            self.set_neighbors(he_4, he_1, hes_2[k], v4, e_4, nf);
            self.set_neighbors(he_n, hes_n[j], he_3, v4, e_3, f);

            self[v2].halfedge = he_2;
            self[v3].halfedge = he_3;
            self[e_2].halfedge = he_2;
            self[e_3].halfedge = he_3;
            self[nf].halfedge = he_1;
        }
        self[f].halfedge = hes_n[0];
        Ok(f)
    }

    /// Position the vertices of a freshly beveled face.
    ///
    /// `start_positions` are the original corner positions in the inset
    /// face's ring order (what [`face_positions`](Self::face_positions)
    /// returned before the bevel). Each vertex lands at
    /// `start - normal_offset * n + tangent_offset * (start - centroid)`
    /// where `n` is the original face normal. Offsets are absolute, not
    /// accumulated.
    pub fn bevel_face_positions(
        &mut self,
        start_positions: &[Point3],
        face: FaceId,
        tangent_offset: f64,
        normal_offset: f64,
    ) {
        let normal = polygon_normal(start_positions);
        let center = centroid(start_positions);
        for (i, h) in self.face_halfedges(face).into_iter().enumerate() {
            let v = self[h].vertex;
            let start = start_positions[i];
            self[v].pos = start - normal_offset * normal + tangent_offset * (start - center);
        }
    }

    /// Replacing a vertex with a face is not supported.
    pub fn bevel_vertex(&mut self, _v: VertexId) -> Result<FaceId, EditError> {
        Err(EditError::Unsupported)
    }

    /// Replacing an edge with a face is not supported.
    pub fn bevel_edge(&mut self, _e: EdgeId) -> Result<FaceId, EditError> {
        Err(EditError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_math::Vec3;

    /// Unit square split into triangles (A,B,D) and (B,C,D) by the
    /// diagonal BD, plus the virtual outside face.
    fn split_square() -> HalfedgeMesh {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        HalfedgeMesh::from_polygons(&positions, &[vec![0, 1, 3], vec![1, 2, 3]]).unwrap()
    }

    fn edge_between(mesh: &HalfedgeMesh, a: Point3, b: Point3) -> EdgeId {
        mesh.edge_ids()
            .find(|&e| {
                let (va, vb) = mesh.endpoints(e);
                let (pa, pb) = (mesh[va].pos, mesh[vb].pos);
                ((pa - a).norm() < 1e-9 && (pb - b).norm() < 1e-9)
                    || ((pa - b).norm() < 1e-9 && (pb - a).norm() < 1e-9)
            })
            .expect("edge with the given endpoints")
    }

    fn face_corner_set(mesh: &HalfedgeMesh, f: crate::FaceId) -> Vec<Point3> {
        let mut ps: Vec<Point3> = mesh.face_positions(f).to_vec();
        ps.sort_by(|p, q| {
            p.x.partial_cmp(&q.x)
                .unwrap()
                .then(p.y.partial_cmp(&q.y).unwrap())
                .then(p.z.partial_cmp(&q.z).unwrap())
        });
        ps
    }

    #[test]
    fn test_flip_square_diagonal() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(1.0, 1.0, 0.0);
        let d = Point3::new(0.0, 1.0, 0.0);
        let mut mesh = split_square();
        let bd = edge_between(&mesh, b, d);

        let e = mesh.flip_edge(bd).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();

        // The diagonal now runs A-C and the triangles are (A,B,C), (A,C,D).
        let (va, vc) = mesh.endpoints(e);
        let mut got = [mesh[va].pos, mesh[vc].pos];
        got.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap().then(p.y.partial_cmp(&q.y).unwrap()));
        assert!((got[0] - a).norm() < 1e-12);
        assert!((got[1] - c).norm() < 1e-12);
        let mut corner_sets: Vec<Vec<Point3>> = mesh
            .face_ids()
            .filter(|&f| !mesh[f].boundary)
            .map(|f| face_corner_set(&mesh, f))
            .collect();
        corner_sets.sort_by(|s, t| s[1].x.partial_cmp(&t[1].x).unwrap());
        assert_eq!(corner_sets.len(), 2);
        for set in &corner_sets {
            assert_eq!(set.len(), 3);
        }

        // Flipping again restores the original diagonal.
        let e2 = mesh.flip_edge(e).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();
        let (v1, v2) = mesh.endpoints(e2);
        let mut back = [mesh[v1].pos, mesh[v2].pos];
        back.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap());
        assert!((back[0] - d).norm() < 1e-12);
        assert!((back[1] - b).norm() < 1e-12);
    }

    #[test]
    fn test_flip_refuses_boundary_edge() {
        let mut mesh = split_square();
        let ab = edge_between(&mesh, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.flip_edge(ab), Err(EditError::BoundaryEdge));
        mesh.validate().unwrap();
    }

    #[test]
    fn test_flip_quads_preserves_degree() {
        let mut mesh = HalfedgeMesh::cube(2.0);
        let e = mesh.edge_ids().next().unwrap();
        mesh.flip_edge(e).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();
        assert_eq!(mesh.n_edges(), 12);
        assert!(mesh.face_ids().all(|f| mesh.face_degree(f) == 4));
    }

    #[test]
    fn test_split_square_diagonal() {
        let mut mesh = split_square();
        let bd = edge_between(&mesh, Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0));
        let m = mesh.split_edge(bd).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();

        assert!((mesh[m].pos - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
        assert!(mesh[m].is_new);
        assert_eq!(mesh.n_vertices(), 5);
        assert_eq!(mesh.n_edges(), 8);
        assert_eq!(mesh.face_ids().filter(|&f| !mesh[f].boundary).count(), 4);
        assert_eq!(mesh.vertex_degree(m), 4);

        // The midpoint's half-edge continues the split edge, not one of
        // the new transverse edges.
        let out = mesh[m].halfedge;
        assert!(!mesh[mesh[out].edge].is_new);
        let target = mesh[mesh[out].twin].vertex;
        let tp = mesh[target].pos;
        assert!(
            (tp - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12
                || (tp - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12
        );
    }

    #[test]
    fn test_split_refuses_boundary_and_quads() {
        let mut mesh = split_square();
        let ab = edge_between(&mesh, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.split_edge(ab), Err(EditError::NonTriangleNeighborhood));

        let mut cube = HalfedgeMesh::cube(1.0);
        let e = cube.edge_ids().next().unwrap();
        assert_eq!(cube.split_edge(e), Err(EditError::NonTriangleNeighborhood));
        cube.validate().unwrap();
    }

    #[test]
    fn test_collapse_square_edge() {
        let mut mesh = split_square();
        let ab = edge_between(&mesh, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let v = mesh.collapse_edge(ab).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();

        assert!((mesh[v].pos - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
        assert_eq!(mesh.n_vertices(), 3);
        let interior: Vec<_> = mesh.face_ids().filter(|&f| !mesh[f].boundary).collect();
        assert_eq!(interior.len(), 1);
        let corners = face_corner_set(&mesh, interior[0]);
        assert!((corners[0] - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
        assert!((corners[1] - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
        assert!((corners[2] - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_collapse_cube_edge() {
        // Both neighbors are quads: no face dissolves, they become triangles.
        let mut mesh = HalfedgeMesh::cube(2.0);
        let e = mesh.edge_ids().next().unwrap();
        let v = mesh.collapse_edge(e).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();
        assert_eq!(mesh.n_vertices(), 7);
        assert_eq!(mesh.n_edges(), 11);
        assert_eq!(mesh.n_faces(), 6);
        assert_eq!(
            mesh.face_ids().filter(|&f| mesh.face_degree(f) == 3).count(),
            2
        );
        assert_eq!(mesh.vertex_degree(v), 4);
    }

    #[test]
    fn test_erase_edge_merges_cube_faces() {
        let mut mesh = HalfedgeMesh::cube(1.0);
        let e = mesh.edge_ids().next().unwrap();
        let f = mesh.erase_edge(e).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();
        assert_eq!(mesh.n_faces(), 5);
        assert_eq!(mesh.n_edges(), 11);
        assert_eq!(mesh.n_vertices(), 8);
        assert_eq!(mesh.face_degree(f), 6);
        assert!(!mesh[f].boundary);
    }

    #[test]
    fn test_erase_edge_refuses_pinch() {
        // Two triangles glued back to back: after one dissolution the
        // remaining edges have both sides on the one face.
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh =
            HalfedgeMesh::from_polygons(&positions, &[vec![0, 1, 2], vec![2, 1, 0]]).unwrap();
        let e = mesh.edge_ids().next().unwrap();
        mesh.erase_edge(e).unwrap();
        mesh.sweep();
        let remaining: Vec<_> = mesh.edge_ids().collect();
        for e in remaining {
            assert_eq!(mesh.erase_edge(e), Err(EditError::WouldPinch));
        }
    }

    #[test]
    fn test_erase_vertex_merges_corner() {
        let mut mesh = HalfedgeMesh::cube(2.0);
        let v = mesh.vertices().next().unwrap();
        let f = mesh.erase_vertex(v).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();
        assert_eq!(mesh.n_vertices(), 7);
        assert_eq!(mesh.n_edges(), 9);
        assert_eq!(mesh.n_faces(), 4);
        assert_eq!(mesh.face_degree(f), 6);
    }

    #[test]
    fn test_bevel_face_topology_and_positions() {
        let mut mesh = HalfedgeMesh::cube(2.0);
        let top = mesh
            .face_ids()
            .find(|&f| (mesh.face_normal(f) - Vec3::y()).norm() < 1e-9)
            .unwrap();
        let start: Vec<Point3> = mesh.face_positions(top).to_vec();

        let inset = mesh.bevel_face(top).unwrap();
        mesh.sweep();
        mesh.validate().unwrap();
        assert_eq!(mesh.n_vertices(), 12);
        assert_eq!(mesh.n_edges(), 20);
        assert_eq!(mesh.n_faces(), 10);
        assert_eq!(mesh.face_degree(inset), 4);

        // Before any positioning the inset sits on the original corners.
        for (i, p) in mesh.face_positions(inset).into_iter().enumerate() {
            assert!((p - start[i]).norm() < 1e-12);
        }

        // Sink the inset halfway into the cube and pull its corners
        // halfway toward the centroid.
        mesh.bevel_face_positions(&start, inset, -0.5, 0.5);
        for p in mesh.face_positions(inset) {
            assert!((p.y - 0.5).abs() < 1e-12);
            assert!((p.x.abs() - 0.5).abs() < 1e-12);
            assert!((p.z.abs() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bevel_refusals() {
        let mut mesh = split_square();
        let boundary = mesh.face_ids().find(|&f| mesh[f].boundary).unwrap();
        assert_eq!(mesh.bevel_face(boundary), Err(EditError::BoundaryFace));
        let v = mesh.vertices().next().unwrap();
        assert_eq!(mesh.bevel_vertex(v), Err(EditError::Unsupported));
        let e = mesh.edge_ids().next().unwrap();
        assert_eq!(mesh.bevel_edge(e), Err(EditError::Unsupported));
    }
}
