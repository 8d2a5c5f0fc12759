//! Global remeshing: triangulation and subdivision position rules.
//!
//! Subdivision is two-phase: the `*_subdivide_positions` rules only fill
//! the `new_pos` scratch fields on the current mesh, then
//! [`subdivide_quads`](HalfedgeMesh::subdivide_quads) emits the refined
//! control net as plain position/quad lists for a rebuild through
//! [`HalfedgeMesh::from_polygons`].

use crate::mesh::{FaceId, HalfedgeMesh};
use glint_math::Point3;
use std::collections::HashMap;

impl HalfedgeMesh {
    /// Split one face into triangles by fanning from its first vertex.
    ///
    /// An n-gon becomes `n - 2` triangles over `n - 3` new interior
    /// edges. Triangles and boundary faces are left alone.
    pub fn triangulate_face(&mut self, f: FaceId) {
        if self[f].boundary || self.is_triangle(f) {
            return;
        }

        /*
           vs[i] ---------- vs[i+1]
                \  ring[i+1] /
          rad[i] \          / rad[i+1]
                  \        /
                   \      /
                    base
        */
        let ring = self.face_halfedges(f);
        let n = ring.len();
        let base = self[ring[0]].vertex;

        // Interior diagonal i runs base -> ring[i+1].vertex, carrying
        // half-edge a[i] on its far side and b[i-1] back on its near side.
        let mut a = Vec::with_capacity(n - 2);
        let mut b = Vec::with_capacity(n - 2);
        let mut diagonals = Vec::with_capacity(n - 3);
        let mut fans = Vec::with_capacity(n - 2);
        a.push(ring[0]);
        fans.push(f);
        for _ in 1..n - 2 {
            let d = self.new_edge();
            self[d].is_new = true;
            diagonals.push(d);
            a.push(self.new_halfedge());
            b.push(self.new_halfedge());
            fans.push(self.new_face(false));
        }
        b.push(ring[n - 1]);

        for i in 0..n - 2 {
            let fan = fans[i];
            let spoke_out = a[i];
            let arc = ring[i + 1];
            let spoke_in = b[i];

            self[spoke_out].next = arc;
            self[spoke_out].face = fan;
            if i > 0 {
                let d = diagonals[i - 1];
                self[spoke_out].vertex = base;
                self[spoke_out].edge = d;
                self[spoke_out].twin = b[i - 1];
                self[b[i - 1]].twin = spoke_out;
                self[d].halfedge = spoke_out;
            }
            self[arc].next = spoke_in;
            self[arc].face = fan;
            self[spoke_in].next = spoke_out;
            self[spoke_in].face = fan;
            if i < n - 3 {
                self[spoke_in].vertex = self[ring[i + 2]].vertex;
                self[spoke_in].edge = diagonals[i];
            }
            self[fan].halfedge = arc;
        }
    }

    /// Split every non-boundary face into triangles.
    pub fn triangulate(&mut self) {
        let faces: Vec<FaceId> = self.face_ids().collect();
        for f in faces {
            self.triangulate_face(f);
        }
    }

    /// Fill the `new_pos` scratch fields with the linear (midpoint /
    /// centroid) subdivision rule. Topology is untouched.
    pub fn linear_subdivide_positions(&mut self) {
        let verts: Vec<_> = self.vertices().collect();
        for v in verts {
            let p = self[v].pos;
            self[v].new_pos = p;
        }
        let edges: Vec<_> = self.edge_ids().collect();
        for e in edges {
            let c = self.edge_center(e);
            self[e].new_pos = c;
        }
        let faces: Vec<_> = self.face_ids().collect();
        for f in faces {
            let c = self.face_center(f);
            self[f].new_pos = c;
        }
    }

    /// Fill the `new_pos` scratch fields with the Catmull-Clark rules.
    ///
    /// Face points are centroids; edge points average the edge midpoint
    /// with the two neighboring face points; a valence-n vertex moves to
    /// `(Q + 2R + (n-3) * pos) / n` for Q the mean of adjacent face
    /// points and R the mean of adjacent edge midpoints.
    ///
    /// The mesh must be closed; boundary vertices are not handled.
    pub fn catmullclark_subdivide_positions(&mut self) {
        let faces: Vec<_> = self.face_ids().collect();
        for f in faces {
            let c = self.face_center(f);
            self[f].new_pos = c;
        }
        let edges: Vec<_> = self.edge_ids().collect();
        for e in edges {
            let h = self[e].halfedge;
            let t = self[h].twin;
            let left = self[self[h].face].new_pos;
            let right = self[self[t].face].new_pos;
            let mid = self.edge_center(e);
            self[e].new_pos =
                Point3::from(mid.coords * 0.5 + (left.coords + right.coords) * 0.25);
        }
        let verts: Vec<_> = self.vertices().collect();
        for v in verts {
            let ring = self.vertex_halfedges(v);
            let n = ring.len() as f64;
            let mut q = glint_math::Vec3::zeros();
            let mut r = glint_math::Vec3::zeros();
            for &h in &ring {
                q += self.face_center(self[h].face).coords;
                r += self.edge_center(self[h].edge).coords;
            }
            q /= n;
            r /= n;
            let pos = self[v].pos.coords;
            self[v].new_pos = Point3::from((q + 2.0 * r + (n - 3.0) * pos) / n);
        }
    }

    /// Emit the subdivided control net from the populated `new_pos`
    /// fields: positions indexed `[0, V + E + F)` (vertices, then edges,
    /// then non-boundary faces) and one quad per face corner, wound like
    /// its parent face. Feed the result to
    /// [`from_polygons`](Self::from_polygons) to rebuild.
    pub fn subdivide_quads(&self) -> (Vec<Point3>, Vec<Vec<usize>>) {
        let mut positions = Vec::new();
        let mut vert_idx = HashMap::new();
        let mut edge_idx = HashMap::new();
        let mut face_idx = HashMap::new();
        for v in self.vertices() {
            vert_idx.insert(v, positions.len());
            positions.push(self[v].new_pos);
        }
        for e in self.edge_ids() {
            edge_idx.insert(e, positions.len());
            positions.push(self[e].new_pos);
        }
        for f in self.face_ids().filter(|&f| !self[f].boundary) {
            face_idx.insert(f, positions.len());
            positions.push(self[f].new_pos);
        }

        let mut quads = Vec::new();
        for (&f, &fi) in &face_idx {
            for h in self.face_halfedges(f) {
                let next = self[h].next;
                quads.push(vec![
                    fi,
                    edge_idx[&self[h].edge],
                    vert_idx[&self[next].vertex],
                    edge_idx[&self[next].edge],
                ]);
            }
        }
        (positions, quads)
    }
}
