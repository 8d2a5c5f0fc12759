//! The half-edge data model: entities, arenas, lifecycle, traversal.

use glint_math::{centroid, polygon_normal, Point3, Vec3};
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::ops::{Index, IndexMut};
use thiserror::Error;

new_key_type! {
    /// Stable handle to a [`Vertex`].
    pub struct VertexId;
    /// Stable handle to an [`Edge`].
    pub struct EdgeId;
    /// Stable handle to a [`Halfedge`].
    pub struct HalfedgeId;
    /// Stable handle to a [`Face`].
    pub struct FaceId;
}

/// Half-edge rings are linked lists; a malformed mesh could make a walk
/// non-terminating. Walks panic after this many steps instead.
pub const MAX_LOOP_ITERATIONS: usize = 8192;

/// A mesh vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in 3D space.
    pub pos: Point3,
    /// One outgoing half-edge.
    pub halfedge: HalfedgeId,
    /// Scratch position written by the subdivision rules.
    pub new_pos: Point3,
    /// Transient marker for staged global edits.
    pub is_new: bool,
}

/// An undirected mesh edge; owns no geometry beyond its two half-edges.
#[derive(Debug, Clone)]
pub struct Edge {
    /// One of the edge's two half-edges.
    pub halfedge: HalfedgeId,
    /// Scratch position written by the subdivision rules.
    pub new_pos: Point3,
    /// Transient marker for staged global edits.
    pub is_new: bool,
}

/// A directed side of an edge.
#[derive(Debug, Clone)]
pub struct Halfedge {
    /// The opposite half-edge on the same edge.
    pub twin: HalfedgeId,
    /// The next half-edge around the face, same winding.
    pub next: HalfedgeId,
    /// The source vertex.
    pub vertex: VertexId,
    /// The owning edge.
    pub edge: EdgeId,
    /// The face this half-edge bounds.
    pub face: FaceId,
}

impl Halfedge {
    fn dangling() -> Self {
        Self {
            twin: HalfedgeId::null(),
            next: HalfedgeId::null(),
            vertex: VertexId::null(),
            edge: EdgeId::null(),
            face: FaceId::null(),
        }
    }
}

/// A mesh face. Virtual `boundary` faces stand in for holes: they
/// participate in connectivity but carry no surface.
#[derive(Debug, Clone)]
pub struct Face {
    /// One half-edge on the face boundary.
    pub halfedge: HalfedgeId,
    /// Whether this face represents a hole rather than surface.
    pub boundary: bool,
    /// Scratch position written by the subdivision rules.
    pub new_pos: Point3,
}

/// Errors from [`HalfedgeMesh::from_polygons`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A polygon referenced a vertex index past the position list.
    #[error("polygon {polygon} references vertex {index}, out of range")]
    IndexOutOfRange {
        /// Offending polygon.
        polygon: usize,
        /// Offending vertex index.
        index: usize,
    },
    /// A polygon has fewer than three distinct corners.
    #[error("polygon {polygon} is degenerate")]
    DegeneratePolygon {
        /// Offending polygon.
        polygon: usize,
    },
    /// Two polygons traverse the same directed edge: inconsistent
    /// winding or more than two faces on one edge.
    #[error("directed edge {a}->{b} appears twice")]
    DoubledEdge {
        /// Edge source index.
        a: usize,
        /// Edge target index.
        b: usize,
    },
    /// More than one hole passes through a single vertex.
    #[error("vertex {index} lies on more than one boundary loop")]
    NonManifoldVertex {
        /// Offending vertex index.
        index: usize,
    },
    /// A vertex is referenced by no polygon.
    #[error("vertex {index} is isolated")]
    IsolatedVertex {
        /// Offending vertex index.
        index: usize,
    },
}

/// An editable polygon mesh over four mutually recursive entity arenas.
///
/// Erasure is deferred: [`discard`](Self::discard_vertex)-family methods
/// only mark entities, and traversal/iteration treats marked entities as
/// absent, while handles still resolve for validators that run before
/// [`sweep`](Self::sweep) reclaims storage.
#[derive(Debug, Clone, Default)]
pub struct HalfedgeMesh {
    verts: SlotMap<VertexId, Vertex>,
    edges: SlotMap<EdgeId, Edge>,
    halfedges: SlotMap<HalfedgeId, Halfedge>,
    faces: SlotMap<FaceId, Face>,

    erased_verts: HashSet<VertexId>,
    erased_edges: HashSet<EdgeId>,
    erased_halfedges: HashSet<HalfedgeId>,
    erased_faces: HashSet<FaceId>,
}

impl Index<VertexId> for HalfedgeMesh {
    type Output = Vertex;
    fn index(&self, id: VertexId) -> &Vertex {
        &self.verts[id]
    }
}

impl IndexMut<VertexId> for HalfedgeMesh {
    fn index_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.verts[id]
    }
}

impl Index<EdgeId> for HalfedgeMesh {
    type Output = Edge;
    fn index(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }
}

impl IndexMut<EdgeId> for HalfedgeMesh {
    fn index_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id]
    }
}

impl Index<HalfedgeId> for HalfedgeMesh {
    type Output = Halfedge;
    fn index(&self, id: HalfedgeId) -> &Halfedge {
        &self.halfedges[id]
    }
}

impl IndexMut<HalfedgeId> for HalfedgeMesh {
    fn index_mut(&mut self, id: HalfedgeId) -> &mut Halfedge {
        &mut self.halfedges[id]
    }
}

impl Index<FaceId> for HalfedgeMesh {
    type Output = Face;
    fn index(&self, id: FaceId) -> &Face {
        &self.faces[id]
    }
}

impl IndexMut<FaceId> for HalfedgeMesh {
    fn index_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id]
    }
}

impl HalfedgeMesh {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- allocation ----

    /// Allocate a vertex at `pos` with no outgoing half-edge yet.
    pub fn new_vertex(&mut self, pos: Point3) -> VertexId {
        self.verts.insert(Vertex {
            pos,
            halfedge: HalfedgeId::null(),
            new_pos: pos,
            is_new: false,
        })
    }

    /// Allocate an edge with no half-edge yet.
    pub fn new_edge(&mut self) -> EdgeId {
        self.edges.insert(Edge {
            halfedge: HalfedgeId::null(),
            new_pos: Point3::origin(),
            is_new: false,
        })
    }

    /// Allocate a half-edge with all links unset.
    pub fn new_halfedge(&mut self) -> HalfedgeId {
        self.halfedges.insert(Halfedge::dangling())
    }

    /// Allocate a face.
    pub fn new_face(&mut self, boundary: bool) -> FaceId {
        self.faces.insert(Face {
            halfedge: HalfedgeId::null(),
            boundary,
            new_pos: Point3::origin(),
        })
    }

    /// Set every connectivity field of a half-edge at once.
    pub fn set_neighbors(
        &mut self,
        h: HalfedgeId,
        next: HalfedgeId,
        twin: HalfedgeId,
        vertex: VertexId,
        edge: EdgeId,
        face: FaceId,
    ) {
        let he = &mut self.halfedges[h];
        he.next = next;
        he.twin = twin;
        he.vertex = vertex;
        he.edge = edge;
        he.face = face;
    }

    // ---- deferred erasure ----

    /// Mark a vertex for deletion. The handle keeps resolving until
    /// [`sweep`](Self::sweep).
    pub fn discard_vertex(&mut self, v: VertexId) {
        self.erased_verts.insert(v);
    }

    /// Mark an edge for deletion.
    pub fn discard_edge(&mut self, e: EdgeId) {
        self.erased_edges.insert(e);
    }

    /// Mark a half-edge for deletion.
    pub fn discard_halfedge(&mut self, h: HalfedgeId) {
        self.erased_halfedges.insert(h);
    }

    /// Mark a face for deletion.
    pub fn discard_face(&mut self, f: FaceId) {
        self.erased_faces.insert(f);
    }

    /// Whether the vertex exists and is not marked for deletion.
    pub fn vertex_live(&self, v: VertexId) -> bool {
        self.verts.contains_key(v) && !self.erased_verts.contains(&v)
    }

    /// Whether the edge exists and is not marked for deletion.
    pub fn edge_live(&self, e: EdgeId) -> bool {
        self.edges.contains_key(e) && !self.erased_edges.contains(&e)
    }

    /// Whether the half-edge exists and is not marked for deletion.
    pub fn halfedge_live(&self, h: HalfedgeId) -> bool {
        self.halfedges.contains_key(h) && !self.erased_halfedges.contains(&h)
    }

    /// Whether the face exists and is not marked for deletion.
    pub fn face_live(&self, f: FaceId) -> bool {
        self.faces.contains_key(f) && !self.erased_faces.contains(&f)
    }

    /// Physically remove every marked entity. Their handles stop
    /// resolving; all other handles are untouched.
    pub fn sweep(&mut self) {
        for v in self.erased_verts.drain() {
            self.verts.remove(v);
        }
        for e in self.erased_edges.drain() {
            self.edges.remove(e);
        }
        for h in self.erased_halfedges.drain() {
            self.halfedges.remove(h);
        }
        for f in self.erased_faces.drain() {
            self.faces.remove(f);
        }
    }

    // ---- counts and iteration (marked entities are absent) ----

    /// Number of live vertices.
    pub fn n_vertices(&self) -> usize {
        self.verts.len() - self.erased_verts.len()
    }

    /// Number of live edges.
    pub fn n_edges(&self) -> usize {
        self.edges.len() - self.erased_edges.len()
    }

    /// Number of live half-edges.
    pub fn n_halfedges(&self) -> usize {
        self.halfedges.len() - self.erased_halfedges.len()
    }

    /// Number of live faces, boundary faces included.
    pub fn n_faces(&self) -> usize {
        self.faces.len() - self.erased_faces.len()
    }

    /// Live vertex handles.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.verts
            .keys()
            .filter(move |v| !self.erased_verts.contains(v))
    }

    /// Live edge handles.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .keys()
            .filter(move |e| !self.erased_edges.contains(e))
    }

    /// Live half-edge handles.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfedgeId> + '_ {
        self.halfedges
            .keys()
            .filter(move |h| !self.erased_halfedges.contains(h))
    }

    /// Live face handles, boundary faces included.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .keys()
            .filter(move |f| !self.erased_faces.contains(f))
    }

    // ---- traversal ----

    /// The half-edge before `h` on its face ring.
    pub fn prev(&self, h: HalfedgeId) -> HalfedgeId {
        let mut cur = h;
        for _ in 0..MAX_LOOP_ITERATIONS {
            let next = self.halfedges[cur].next;
            if next == h {
                return cur;
            }
            cur = next;
        }
        panic!("face ring of {h:?} does not close");
    }

    /// Half-edges around a face, starting at its stored half-edge.
    pub fn face_halfedges(&self, f: FaceId) -> SmallVec<[HalfedgeId; 8]> {
        self.ring_from(self.faces[f].halfedge)
    }

    /// Half-edges of a face ring, starting at `start`.
    pub fn ring_from(&self, start: HalfedgeId) -> SmallVec<[HalfedgeId; 8]> {
        let mut ring = SmallVec::new();
        let mut h = start;
        for _ in 0..MAX_LOOP_ITERATIONS {
            ring.push(h);
            h = self.halfedges[h].next;
            if h == start {
                return ring;
            }
        }
        panic!("face ring of {start:?} does not close");
    }

    /// Outgoing half-edges around a vertex, in `twin().next()` order.
    pub fn vertex_halfedges(&self, v: VertexId) -> SmallVec<[HalfedgeId; 8]> {
        let start = self.verts[v].halfedge;
        let mut ring = SmallVec::new();
        let mut h = start;
        for _ in 0..MAX_LOOP_ITERATIONS {
            ring.push(h);
            h = self.halfedges[self.halfedges[h].twin].next;
            if h == start {
                return ring;
            }
        }
        panic!("vertex orbit of {v:?} does not close");
    }

    /// Neighbor vertex -> the outgoing half-edge that reaches it.
    pub fn vertex_neighborhood(&self, v: VertexId) -> HashMap<VertexId, HalfedgeId> {
        self.vertex_halfedges(v)
            .into_iter()
            .map(|h| (self.halfedges[self.halfedges[h].twin].vertex, h))
            .collect()
    }

    /// Number of half-edges bounding a face.
    pub fn face_degree(&self, f: FaceId) -> usize {
        self.face_halfedges(f).len()
    }

    /// Number of edges incident to a vertex (its valence).
    pub fn vertex_degree(&self, v: VertexId) -> usize {
        self.vertex_halfedges(v).len()
    }

    /// Whether a face is a triangle.
    pub fn is_triangle(&self, f: FaceId) -> bool {
        let h = self.faces[f].halfedge;
        let n = self.halfedges[h].next;
        let nn = self.halfedges[n].next;
        self.halfedges[nn].next == h
    }

    /// The two endpoints of an edge, in the stored half-edge's direction.
    pub fn endpoints(&self, e: EdgeId) -> (VertexId, VertexId) {
        let h = self.edges[e].halfedge;
        let t = self.halfedges[h].twin;
        (self.halfedges[h].vertex, self.halfedges[t].vertex)
    }

    /// Whether either side of an edge is a boundary face.
    pub fn on_boundary(&self, e: EdgeId) -> bool {
        let h = self.edges[e].halfedge;
        let t = self.halfedges[h].twin;
        self.faces[self.halfedges[h].face].boundary || self.faces[self.halfedges[t].face].boundary
    }

    /// Midpoint of an edge.
    pub fn edge_center(&self, e: EdgeId) -> Point3 {
        let (a, b) = self.endpoints(e);
        Point3::from((self.verts[a].pos.coords + self.verts[b].pos.coords) * 0.5)
    }

    /// Length of an edge.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let (a, b) = self.endpoints(e);
        (self.verts[a].pos - self.verts[b].pos).norm()
    }

    /// Positions of a face's corners in ring order.
    pub fn face_positions(&self, f: FaceId) -> SmallVec<[Point3; 8]> {
        self.face_halfedges(f)
            .into_iter()
            .map(|h| self.verts[self.halfedges[h].vertex].pos)
            .collect()
    }

    /// Centroid of a face.
    pub fn face_center(&self, f: FaceId) -> Point3 {
        centroid(&self.face_positions(f))
    }

    /// Unit normal of a face (winding order convention).
    pub fn face_normal(&self, f: FaceId) -> Vec3 {
        polygon_normal(&self.face_positions(f))
    }

    // ---- construction ----

    /// Build a mesh from shared positions and polygons given as CCW
    /// vertex-index loops. Holes are closed with virtual boundary faces.
    ///
    /// Rejects inputs whose directed edges repeat (inconsistent winding
    /// or >2 faces per edge), whose boundary loops cross at a vertex, or
    /// that leave a vertex unused; run [`validate`](Self::validate) for
    /// the full manifold check.
    pub fn from_polygons(
        positions: &[Point3],
        polygons: &[Vec<usize>],
    ) -> Result<Self, BuildError> {
        let mut mesh = HalfedgeMesh::new();
        let vids: Vec<VertexId> = positions.iter().map(|p| mesh.new_vertex(*p)).collect();

        // Interior half-edges, keyed by directed endpoint pair.
        let mut directed: HashMap<(usize, usize), HalfedgeId> = HashMap::new();
        for (pi, poly) in polygons.iter().enumerate() {
            let n = poly.len();
            if n < 3 {
                return Err(BuildError::DegeneratePolygon { polygon: pi });
            }
            for &i in poly {
                if i >= positions.len() {
                    return Err(BuildError::IndexOutOfRange {
                        polygon: pi,
                        index: i,
                    });
                }
            }
            let f = mesh.new_face(false);
            let hids: Vec<HalfedgeId> = (0..n).map(|_| mesh.new_halfedge()).collect();
            for i in 0..n {
                let (a, b) = (poly[i], poly[(i + 1) % n]);
                if a == b {
                    return Err(BuildError::DegeneratePolygon { polygon: pi });
                }
                if directed.insert((a, b), hids[i]).is_some() {
                    return Err(BuildError::DoubledEdge { a, b });
                }
                let he = &mut mesh.halfedges[hids[i]];
                he.next = hids[(i + 1) % n];
                he.vertex = vids[a];
                he.face = f;
                mesh.verts[vids[a]].halfedge = hids[i];
            }
            mesh.faces[f].halfedge = hids[0];
        }

        // Stitch twins; unmatched directed edges get a boundary partner.
        let mut boundary_out: HashMap<VertexId, HalfedgeId> = HashMap::new();
        for (&(a, b), &h) in &directed {
            if let Some(&t) = directed.get(&(b, a)) {
                if a < b {
                    let e = mesh.new_edge();
                    mesh.edges[e].halfedge = h;
                    mesh.halfedges[h].twin = t;
                    mesh.halfedges[h].edge = e;
                    mesh.halfedges[t].twin = h;
                    mesh.halfedges[t].edge = e;
                }
            } else {
                let e = mesh.new_edge();
                let bh = mesh.new_halfedge();
                mesh.edges[e].halfedge = h;
                mesh.halfedges[h].twin = bh;
                mesh.halfedges[h].edge = e;
                let he = &mut mesh.halfedges[bh];
                he.twin = h;
                he.edge = e;
                he.vertex = vids[b];
                if boundary_out.insert(vids[b], bh).is_some() {
                    return Err(BuildError::NonManifoldVertex { index: b });
                }
            }
        }

        // Chain boundary half-edges into hole loops, one virtual face per loop.
        let pending: Vec<HalfedgeId> = boundary_out.values().copied().collect();
        for &bh in &pending {
            // Target vertex of bh is the source of its interior twin.
            let t = mesh.halfedges[bh].twin;
            let target = mesh.halfedges[t].vertex;
            let Some(&succ) = boundary_out.get(&target) else {
                let index = vids.iter().position(|&v| v == target).unwrap_or(0);
                return Err(BuildError::NonManifoldVertex { index });
            };
            mesh.halfedges[bh].next = succ;
        }
        let mut claimed: HashSet<HalfedgeId> = HashSet::new();
        for &bh in &pending {
            if claimed.contains(&bh) {
                continue;
            }
            let f = mesh.new_face(true);
            mesh.faces[f].halfedge = bh;
            let mut h = bh;
            loop {
                claimed.insert(h);
                mesh.halfedges[h].face = f;
                h = mesh.halfedges[h].next;
                if h == bh {
                    break;
                }
            }
        }

        for (i, &v) in vids.iter().enumerate() {
            if mesh.verts[v].halfedge.is_null() {
                return Err(BuildError::IsolatedVertex { index: i });
            }
        }
        Ok(mesh)
    }

    /// An axis-aligned cube of the given side length, centered at the
    /// origin. Six quads, outward CCW winding.
    pub fn cube(side: f64) -> Self {
        let h = side * 0.5;
        let positions = [
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];
        let quads = vec![
            vec![4, 5, 6, 7],
            vec![1, 0, 3, 2],
            vec![0, 4, 7, 3],
            vec![5, 1, 2, 6],
            vec![0, 1, 5, 4],
            vec![3, 7, 6, 2],
        ];
        Self::from_polygons(&positions, &quads).expect("cube topology is closed and manifold")
    }

    /// Drop all connectivity, returning the live vertex positions.
    pub fn destructure(mut self) -> Vec<Point3> {
        self.sweep();
        self.verts.values().map(|v| v.pos).collect()
    }
}
