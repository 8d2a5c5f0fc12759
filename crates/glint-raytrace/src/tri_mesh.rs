//! Triangle meshes for tracing.

use crate::{BBox, Bvh, Primitive, Ray, Trace};
use glint_halfedge::HalfedgeMesh;
use glint_math::{Point3, Vec3};
use std::collections::HashMap;

/// Rejection threshold for the Moller-Trumbore denominator.
const PARALLEL_EPS: f64 = 1e-6;

/// A triangle corner: position plus shading normal.
#[derive(Debug, Clone, Copy)]
pub struct TriVert {
    /// Corner position.
    pub position: Point3,
    /// Shading normal, blended across the face at hit points.
    pub normal: Vec3,
}

/// One triangle with inline vertex data.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    verts: [TriVert; 3],
}

impl Triangle {
    /// Triangle from three corners.
    pub fn new(verts: [TriVert; 3]) -> Self {
        Self { verts }
    }
}

impl Primitive for Triangle {
    fn bbox(&self) -> BBox {
        let mut b = BBox::empty();
        for v in &self.verts {
            b.enclose(v.position);
        }
        b
    }

    /// Moller-Trumbore. Rays within `PARALLEL_EPS` of the triangle
    /// plane are misses; hits interpolate the corner normals by the
    /// barycentric coordinates of the hit point.
    fn hit(&self, ray: &mut Ray) -> Trace {
        let [v0, v1, v2] = &self.verts;
        let e1 = v1.position - v0.position;
        let e2 = v2.position - v0.position;
        let s = ray.origin - v0.position;

        let denom = e1.cross(&ray.dir).dot(&e2);
        if denom.abs() <= PARALLEL_EPS {
            return Trace::miss(ray.origin);
        }
        let inv = 1.0 / denom;
        let s_x_e2 = s.cross(&e2);
        let u = -s_x_e2.dot(&ray.dir) * inv;
        let v = e1.cross(&ray.dir).dot(&s) * inv;
        let t = -s_x_e2.dot(&e1) * inv;

        let (lo, hi) = ray.dist_bounds;
        if u < 0.0 || v < 0.0 || u + v > 1.0 || t < lo || t > hi {
            return Trace::miss(ray.origin);
        }
        let normal = (u * v1.normal + v * v2.normal + (1.0 - u - v) * v0.normal).normalize();
        ray.dist_bounds.1 = t;
        Trace::new(ray.origin, t, ray.at(t), normal)
    }
}

/// A triangle soup with its own BVH, ready for the scene.
#[derive(Debug, Clone)]
pub struct TriMesh {
    triangles: Bvh<Triangle>,
}

impl TriMesh {
    /// Build from explicit triangles.
    pub fn new(tris: Vec<Triangle>) -> Self {
        Self {
            triangles: Bvh::build(tris, 4),
        }
    }

    /// Flatten an edited mesh into triangles.
    ///
    /// Shading normals are the area-weighted average of each vertex's
    /// incident face normals. Boundary faces are skipped; faces of
    /// higher degree are fanned from their first corner (triangulate
    /// the mesh first for quality-controlled output).
    pub fn from_halfedge(mesh: &HalfedgeMesh) -> Self {
        let mut normal_sums: HashMap<glint_halfedge::VertexId, Vec3> = HashMap::new();
        for f in mesh.face_ids().filter(|&f| !mesh[f].boundary) {
            // Unnormalized polygon normal = 2 * area * unit normal.
            let ps = mesh.face_positions(f);
            let mut w = Vec3::zeros();
            for i in 0..ps.len() {
                w += ps[i].coords.cross(&ps[(i + 1) % ps.len()].coords);
            }
            for h in mesh.face_halfedges(f) {
                *normal_sums.entry(mesh[h].vertex).or_insert_with(Vec3::zeros) += w;
            }
        }

        let corner = |v: glint_halfedge::VertexId| -> TriVert {
            let n = normal_sums.get(&v).copied().unwrap_or_else(Vec3::zeros);
            let len = n.norm();
            TriVert {
                position: mesh[v].pos,
                normal: if len > 0.0 { n / len } else { n },
            }
        };

        let mut tris = Vec::new();
        for f in mesh.face_ids().filter(|&f| !mesh[f].boundary) {
            let ring = mesh.face_halfedges(f);
            let base = corner(mesh[ring[0]].vertex);
            for i in 1..ring.len() - 1 {
                tris.push(Triangle::new([
                    base,
                    corner(mesh[ring[i]].vertex),
                    corner(mesh[ring[i + 1]].vertex),
                ]));
            }
        }
        Self::new(tris)
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the mesh holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Tear down into the underlying triangles.
    pub fn destructure(self) -> Vec<Triangle> {
        self.triangles.destructure()
    }
}

impl Primitive for TriMesh {
    fn bbox(&self) -> BBox {
        self.triangles.bbox()
    }

    fn hit(&self, ray: &mut Ray) -> Trace {
        self.triangles.hit(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(position: Point3) -> TriVert {
        TriVert {
            position,
            normal: Vec3::z(),
        }
    }

    #[test]
    fn test_triangle_hit() {
        let tri = Triangle::new([
            flat(Point3::new(0.0, 0.0, 0.0)),
            flat(Point3::new(1.0, 0.0, 0.0)),
            flat(Point3::new(0.0, 1.0, 0.0)),
        ]);
        let mut ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let t = tri.hit(&mut ray);
        assert!(t.hit);
        assert!((t.distance - 1.0).abs() < 1e-12);
        assert!((t.position - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);
        assert!((t.normal - Vec3::z()).norm() < 1e-12);
        assert!((ray.dist_bounds.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_miss_outside() {
        let tri = Triangle::new([
            flat(Point3::new(0.0, 0.0, 0.0)),
            flat(Point3::new(1.0, 0.0, 0.0)),
            flat(Point3::new(0.0, 1.0, 0.0)),
        ]);
        // Past the hypotenuse: u + v > 1.
        let mut ray = Ray::new(Point3::new(0.75, 0.75, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!tri.hit(&mut ray).hit);
    }

    #[test]
    fn test_triangle_parallel_ray_misses() {
        let tri = Triangle::new([
            flat(Point3::new(0.0, 0.0, 0.0)),
            flat(Point3::new(1.0, 0.0, 0.0)),
            flat(Point3::new(0.0, 1.0, 0.0)),
        ]);
        let mut ray = Ray::new(Point3::new(-1.0, 0.25, 0.0), Vec3::x());
        assert!(!tri.hit(&mut ray).hit);
    }

    #[test]
    fn test_normal_interpolation() {
        let tri = Triangle::new([
            TriVert {
                position: Point3::new(0.0, 0.0, 0.0),
                normal: Vec3::new(1.0, 0.0, 1.0).normalize(),
            },
            TriVert {
                position: Point3::new(1.0, 0.0, 0.0),
                normal: Vec3::new(-1.0, 0.0, 1.0).normalize(),
            },
            TriVert {
                position: Point3::new(0.0, 1.0, 0.0),
                normal: Vec3::z(),
            },
        ]);
        // Dead center of the v0-v1 edge: the x components cancel.
        let mut ray = Ray::new(Point3::new(0.5, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let t = tri.hit(&mut ray);
        assert!(t.hit);
        assert!(t.normal.x.abs() < 1e-12);
        assert!((t.normal.norm() - 1.0).abs() < 1e-12);
        assert!(t.normal.z > 0.9);
    }

    #[test]
    fn test_mesh_from_halfedge_cube() {
        let cube = HalfedgeMesh::cube(2.0);
        let mesh = TriMesh::from_halfedge(&cube);
        assert_eq!(mesh.len(), 12);

        let mut ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = mesh.hit(&mut ray);
        assert!(t.hit);
        assert!((t.distance - 4.0).abs() < 1e-9);
        assert!((t.position.z - 1.0).abs() < 1e-9);

        let mut miss = Ray::new(Point3::new(5.0, 5.0, 5.0), Vec3::z());
        assert!(!mesh.hit(&mut miss).hit);
    }

    #[test]
    fn test_mesh_vertex_normals_point_outward() {
        let cube = HalfedgeMesh::cube(2.0);
        let tris = TriMesh::from_halfedge(&cube).destructure();
        for tri in tris {
            let b = tri.bbox();
            assert!(!b.is_empty());
        }
    }
}
