#![warn(missing_docs)]

//! Math types for the glint geometry kernels.
//!
//! Thin wrappers around nalgebra providing the shared vocabulary of the
//! mesh editor and the ray tracer: points, vectors, directions, 4x4
//! matrices, and affine transforms.

use nalgebra::{Matrix4, Unit, Vector2, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D space (screen/parameter coordinates).
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// A 4x4 matrix (quadrics, homogeneous transforms).
pub type Mat4 = Matrix4<f64>;

/// A vector in homogeneous 4-space.
pub type Vec4 = Vector4<f64>;

/// A 4x4 affine transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Mat4,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Mat4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Mat4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Mat4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Mat4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Camera-to-world transform for a camera at `eye` looking at `target`.
    ///
    /// The camera frame is right-handed with the view direction along -Z,
    /// so applying this transform maps view-space points into world space.
    pub fn look_at(eye: Point3, target: Point3, up: Vec3) -> Self {
        let back = (eye - target).normalize();
        let right = up.cross(&back).normalize();
        let true_up = back.cross(&right);
        let mut m = Mat4::identity();
        for i in 0..3 {
            m[(i, 0)] = right[i];
            m[(i, 1)] = true_up[i];
            m[(i, 2)] = back[i];
            m[(i, 3)] = eye[i];
        }
        Self { matrix: m }
    }

    /// Compose: apply `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vec4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vec4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Normal of the polygon with the given boundary positions.
///
/// Sum of successive cross products (Newell-style), normalized. Stable
/// for non-planar polygons, which face centroids and bevels rely on.
pub fn polygon_normal(positions: &[Point3]) -> Vec3 {
    let n = positions.len();
    let mut normal = Vec3::zeros();
    for i in 0..n {
        let a = positions[i].coords;
        let b = positions[(i + 1) % n].coords;
        normal += a.cross(&b);
    }
    let len = normal.norm();
    if len > 0.0 {
        normal / len
    } else {
        normal
    }
}

/// Centroid (arithmetic mean) of a set of positions.
pub fn centroid(positions: &[Point3]) -> Point3 {
    let mut sum = Vec3::zeros();
    for p in positions {
        sum += p.coords;
    }
    Point3::from(sum / positions.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!((t.apply_point(&p) - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation_ignores_vectors() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let p = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert!((p - Point3::new(11.0, 22.0, 33.0)).norm() < 1e-12);
        let v = t.apply_vec(&Vec3::new(1.0, 2.0, 3.0));
        assert!((v - Vec3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_z_90() {
        let t = Transform::rotation_z(PI / 2.0);
        let p = t.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Transform::rotation_y(0.7).then(&Transform::translation(1.0, 2.0, 3.0));
        let inv = t.inverse().unwrap();
        let p = Point3::new(5.0, 6.0, 7.0);
        let back = inv.apply_point(&t.apply_point(&p));
        assert!((back - p).norm() < 1e-12);
    }

    #[test]
    fn test_look_at_maps_view_axes() {
        // Camera at +10z looking at the origin: view -Z maps to world -Z.
        let t = Transform::look_at(
            Point3::new(0.0, 0.0, 10.0),
            Point3::origin(),
            Vec3::y(),
        );
        let o = t.apply_point(&Point3::origin());
        assert!((o - Point3::new(0.0, 0.0, 10.0)).norm() < 1e-12);
        let fwd = t.apply_vec(&Vec3::new(0.0, 0.0, -1.0));
        assert!((fwd - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
        let up = t.apply_vec(&Vec3::y());
        assert!((up - Vec3::y()).norm() < 1e-12);
    }

    #[test]
    fn test_polygon_normal_ccw_square() {
        let quad = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = polygon_normal(&quad);
        assert!((n - Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn test_centroid() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        assert!((centroid(&pts) - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }
}
