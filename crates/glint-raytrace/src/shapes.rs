//! Analytic shapes and the scene-level primitive variant.

use crate::{BBox, Primitive, Ray, Trace, TriMesh};
use glint_math::Point3;

/// A sphere of the given radius centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    /// Sphere radius.
    pub radius: f64,
}

impl Primitive for Sphere {
    fn bbox(&self) -> BBox {
        let r = self.radius;
        let mut b = BBox::empty();
        b.enclose(Point3::new(-r, -r, -r));
        b.enclose(Point3::new(r, r, r));
        b
    }

    /// Solve `|o + t d|^2 = r^2` and report the nearest root inside the
    /// ray's interval. If only the far root qualifies the ray started
    /// inside the sphere and the exit is the hit.
    fn hit(&self, ray: &mut Ray) -> Trace {
        let o = ray.origin.coords;
        let b = o.dot(&ray.dir);
        let c = o.norm_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return Trace::miss(ray.origin);
        }
        let sqrt_disc = disc.sqrt();
        let (lo, hi) = ray.dist_bounds;
        for t in [-b - sqrt_disc, -b + sqrt_disc] {
            if t > lo && t < hi {
                let position = ray.at(t);
                ray.dist_bounds.1 = t;
                return Trace::new(ray.origin, t, position, position.coords / self.radius);
            }
        }
        Trace::miss(ray.origin)
    }
}

/// A scene-level primitive: what the top-level BVH is built over.
///
/// A tagged variant rather than trait objects: the scene only ever
/// holds these two kinds, and the BVH is generic over the element type.
#[derive(Debug, Clone)]
pub enum Object {
    /// An analytic sphere placed in the world.
    Sphere {
        /// World-space center.
        center: Point3,
        /// The unit-frame sphere.
        shape: Sphere,
    },
    /// A triangle mesh with its own interior BVH.
    Mesh(TriMesh),
}

impl Primitive for Object {
    fn bbox(&self) -> BBox {
        match self {
            Object::Sphere { center, shape } => {
                let r = shape.radius;
                let mut b = BBox::empty();
                b.enclose(center - glint_math::Vec3::new(r, r, r));
                b.enclose(center + glint_math::Vec3::new(r, r, r));
                b
            }
            Object::Mesh(mesh) => mesh.bbox(),
        }
    }

    fn hit(&self, ray: &mut Ray) -> Trace {
        match self {
            Object::Sphere { center, shape } => {
                // Intersect in the sphere's local frame, then restore.
                let mut local = *ray;
                local.origin = Point3::from(ray.origin - center);
                let mut t = shape.hit(&mut local);
                ray.dist_bounds = local.dist_bounds;
                if t.hit {
                    t.position += center.coords;
                    t.origin = ray.origin;
                }
                t
            }
            Object::Mesh(mesh) => mesh.hit(ray),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_math::Vec3;

    #[test]
    fn test_sphere_hit_head_on() {
        let s = Sphere { radius: 1.0 };
        let mut ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vec3::x());
        let t = s.hit(&mut ray);
        assert!(t.hit);
        assert!((t.distance - 9.0).abs() < 1e-12);
        assert!((t.normal - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        // The interval tightened for pruning.
        assert!((ray.dist_bounds.1 - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_from_center_returns_exit() {
        // Ray starting at the center: the entry root is negative, so
        // the exit at t = r is the hit.
        let s = Sphere { radius: 1.0 };
        let mut ray = Ray::new(Point3::origin(), Vec3::x());
        let t = s.hit(&mut ray);
        assert!(t.hit);
        assert!((t.distance - 1.0).abs() < 1e-12);
        assert!((t.normal - Vec3::x()).norm() < 1e-12);
        assert!((t.position - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_sphere_miss() {
        let s = Sphere { radius: 1.0 };
        let mut ray = Ray::new(Point3::new(-10.0, 5.0, 0.0), Vec3::x());
        assert!(!s.hit(&mut ray).hit);
    }

    #[test]
    fn test_sphere_respects_bounds() {
        let s = Sphere { radius: 1.0 };
        // Both roots (9 and 11) sit past t_max.
        let mut ray = Ray::with_bounds(Point3::new(-10.0, 0.0, 0.0), Vec3::x(), 0.0, 5.0);
        assert!(!s.hit(&mut ray).hit);
        // Only the far root is inside the interval.
        let mut ray = Ray::with_bounds(Point3::new(-10.0, 0.0, 0.0), Vec3::x(), 10.0, 20.0);
        let t = s.hit(&mut ray);
        assert!(t.hit);
        assert!((t.distance - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_placed_sphere() {
        let obj = Object::Sphere {
            center: Point3::new(0.0, 3.0, 0.0),
            shape: Sphere { radius: 1.0 },
        };
        let mut ray = Ray::new(Point3::origin(), Vec3::y());
        let t = obj.hit(&mut ray);
        assert!(t.hit);
        assert!((t.distance - 2.0).abs() < 1e-12);
        assert!((t.position - Point3::new(0.0, 2.0, 0.0)).norm() < 1e-12);
        assert!((t.normal - Vec3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
        assert!((t.origin - Point3::origin()).norm() < 1e-12);
    }
}
