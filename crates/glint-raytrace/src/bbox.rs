//! Axis-aligned bounding boxes and the slab intersection test.

use crate::Ray;
use glint_math::{Point3, Vec3};

/// An axis-aligned box, possibly empty (inverted corners).
#[derive(Debug, Clone, Copy)]
pub struct BBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BBox {
    /// Box from explicit corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// The empty box: expanding it with anything yields that thing.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Whether no point has been enclosed yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point.
    pub fn enclose(&mut self, p: Point3) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// Grow to include another box.
    pub fn enclose_box(&mut self, other: &BBox) {
        if !other.is_empty() {
            self.enclose(other.min);
            self.enclose(other.max);
        }
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Total area of the six faces; zero for an empty box.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let d: Vec3 = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Slab test against `ray`, restricted to the interval in `times`.
    ///
    /// Each axis clips `times` by the two slab planes; an axis the ray
    /// runs parallel to instead rejects unless the origin lies between
    /// its planes, leaving the interval unconstrained. Returns whether
    /// the final interval is non-empty, writing it back into `times`
    /// (only then) so ordered traversal can compare entry distances.
    pub fn hit(&self, ray: &Ray, times: &mut (f64, f64)) -> bool {
        let (mut t0, mut t1) = *times;
        for axis in 0..3 {
            let o = ray.origin[axis];
            let d = ray.dir[axis];
            if d != 0.0 {
                let ta = (self.min[axis] - o) / d;
                let tb = (self.max[axis] - o) / d;
                let (lo, hi) = if ta <= tb { (ta, tb) } else { (tb, ta) };
                t0 = t0.max(lo);
                t1 = t1.min(hi);
                if t0 > t1 {
                    return false;
                }
            } else if o < self.min[axis] || o > self.max[axis] {
                return false;
            }
        }
        *times = (t0, t1);
        true
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}
