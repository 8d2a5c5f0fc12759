//! Hit records.

use glint_math::{Point3, Vec3};

/// The result of a hit test: a miss, or the nearest intersection found.
#[derive(Debug, Clone, Copy)]
pub struct Trace {
    /// Whether anything was hit.
    pub hit: bool,
    /// Distance along the ray to the hit.
    pub distance: f64,
    /// World-space hit point.
    pub position: Point3,
    /// Shading normal at the hit.
    pub normal: Vec3,
    /// The originating ray's origin, for secondary-ray bookkeeping.
    pub origin: Point3,
}

impl Trace {
    /// A miss from the given ray origin.
    pub fn miss(origin: Point3) -> Self {
        Self {
            hit: false,
            distance: 0.0,
            position: Point3::origin(),
            normal: Vec3::zeros(),
            origin,
        }
    }

    /// A hit record.
    pub fn new(origin: Point3, distance: f64, position: Point3, normal: Vec3) -> Self {
        Self {
            hit: true,
            distance,
            position,
            normal,
            origin,
        }
    }

    /// Keep the closer of two hits; a miss loses to anything.
    pub fn min(a: Trace, b: Trace) -> Trace {
        if !a.hit {
            b
        } else if !b.hit || a.distance <= b.distance {
            a
        } else {
            b
        }
    }
}
