//! Pinhole camera ray generation.

use crate::Ray;
use glint_math::{Point2, Point3, Transform, Vec3};

/// A pinhole camera defined in view space (looking down -Z) and placed
/// in the world by its camera-to-world transform.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub vert_fov: f64,
    /// Image width over height.
    pub aspect_ratio: f64,
    /// Distance from the pinhole to the focal (sensor) plane.
    pub focal_dist: f64,
    /// Camera-to-world transform.
    pub iview: Transform,
}

impl Camera {
    /// Camera at the world origin looking down -Z.
    pub fn new(vert_fov: f64, aspect_ratio: f64) -> Self {
        Self {
            vert_fov,
            aspect_ratio,
            focal_dist: 1.0,
            iview: Transform::identity(),
        }
    }

    /// Place the camera at `eye` looking at `target`.
    pub fn look_at(mut self, eye: Point3, target: Point3, up: Vec3) -> Self {
        self.iview = Transform::look_at(eye, target, up);
        self
    }

    /// Ray through the normalized screen coordinate `(u, v)` in
    /// `[0,1]^2`, `(0,0)` at the bottom-left.
    ///
    /// The sensor's half-height at the focal plane is
    /// `tan(vert_fov / 2) * focal_dist` and the half-width is that
    /// times the aspect ratio; the screen coordinate picks a point on
    /// that plane, which the camera-to-world transform carries into the
    /// world along with the pinhole.
    pub fn generate_ray(&self, screen_coord: Point2) -> Ray {
        let half_h = (self.vert_fov.to_radians() * 0.5).tan() * self.focal_dist;
        let half_w = half_h * self.aspect_ratio;
        let sensor = Point3::new(
            (2.0 * screen_coord.x - 1.0) * half_w,
            (2.0 * screen_coord.y - 1.0) * half_h,
            -self.focal_dist,
        );
        let origin = self.iview.apply_point(&Point3::origin());
        let dir = self.iview.apply_point(&sensor) - origin;
        Ray::new(origin, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_looks_forward() {
        let cam = Camera::new(90.0, 1.0);
        let ray = cam.generate_ray(Point2::new(0.5, 0.5));
        assert!((ray.origin - Point3::origin()).norm() < 1e-12);
        assert!((ray.dir - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_corner_rays_span_the_fov() {
        // 90 degree vertical fov at focal distance 1: half-height 1.
        let cam = Camera::new(90.0, 2.0);
        let ray = cam.generate_ray(Point2::new(1.0, 1.0));
        let expect = Vec3::new(2.0, 1.0, -1.0).normalize();
        assert!((ray.dir - expect).norm() < 1e-12);

        let ray = cam.generate_ray(Point2::new(0.0, 0.0));
        let expect = Vec3::new(-2.0, -1.0, -1.0).normalize();
        assert!((ray.dir - expect).norm() < 1e-12);
    }

    #[test]
    fn test_focal_distance_does_not_change_direction() {
        let mut near = Camera::new(60.0, 1.5);
        near.focal_dist = 1.0;
        let mut far = near.clone();
        far.focal_dist = 7.5;
        let a = near.generate_ray(Point2::new(0.8, 0.3));
        let b = far.generate_ray(Point2::new(0.8, 0.3));
        assert!((a.dir - b.dir).norm() < 1e-12);
    }

    #[test]
    fn test_placed_camera() {
        let cam = Camera::new(90.0, 1.0).look_at(
            Point3::new(0.0, 0.0, 5.0),
            Point3::origin(),
            Vec3::y(),
        );
        let ray = cam.generate_ray(Point2::new(0.5, 0.5));
        assert!((ray.origin - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-12);
        assert!((ray.dir - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
    }
}
