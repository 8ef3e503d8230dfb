//! Sphere primitive for ray tracing.

use crate::hittable::{HitRecord, Hittable};
use crate::MaterialId;
use lumen_math::{Interval, Ray, Vec3};

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: MaterialId,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            material,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        // A degenerate sphere has no surface normal to report
        if self.radius <= 0.0 {
            return None;
        }

        // Half-angle form of the quadratic: a t^2 - 2h t + c = 0
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        Some(HitRecord::new(ray, root, outward_normal, self.material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONT: Interval = Interval::new(0.001, f32::INFINITY);

    fn unit_sphere() -> Sphere {
        Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, MaterialId::new(0))
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = sphere.hit(&ray, FRONT).expect("ray aims at the center");
        assert!((rec.t - 0.5).abs() < 0.001);
        assert!((rec.p - Vec3::new(0.0, 0.0, -0.5)).length() < 1e-6);
        assert!((rec.normal - Vec3::Z).length() < 1e-6);
        assert!(rec.front_face);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_sphere();

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(sphere.hit(&ray, FRONT).is_none());
    }

    #[test]
    fn test_sphere_hit_is_deterministic() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::new(0.1, 0.2, 0.0), Vec3::new(-0.05, -0.1, -1.0));

        let first = sphere.hit(&ray, FRONT).unwrap();
        for _ in 0..10 {
            assert_eq!(sphere.hit(&ray, FRONT).unwrap(), first);
        }
    }

    #[test]
    fn test_sphere_far_root_when_near_root_excluded() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        // Exclude the entry point at t = 0.5; the exit point at t = 1.5 remains
        let rec = sphere.hit(&ray, Interval::new(0.6, f32::INFINITY)).unwrap();
        assert!((rec.t - 1.5).abs() < 0.001);
        assert!(!rec.front_face);
        assert!(ray.direction().dot(rec.normal) <= 0.0);
    }

    #[test]
    fn test_sphere_both_roots_outside_interval() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert!(sphere.hit(&ray, Interval::new(0.001, 0.4)).is_none());
        assert!(sphere.hit(&ray, Interval::new(1.6, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_sphere_from_inside() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::X);

        let rec = sphere.hit(&ray, FRONT).unwrap();
        assert!((rec.t - 0.5).abs() < 0.001);
        assert!(!rec.front_face);
        assert!((rec.normal - Vec3::NEG_X).length() < 1e-6);
    }

    #[test]
    fn test_negative_radius_clamped() {
        let sphere = Sphere::new(Vec3::ZERO, -2.0, MaterialId::new(0));
        assert_eq!(sphere.radius(), 0.0);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(sphere.hit(&ray, FRONT).is_none());
    }

    #[test]
    fn test_zero_length_direction_never_hits() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::ZERO);
        assert!(sphere.hit(&ray, FRONT).is_none());
    }

    #[test]
    fn test_unnormalized_direction() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0));

        let rec = sphere.hit(&ray, FRONT).unwrap();
        // Parameter scales with direction length
        assert!((rec.t - 0.125).abs() < 1e-5);
        assert!((rec.normal.length() - 1.0).abs() < 1e-5);
    }
}
