//! Surface scattering models.
//!
//! `Material` is a closed set of variants dispatched by `match`. Primitives
//! refer to materials by [`MaterialId`], an index into the owning scene's
//! material table, so many spheres can share one material.

use crate::hittable::HitRecord;
use crate::sampling::{gen_f32, random_in_unit_sphere, random_unit_vector};
use log::warn;
use lumen_math::{Color, Ray, Vec3};
use rand::RngCore;

/// Index of a material in a [`crate::Scene`]'s material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

impl MaterialId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Outcome of a scattering event that was not absorbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterResult {
    /// Per-channel energy kept by the bounce
    pub attenuation: Color,
    /// Outgoing ray, starting at the hit point
    pub scattered: Ray,
}

/// Material attached to a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Lambertian(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
}

impl Material {
    pub fn lambertian(albedo: Color) -> Self {
        Material::Lambertian(Lambertian::new(albedo))
    }

    pub fn metal(albedo: Color, fuzz: f32) -> Self {
        Material::Metal(Metal::new(albedo, fuzz))
    }

    pub fn dielectric(ior: f32) -> Self {
        Material::Dielectric(Dielectric::new(ior))
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        match self {
            Material::Lambertian(m) => m.scatter(rec, rng),
            Material::Metal(m) => m.scatter(ray_in, rec, rng),
            Material::Dielectric(m) => m.scatter(ray_in, rec, rng),
        }
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }

    /// Always scatters, biased toward the normal.
    pub fn scatter(&self, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, scatter_direction),
        })
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        // NaN falls through max/min as 0.0
        Self {
            albedo,
            fuzz: fuzz.max(0.0).min(1.0),
        }
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }

    pub fn fuzz(&self) -> f32 {
        self.fuzz
    }

    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction(), rec.normal);
        let direction = reflected + self.fuzz * random_in_unit_sphere(rng);

        // Fuzzed below the surface: absorbed
        if direction.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dielectric {
    /// Index of refraction relative to the surrounding medium
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    ///
    /// A non-finite or non-positive index is replaced with 1.0.
    pub fn new(ior: f32) -> Self {
        if !(ior.is_finite() && ior > 0.0) {
            warn!("dielectric ior {} replaced with 1.0", ior);
            return Self { ior: 1.0 };
        }
        Self { ior }
    }

    pub fn ior(&self) -> f32 {
        self.ior
    }

    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let refraction_ratio = if rec.front_face { 1.0 / self.ior } else { self.ior };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        // Total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction = if cannot_refract || reflectance(cos_theta, refraction_ratio) > gen_f32(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, refraction_ratio)
        };

        Some(ScatterResult {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface (Snell's law).
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance.
#[inline]
pub fn reflectance(cosine: f32, refraction_ratio: f32) -> f32 {
    let r0 = ((1.0 - refraction_ratio) / (1.0 + refraction_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(normal: Vec3, front_face: bool) -> HitRecord {
        HitRecord {
            p: Vec3::ZERO,
            normal,
            t: 1.0,
            front_face,
            material: MaterialId::new(0),
        }
    }

    #[test]
    fn test_lambertian_always_scatters() {
        let mut rng = StdRng::seed_from_u64(42);
        let albedo = Color::new(0.8, 0.3, 0.3);
        let material = Material::lambertian(albedo);
        let rec = record(Vec3::Y, true);
        let ray_in = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);

        for _ in 0..500 {
            let result = material.scatter(&ray_in, &rec, &mut rng).expect("lambertian never absorbs");
            assert_eq!(result.attenuation, albedo);
            assert_eq!(result.scattered.origin(), rec.p);
            assert!(result.scattered.direction().length_squared() > 0.0);
            assert!(result.scattered.direction().dot(rec.normal) >= -1e-5);
        }
    }

    #[test]
    fn test_metal_mirror_reflection() {
        let mut rng = StdRng::seed_from_u64(42);
        let material = Material::metal(Color::new(0.8, 0.8, 0.8), 0.0);
        let rec = record(Vec3::Y, true);
        let ray_in = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));

        let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
        assert_eq!(result.scattered.direction(), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(result.attenuation, Color::new(0.8, 0.8, 0.8));
    }

    #[test]
    fn test_metal_grazing_reflection_is_absorbed() {
        let mut rng = StdRng::seed_from_u64(42);
        let material = Material::metal(Color::ONE, 0.0);
        let rec = record(Vec3::Y, true);
        // Parallel to the surface: reflection has zero normal component
        let ray_in = Ray::new(Vec3::ZERO, Vec3::X);

        assert!(material.scatter(&ray_in, &rec, &mut rng).is_none());
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        assert_eq!(Metal::new(Color::ONE, 3.0).fuzz(), 1.0);
        assert_eq!(Metal::new(Color::ONE, -1.0).fuzz(), 0.0);
        assert_eq!(Metal::new(Color::ONE, 0.3).fuzz(), 0.3);
    }

    #[test]
    fn test_metal_fuzzed_rays_stay_above_surface() {
        let mut rng = StdRng::seed_from_u64(42);
        let material = Material::metal(Color::ONE, 1.0);
        let rec = record(Vec3::Y, true);
        let ray_in = Ray::new(Vec3::new(-1.0, 0.2, 0.0), Vec3::new(1.0, -0.2, 0.0));

        let mut absorbed = 0;
        for _ in 0..500 {
            match material.scatter(&ray_in, &rec, &mut rng) {
                Some(result) => assert!(result.scattered.direction().dot(rec.normal) > 0.0),
                None => absorbed += 1,
            }
        }
        // A shallow incoming angle with full fuzz loses a share of rays
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let mut rng = StdRng::seed_from_u64(42);
        let material = Material::dielectric(1.5);
        // Exiting the glass: back face, ratio 1.5, sin(theta) = 0.9
        let rec = record(Vec3::Y, false);
        let cos = (1.0f32 - 0.81).sqrt();
        let ray_in = Ray::new(Vec3::ZERO, Vec3::new(0.9, -cos, 0.0));

        for _ in 0..100 {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            let d = result.scattered.direction();
            assert!((d - Vec3::new(0.9, cos, 0.0)).length() < 1e-5);
            assert_eq!(result.attenuation, Color::ONE);
        }
    }

    #[test]
    fn test_dielectric_normal_incidence_mostly_refracts() {
        let mut rng = StdRng::seed_from_u64(42);
        let material = Material::dielectric(1.5);
        let rec = record(Vec3::Y, true);
        let ray_in = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -2.0, 0.0));

        let mut refracted = 0;
        for _ in 0..1000 {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            assert_eq!(result.attenuation, Color::ONE);
            if result.scattered.direction().y < 0.0 {
                assert!((result.scattered.direction() - Vec3::NEG_Y).length() < 1e-5);
                refracted += 1;
            }
        }
        // Schlick gives 4% reflectance head-on for glass
        assert!(refracted > 900, "refracted {refracted} of 1000");
    }

    #[test]
    fn test_reflectance_limits() {
        assert!(reflectance(1.0, 1.0).abs() < 1e-6);
        assert!((reflectance(0.0, 1.5) - 1.0).abs() < 1e-6);
        assert!((reflectance(1.0, 1.0 / 1.5) - 0.04).abs() < 1e-4);
    }

    #[test]
    fn test_refract_matched_index_passes_straight() {
        let uv = Vec3::new(1.0, -1.0, 0.0).normalize();
        let out = refract(uv, Vec3::Y, 1.0);
        assert!((out - uv).length() < 1e-5);
    }

    #[test]
    fn test_material_id_roundtrip() {
        assert_eq!(MaterialId::new(5).index(), 5);
    }

    /// Generator replaying a fixed cycle of `u32` draws.
    struct ScriptedRng {
        values: Vec<u32>,
        next: usize,
    }

    impl ScriptedRng {
        /// Draws that `gen_f32` maps to exactly the given fractions.
        fn from_fractions(fractions: &[f32]) -> Self {
            // Standard f32 sampling keeps the top 24 bits of next_u32
            let values = fractions.iter().map(|f| ((f * (1u32 << 24) as f32) as u32) << 8).collect();
            Self { values, next: 0 }
        }
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            let value = self.values[self.next % self.values.len()];
            self.next += 1;
            value
        }

        fn next_u64(&mut self) -> u64 {
            (u64::from(self.next_u32()) << 32) | u64::from(self.next_u32())
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(4) {
                let bytes = self.next_u32().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_scripted_rng_draws() {
        let mut rng = ScriptedRng::from_fractions(&[0.5, 0.0, 0.5]);
        assert_eq!(random_unit_vector(&mut rng), Vec3::NEG_Y);
    }

    #[test]
    fn test_lambertian_degenerate_direction_falls_back_to_normal() {
        // Unit vector sample lands exactly on -normal
        let mut rng = ScriptedRng::from_fractions(&[0.5, 0.0, 0.5]);
        let material = Lambertian::new(Color::splat(0.5));
        let rec = record(Vec3::Y, true);

        let result = material.scatter(&rec, &mut rng).expect("lambertian never absorbs");
        assert_eq!(result.scattered.direction(), rec.normal);
        assert_eq!(result.scattered.origin(), rec.p);
    }

    #[test]
    fn test_dielectric_invalid_ior_replaced() {
        for ior in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert_eq!(Dielectric::new(ior).ior(), 1.0, "ior {ior}");
        }
        assert_eq!(Dielectric::new(1.5).ior(), 1.5);
    }

    #[test]
    fn test_dielectric_zero_ior_scatters_finite() {
        let mut rng = StdRng::seed_from_u64(42);
        let material = Material::dielectric(0.0);
        let ray_in = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);

        for front_face in [true, false] {
            let rec = record(Vec3::Z, front_face);
            for _ in 0..100 {
                let result = material.scatter(&ray_in, &rec, &mut rng).expect("dielectric never absorbs");
                assert!(result.scattered.direction().is_finite());
            }
        }
    }
}
