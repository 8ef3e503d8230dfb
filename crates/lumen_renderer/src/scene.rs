//! Scene: primitives plus the material table they index into.

use crate::hittable::{HitRecord, Hittable};
use crate::{Material, MaterialId, Sphere};
use lumen_math::{Interval, Ray};
use thiserror::Error;

/// Errors raised while assembling a scene.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("primitive references material {id} but the scene has {count} materials")]
    UnknownMaterial { id: usize, count: usize },
}

/// Closed set of geometric primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Sphere(Sphere),
}

impl Primitive {
    /// Material the primitive is bound to.
    pub fn material(&self) -> MaterialId {
        match self {
            Primitive::Sphere(sphere) => sphere.material(),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl Hittable for Primitive {
    #[inline]
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match self {
            Primitive::Sphere(sphere) => sphere.hit(ray, ray_t),
        }
    }
}

/// An immutable-during-render collection of primitives.
///
/// Intersection is a linear scan; no acceleration structure is built.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<Primitive>,
    materials: Vec<Material>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material and get the id primitives use to refer to it.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId::new(self.materials.len() - 1)
    }

    /// Add a primitive. Its material id must come from this scene.
    pub fn add(&mut self, object: impl Into<Primitive>) -> Result<(), SceneError> {
        let object = object.into();
        let id = object.material().index();
        if id >= self.materials.len() {
            return Err(SceneError::UnknownMaterial {
                id,
                count: self.materials.len(),
            });
        }
        self.objects.push(object);
        Ok(())
    }

    /// Look up a material by id.
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn objects(&self) -> &[Primitive] {
        &self.objects
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Remove all primitives and materials.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.materials.clear();
    }

    /// Get the number of primitives.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene has no primitives.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

impl Hittable for Scene {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest: Option<HitRecord> = None;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if let Some(rec) = object.hit(ray, ray_t.with_max(closest_so_far)) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }
}
