//! Built-in scenes and the JSON scene format.

use crate::cli::SceneKind;
use lumen_renderer::sampling::{gen_f32, gen_range};
use lumen_renderer::{CameraConfig, Color, Material, MaterialId, Scene, SceneError, Sphere, Vec3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// A scene together with the camera it is meant to be viewed from.
#[derive(Debug, Clone)]
pub struct SceneSetup {
    pub scene: Scene,
    pub camera: CameraConfig,
}

/// Errors from loading a JSON scene file.
#[derive(Debug, Error)]
pub enum SceneFileError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scene JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sphere {index} uses undefined material {name:?}")]
    UndefinedMaterial { index: usize, name: String },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Build one of the built-in scenes. `seed` drives the cover scene layout.
pub fn builtin(kind: SceneKind, seed: u64) -> SceneSetup {
    match kind {
        SceneKind::Single => single(),
        SceneKind::Materials => materials(),
        SceneKind::Cover => cover(seed),
    }
}

fn ground(scene: &mut Scene, material: MaterialId) {
    add_sphere(scene, Vec3::new(0.0, -100.5, -1.0), 100.0, material);
}

/// Add a sphere whose material was just registered on the same scene.
fn add_sphere(scene: &mut Scene, center: Vec3, radius: f32, material: MaterialId) {
    if let Err(e) = scene.add(Sphere::new(center, radius, material)) {
        log::error!("Skipping sphere at {:?}: {}", center, e);
    }
}

/// One diffuse sphere resting on a ground sphere.
pub fn single() -> SceneSetup {
    let mut scene = Scene::new();
    let ground_mat = scene.add_material(Material::lambertian(Color::new(0.8, 0.8, 0.0)));
    let center_mat = scene.add_material(Material::lambertian(Color::new(0.5, 0.5, 0.5)));

    ground(&mut scene, ground_mat);
    add_sphere(&mut scene, Vec3::new(0.0, 0.0, -1.0), 0.5, center_mat);

    let camera = CameraConfig::default()
        .with_resolution(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_lens(90.0, 0.0, 1.0);

    SceneSetup { scene, camera }
}

/// Diffuse centre sphere flanked by a hollow glass sphere and fuzzy metal.
pub fn materials() -> SceneSetup {
    let mut scene = Scene::new();
    let ground_mat = scene.add_material(Material::lambertian(Color::new(0.8, 0.8, 0.0)));
    let center_mat = scene.add_material(Material::lambertian(Color::new(0.1, 0.2, 0.5)));
    let glass = scene.add_material(Material::dielectric(1.5));
    let bubble = scene.add_material(Material::dielectric(1.0 / 1.5));
    let metal = scene.add_material(Material::metal(Color::new(0.8, 0.6, 0.2), 1.0));

    ground(&mut scene, ground_mat);
    add_sphere(&mut scene, Vec3::new(0.0, 0.0, -1.2), 0.5, center_mat);
    add_sphere(&mut scene, Vec3::new(-1.0, 0.0, -1.0), 0.5, glass);
    add_sphere(&mut scene, Vec3::new(-1.0, 0.0, -1.0), 0.4, bubble);
    add_sphere(&mut scene, Vec3::new(1.0, 0.0, -1.0), 0.5, metal);

    let camera = CameraConfig::default()
        .with_resolution(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_position(Vec3::new(-2.0, 2.0, 1.0), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
        .with_lens(20.0, 10.0, 3.4);

    SceneSetup { scene, camera }
}

fn random_color(rng: &mut dyn RngCore, min: f32, max: f32) -> Color {
    Color::new(gen_range(rng, min, max), gen_range(rng, min, max), gen_range(rng, min, max))
}

/// Random field of small spheres around three large feature spheres.
pub fn cover(seed: u64) -> SceneSetup {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = Scene::new();

    let ground_mat = scene.add_material(Material::lambertian(Color::splat(0.5)));
    add_sphere(&mut scene, Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground_mat);

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f32(&mut rng);
            let center = Vec3::new(a as f32 + 0.9 * gen_f32(&mut rng), 0.2, b as f32 + 0.9 * gen_f32(&mut rng));

            // Keep clear of the metal feature sphere
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let material = if choose_mat < 0.8 {
                let albedo = random_color(&mut rng, 0.0, 1.0) * random_color(&mut rng, 0.0, 1.0);
                Material::lambertian(albedo)
            } else if choose_mat < 0.95 {
                let albedo = random_color(&mut rng, 0.5, 1.0);
                Material::metal(albedo, gen_range(&mut rng, 0.0, 0.5))
            } else {
                Material::dielectric(1.5)
            };
            let id = scene.add_material(material);
            add_sphere(&mut scene, center, 0.2, id);
        }
    }

    let glass = scene.add_material(Material::dielectric(1.5));
    add_sphere(&mut scene, Vec3::new(0.0, 1.0, 0.0), 1.0, glass);

    let diffuse = scene.add_material(Material::lambertian(Color::new(0.4, 0.2, 0.1)));
    add_sphere(&mut scene, Vec3::new(-4.0, 1.0, 0.0), 1.0, diffuse);

    let metal = scene.add_material(Material::metal(Color::new(0.7, 0.6, 0.5), 0.0));
    add_sphere(&mut scene, Vec3::new(4.0, 1.0, 0.0), 1.0, metal);

    let camera = CameraConfig::default()
        .with_resolution(16.0 / 9.0, 1200)
        .with_quality(500, 50)
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0);

    SceneSetup { scene, camera }
}

/// Material entry of a scene file, tagged by `"type"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDesc {
    Lambertian { albedo: Color },
    Metal { albedo: Color, fuzz: f32 },
    Dielectric { ior: f32 },
}

impl From<MaterialDesc> for Material {
    fn from(desc: MaterialDesc) -> Self {
        match desc {
            MaterialDesc::Lambertian { albedo } => Material::lambertian(albedo),
            MaterialDesc::Metal { albedo, fuzz } => Material::metal(albedo, fuzz),
            MaterialDesc::Dielectric { ior } => Material::dielectric(ior),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereDesc {
    pub center: Vec3,
    pub radius: f32,
    /// Key into the scene file's `materials` map
    pub material: String,
}

/// Top-level scene file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub camera: Option<CameraConfig>,
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialDesc>,
    #[serde(default)]
    pub spheres: Vec<SphereDesc>,
}

impl SceneDesc {
    /// Resolve material names and build the scene.
    pub fn build(&self) -> Result<SceneSetup, SceneFileError> {
        let mut scene = Scene::new();
        let ids: BTreeMap<&str, MaterialId> = self
            .materials
            .iter()
            .map(|(name, desc)| (name.as_str(), scene.add_material((*desc).into())))
            .collect();

        for (index, sphere) in self.spheres.iter().enumerate() {
            let material = *ids
                .get(sphere.material.as_str())
                .ok_or_else(|| SceneFileError::UndefinedMaterial {
                    index,
                    name: sphere.material.clone(),
                })?;
            scene.add(Sphere::new(sphere.center, sphere.radius, material))?;
        }

        Ok(SceneSetup {
            scene,
            camera: self.camera.clone().unwrap_or_default(),
        })
    }
}

/// Parse and build a scene from JSON text.
pub fn from_json_str(json: &str) -> Result<SceneSetup, SceneFileError> {
    let desc: SceneDesc = serde_json::from_str(json)?;
    desc.build()
}

/// Load a scene from a JSON file.
pub fn load(path: &Path) -> Result<SceneSetup, SceneFileError> {
    let json = std::fs::read_to_string(path)?;
    from_json_str(&json)
}
