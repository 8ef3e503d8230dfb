//! Simple path tracer example.
//!
//! Renders the three-sphere material showcase and saves it as PPM.

use lumen_renderer::{
    render_to_sink, Camera, CameraConfig, Color, Material, NoProgress, PpmSink, RenderOptions, Scene, Sphere, Vec3,
};
use std::fs::File;
use std::io::BufWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Lumen Path Tracer - Simple Example");
    println!("==================================");

    let scene = build_scene()?;
    println!("Created {} spheres", scene.len());

    let camera = Camera::new(
        CameraConfig::default()
            .with_resolution(16.0 / 9.0, 400)
            .with_quality(50, 10)
            .with_position(Vec3::new(-2.0, 2.0, 1.0), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(20.0, 10.0, 3.4),
    );

    println!(
        "Rendering {}x{} @ {} spp...",
        camera.image_width(),
        camera.image_height(),
        camera.samples_per_pixel()
    );

    let start = std::time::Instant::now();
    let filename = "output.ppm";
    let mut sink = PpmSink::new(BufWriter::new(File::create(filename)?));
    render_to_sink(&scene, &camera, &RenderOptions::default(), &NoProgress, &mut sink)?;

    println!("Rendered in {:?}", start.elapsed());
    println!("Saved to {}", filename);
    Ok(())
}

fn build_scene() -> Result<Scene, lumen_renderer::SceneError> {
    let mut scene = Scene::new();

    let ground = scene.add_material(Material::lambertian(Color::new(0.8, 0.8, 0.0)));
    let center = scene.add_material(Material::lambertian(Color::new(0.1, 0.2, 0.5)));
    let glass = scene.add_material(Material::dielectric(1.5));
    let bubble = scene.add_material(Material::dielectric(1.0 / 1.5));
    let gold = scene.add_material(Material::metal(Color::new(0.8, 0.6, 0.2), 1.0));

    scene.add(Sphere::new(Vec3::new(0.0, -100.5, -1.0), 100.0, ground))?;
    scene.add(Sphere::new(Vec3::new(0.0, 0.0, -1.2), 0.5, center))?;
    scene.add(Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.5, glass))?;
    scene.add(Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.4, bubble))?;
    scene.add(Sphere::new(Vec3::new(1.0, 0.0, -1.0), 0.5, gold))?;

    Ok(scene)
}
