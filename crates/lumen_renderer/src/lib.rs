//! Lumen renderer - CPU path tracing for sphere scenes.
//!
//! A Monte Carlo path tracer: the camera jitters rays per pixel (and over
//! a defocus disk for depth of field), the scene reports the nearest sphere
//! hit, materials decide how light scatters, and the integrator follows
//! each path until it escapes to the sky or runs out of bounces.

mod bucket;
mod camera;
mod hittable;
mod material;
mod output;
mod renderer;
pub mod sampling;
mod scene;
mod sphere;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use camera::{Camera, CameraConfig, MAX_IMAGE_DIMENSION};
pub use hittable::{HitRecord, Hittable};
pub use material::{reflect, reflectance, refract, Dielectric, Lambertian, Material, MaterialId, Metal, ScatterResult};
pub use output::{color_to_rgb8, linear_to_gamma, OutputError, PixelSink, PngSink, PpmSink};
pub use renderer::{
    background, ray_color, render, render_pixel, render_to_sink, render_with_progress, CancelToken, ImageBuffer,
    NoProgress, RenderError, RenderOptions, RenderProgress, T_MIN,
};
pub use scene::{Primitive, Scene, SceneError};
pub use sphere::Sphere;

/// Re-export math types from lumen_math
pub use lumen_math::{Color, Interval, Ray, Vec3};
