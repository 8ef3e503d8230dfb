//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Depth-bounded light transport through material scattering
//! - Sky gradient background
//! - Anti-aliasing via multi-sampling
//! - Bucket-parallel rendering with per-bucket random streams

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::output::{OutputError, PixelSink};
use crate::{Camera, Hittable, Scene};
use log::{debug, info, warn};
use lumen_math::{Color, Interval, Ray};
use rand::RngCore;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Smallest accepted hit distance; rejects self-intersection at a bounce origin.
pub const T_MIN: f32 = 0.001;

const HORIZON: Color = Color::new(1.0, 1.0, 1.0);
const ZENITH: Color = Color::new(0.5, 0.7, 1.0);

/// Errors that abort a render.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render cancelled after {completed} of {total} buckets")]
    Cancelled { completed: usize, total: usize },

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Shared flag for cooperative cancellation. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every render holding this token to stop at its next bucket.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress side channel, called from worker threads.
pub trait RenderProgress: Sync {
    /// `pixels` more pixels are finished.
    fn advance(&self, pixels: u64);

    /// The render stopped, complete or not.
    fn finish(&self) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl RenderProgress for NoProgress {
    fn advance(&self, _pixels: u64) {}
}

/// How a render is scheduled. Does not affect the image except via `seed`
/// and `bucket_size`.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Base seed for every bucket's random stream
    pub seed: u64,
    /// Edge length of square render buckets in pixels
    pub bucket_size: u32,
    /// Worker threads; `None` uses rayon's global pool
    pub threads: Option<usize>,
    pub cancel: CancelToken,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            bucket_size: DEFAULT_BUCKET_SIZE,
            threads: None,
            cancel: CancelToken::new(),
        }
    }
}

/// Sky gradient: white at the horizon blending to blue at the zenith.
pub fn background(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    (1.0 - a) * HORIZON + a * ZENITH
}

/// Compute the color seen by a ray.
///
/// Follows at most `depth` scattering events. Each bounce multiplies the
/// carried attenuation; a miss returns the attenuated background, while
/// absorption or an exhausted depth budget returns black. Written as a loop
/// so large depths do not grow the stack.
pub fn ray_color(ray: &Ray, scene: &Scene, depth: u32, rng: &mut dyn RngCore) -> Color {
    let mut throughput = Color::ONE;
    let mut ray = *ray;

    for _ in 0..depth {
        let Some(rec) = scene.hit(&ray, Interval::new(T_MIN, f32::INFINITY)) else {
            return throughput * background(&ray);
        };

        let Some(material) = scene.material(rec.material) else {
            // Scene::add rejects dangling ids, so this is unreachable in practice
            return Color::ZERO;
        };

        match material.scatter(&ray, &rec, rng) {
            Some(result) => {
                throughput *= result.attenuation;
                ray = result.scattered;
            }
            None => return Color::ZERO,
        }
    }

    // Bounce limit exceeded, no more light is gathered
    Color::ZERO
}

/// Render a single pixel with multi-sampling.
pub fn render_pixel(camera: &Camera, scene: &Scene, i: u32, j: u32, rng: &mut dyn RngCore) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel() {
        // Camera.get_ray already adds random offset for anti-aliasing
        let ray = camera.get_ray(i, j, rng);
        pixel_color += ray_color(&ray, scene, camera.max_depth(), rng);
    }

    pixel_color * camera.samples_scale()
}

/// Linear-color image in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width as usize) * (height as usize)],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Pixels top-to-bottom, left-to-right.
    pub fn pixels(&self) -> impl Iterator<Item = &Color> + '_ {
        self.pixels.iter()
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (row, colors) in result.pixels.chunks(bucket.width as usize).enumerate() {
            let start = self.index(bucket.x, bucket.y + row as u32);
            self.pixels[start..start + colors.len()].copy_from_slice(colors);
        }
    }

    /// Stream every pixel into `sink` in emission order.
    pub fn write_to(&self, sink: &mut dyn PixelSink) -> Result<(), OutputError> {
        sink.begin(self.width, self.height)?;
        for color in self.pixels() {
            sink.write_pixel(*color)?;
        }
        sink.finish()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

/// Render the entire scene to an image buffer.
pub fn render(scene: &Scene, camera: &Camera, options: &RenderOptions) -> Result<ImageBuffer, RenderError> {
    render_with_progress(scene, camera, options, &NoProgress)
}

/// Render the entire scene, reporting finished pixels to `progress`.
///
/// Buckets run in parallel, each with its own random stream derived from
/// `options.seed`, so the result is identical for any thread count.
pub fn render_with_progress(
    scene: &Scene,
    camera: &Camera,
    options: &RenderOptions,
    progress: &dyn RenderProgress,
) -> Result<ImageBuffer, RenderError> {
    let (width, height) = (camera.image_width(), camera.image_height());
    let buckets = generate_buckets(width, height, options.bucket_size);
    let cancel = &options.cancel;

    info!(
        "Rendering {}x{} @ {} spp, depth {}, {} primitives, {} buckets",
        width,
        height,
        camera.samples_per_pixel(),
        camera.max_depth(),
        scene.len(),
        buckets.len()
    );
    let start = Instant::now();

    let trace = || -> Vec<Option<BucketResult>> {
        buckets
            .par_iter()
            .map(|bucket| {
                if cancel.is_cancelled() {
                    return None;
                }
                let mut rng = bucket.rng(options.seed);
                let pixels = render_bucket(bucket, camera, scene, &mut rng);
                progress.advance(u64::from(bucket.pixel_count()));
                debug!("bucket {} at ({}, {}) done", bucket.index, bucket.x, bucket.y);
                Some(BucketResult::new(*bucket, pixels))
            })
            .collect()
    };

    let results = match options.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(trace),
        None => trace(),
    };
    progress.finish();

    let completed = results.iter().filter(|r| r.is_some()).count();
    if completed < buckets.len() {
        warn!("Render cancelled with {}/{} buckets done", completed, buckets.len());
        return Err(RenderError::Cancelled {
            completed,
            total: buckets.len(),
        });
    }

    let mut image = ImageBuffer::new(width, height);
    for result in results.iter().flatten() {
        image.write_bucket(result);
    }

    info!("Image rendered in {:.2?}", start.elapsed());
    Ok(image)
}

/// Render, then stream the pixels into `sink` in row-major order.
pub fn render_to_sink(
    scene: &Scene,
    camera: &Camera,
    options: &RenderOptions,
    progress: &dyn RenderProgress,
    sink: &mut dyn PixelSink,
) -> Result<(), RenderError> {
    let image = render_with_progress(scene, camera, options, progress)?;
    image.write_to(sink)?;
    Ok(())
}
