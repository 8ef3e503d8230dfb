//! Camera configuration and ray generation.

use crate::sampling::{random_in_unit_disk, sample_square};
use log::{debug, warn};
use lumen_math::{Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Largest accepted image width or height in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// User-facing camera settings. Set before rendering, never mutated during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Ratio of image width over height
    pub aspect_ratio: f32,
    /// Rendered image width in pixels
    pub image_width: u32,
    /// Random samples per pixel (anti-aliasing)
    pub samples_per_pixel: u32,
    /// Maximum number of ray bounces
    pub max_depth: u32,
    /// Vertical field of view in degrees
    pub vfov: f32,
    pub lookfrom: Vec3,
    pub lookat: Vec3,
    /// Camera-relative "up" direction
    pub vup: Vec3,
    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f32,
    /// Distance from `lookfrom` to the plane of perfect focus
    pub focus_dist: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            image_width: 100,
            samples_per_pixel: 10,
            max_depth: 10,
            vfov: 90.0,
            lookfrom: Vec3::ZERO,
            lookat: Vec3::NEG_Z,
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_dist: 10.0,
        }
    }
}

impl CameraConfig {
    /// Set image width and aspect ratio.
    pub fn with_resolution(mut self, aspect_ratio: f32, image_width: u32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.image_width = image_width;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, lookfrom: Vec3, lookat: Vec3, vup: Vec3) -> Self {
        self.lookfrom = lookfrom;
        self.lookat = lookat;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Replace values that cannot produce an image with safe minimums.
    fn sanitize(&mut self) {
        if self.image_width == 0 {
            warn!("image_width 0 clamped to 1");
            self.image_width = 1;
        }
        if self.samples_per_pixel == 0 {
            warn!("samples_per_pixel 0 clamped to 1");
            self.samples_per_pixel = 1;
        }
        if self.image_width > MAX_IMAGE_DIMENSION {
            warn!("image_width {} clamped to {}", self.image_width, MAX_IMAGE_DIMENSION);
            self.image_width = MAX_IMAGE_DIMENSION;
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            warn!("aspect_ratio {} replaced with 1.0", self.aspect_ratio);
            self.aspect_ratio = 1.0;
        }
        let min_aspect = self.image_width as f32 / MAX_IMAGE_DIMENSION as f32;
        if self.aspect_ratio < min_aspect {
            warn!(
                "aspect_ratio {} would exceed {} rows, using {}",
                self.aspect_ratio, MAX_IMAGE_DIMENSION, min_aspect
            );
            self.aspect_ratio = min_aspect;
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            warn!("vfov {} outside (0, 180), using 90", self.vfov);
            self.vfov = 90.0;
        }
        if !(self.focus_dist.is_finite() && self.focus_dist > 0.0) {
            warn!("focus_dist {} replaced with 1.0", self.focus_dist);
            self.focus_dist = 1.0;
        }
        if !(self.defocus_angle.is_finite() && self.defocus_angle >= 0.0) {
            warn!("defocus_angle {} replaced with 0", self.defocus_angle);
            self.defocus_angle = 0.0;
        }
    }
}

/// Camera with its view geometry derived from a [`CameraConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    config: CameraConfig,

    // Derived by initialize()
    image_height: u32,
    samples_scale: f32,
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a camera and derive its view geometry.
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            config,
            image_height: 1,
            samples_scale: 1.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        };
        camera.initialize();
        camera
    }

    /// Recompute every derived value from the configuration.
    ///
    /// Depends only on the configuration, so repeated calls give identical
    /// results.
    pub fn initialize(&mut self) {
        self.config.sanitize();
        let cfg = &self.config;

        self.image_height = ((cfg.image_width as f32 / cfg.aspect_ratio) as u32).clamp(1, MAX_IMAGE_DIMENSION);
        self.samples_scale = 1.0 / cfg.samples_per_pixel as f32;
        self.center = cfg.lookfrom;

        // Calculate viewport dimensions
        let theta = cfg.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * cfg.focus_dist;
        let viewport_width = viewport_height * (cfg.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (cfg.lookfrom - cfg.lookat).try_normalize().unwrap_or_else(|| {
            warn!("lookfrom equals lookat, looking down -Z");
            Vec3::Z
        });
        self.u = cfg
            .vup
            .cross(self.w)
            .try_normalize()
            .unwrap_or_else(|| {
                warn!("vup is parallel to the view direction, picking an arbitrary up");
                self.w.any_orthonormal_vector()
            });
        self.v = self.w.cross(self.u);

        // Vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        self.pixel_delta_u = viewport_u / cfg.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left =
            self.center - cfg.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = self.defocus_disk_radius();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;

        debug!(
            "camera {}x{} center={:?} pixel00={:?} du={:?} dv={:?} defocus_radius={}",
            cfg.image_width,
            self.image_height,
            self.center,
            self.pixel00_loc,
            self.pixel_delta_u,
            self.pixel_delta_v,
            defocus_radius
        );
    }

    /// Generate a jittered ray for pixel (i, j).
    ///
    /// The sample point is uniformly offset within the pixel square; with a
    /// positive defocus angle the origin is sampled on the defocus disk.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.config.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// World-space center of pixel (i, j) on the focus plane.
    pub fn pixel_center(&self, i: u32, j: u32) -> Vec3 {
        self.pixel00_loc + (i as f32) * self.pixel_delta_u + (j as f32) * self.pixel_delta_v
    }

    /// Un-jittered ray from the camera center through pixel (i, j).
    pub fn primary_ray(&self, i: u32, j: u32) -> Ray {
        Ray::new(self.center, self.pixel_center(i, j) - self.center)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    pub fn defocus_disk_radius(&self) -> f32 {
        self.config.focus_dist * (self.config.defocus_angle / 2.0).to_radians().tan()
    }

    /// The (sanitized) configuration this camera was built from.
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn image_width(&self) -> u32 {
        self.config.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.config.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.config.max_depth
    }

    /// Get the samples scale factor (1 / samples_per_pixel).
    pub fn samples_scale(&self) -> f32 {
        self.samples_scale
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn pixel00_loc(&self) -> Vec3 {
        self.pixel00_loc
    }

    pub fn pixel_delta_u(&self) -> Vec3 {
        self.pixel_delta_u
    }

    pub fn pixel_delta_v(&self) -> Vec3 {
        self.pixel_delta_v
    }

    /// Orthonormal camera basis `(u, v, w)`: right, up, backwards.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
