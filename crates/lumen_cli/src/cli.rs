use clap::{Parser, ValueEnum};
use log::LevelFilter;
use lumen_renderer::{CameraConfig, Vec3, DEFAULT_BUCKET_SIZE};
use std::path::PathBuf;

/// Log levels selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Built-in scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// One diffuse sphere resting on a ground sphere
    Single,
    /// Diffuse, hollow glass and fuzzy metal spheres side by side
    Materials,
    /// Field of random small spheres around three large ones
    Cover,
}

/// Command line arguments.
///
/// Camera flags left unset keep the value chosen by the scene.
#[derive(Debug, Parser)]
#[command(name = "lumen", version)]
#[command(about = "A Monte Carlo path tracer for sphere scenes")]
pub struct Args {
    /// Built-in scene to render
    #[arg(long, value_enum, default_value = "cover")]
    pub scene: SceneKind,

    /// JSON scene description (replaces the built-in scene)
    #[arg(long)]
    pub scene_file: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image width divided by image height
    #[arg(long)]
    pub aspect_ratio: Option<f32>,

    /// Number of samples per pixel
    #[arg(long, short = 's')]
    pub samples_per_pixel: Option<u32>,

    /// Maximum number of ray bounces
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    pub vfov: Option<f32>,

    /// Camera position as "x,y,z"
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    pub lookfrom: Option<Vec3>,

    /// Point the camera looks at as "x,y,z"
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    pub lookat: Option<Vec3>,

    /// Camera up direction as "x,y,z"
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    pub vup: Option<Vec3>,

    /// Defocus blur cone angle in degrees (0 disables depth of field)
    #[arg(long)]
    pub defocus_angle: Option<f32>,

    /// Distance to the plane of perfect focus
    #[arg(long)]
    pub focus_dist: Option<f32>,

    /// Random seed for sampling and for the cover scene layout
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Worker threads (defaults to one per core)
    #[arg(long, short = 'j')]
    pub threads: Option<usize>,

    /// Edge length of render buckets in pixels
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    pub bucket_size: u32,

    /// Cancel the render after this many seconds
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Output file (.png or .ppm); "-" writes PPM to stdout
    #[arg(short, long, default_value = "output.png")]
    pub output: PathBuf,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    /// Overwrite the camera fields given explicitly on the command line.
    pub fn apply_overrides(&self, config: &mut CameraConfig) {
        if let Some(width) = self.width {
            config.image_width = width;
        }
        if let Some(aspect_ratio) = self.aspect_ratio {
            config.aspect_ratio = aspect_ratio;
        }
        if let Some(samples) = self.samples_per_pixel {
            config.samples_per_pixel = samples;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(vfov) = self.vfov {
            config.vfov = vfov;
        }
        if let Some(lookfrom) = self.lookfrom {
            config.lookfrom = lookfrom;
        }
        if let Some(lookat) = self.lookat {
            config.lookat = lookat;
        }
        if let Some(vup) = self.vup {
            config.vup = vup;
        }
        if let Some(angle) = self.defocus_angle {
            config.defocus_angle = angle;
        }
        if let Some(dist) = self.focus_dist {
            config.focus_dist = dist;
        }
    }
}

/// Parse "x,y,z" into a vector.
fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("invalid component {:?}: {}", p.trim(), e)))
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected 3 comma-separated numbers, got {}", parts.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("13,2,3"), Ok(Vec3::new(13.0, 2.0, 3.0)));
        assert_eq!(parse_vec3(" -1.5, 0 ,2e1"), Ok(Vec3::new(-1.5, 0.0, 20.0)));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,2,3,4").is_err());
        assert!(parse_vec3("a,b,c").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["lumen"]).unwrap();
        assert_eq!(args.scene, SceneKind::Cover);
        assert_eq!(args.seed, 42);
        assert_eq!(args.bucket_size, DEFAULT_BUCKET_SIZE);
        assert_eq!(args.output, PathBuf::from("output.png"));
        assert!(args.scene_file.is_none());
    }

    #[test]
    fn test_overrides_only_touch_given_fields() {
        let args = Args::try_parse_from([
            "lumen",
            "--width",
            "64",
            "-s",
            "4",
            "--lookfrom",
            "-2,2,1",
            "--defocus-angle",
            "0",
        ])
        .unwrap();

        let mut config = CameraConfig::default().with_lens(20.0, 0.6, 10.0);
        args.apply_overrides(&mut config);

        assert_eq!(config.image_width, 64);
        assert_eq!(config.samples_per_pixel, 4);
        assert_eq!(config.lookfrom, Vec3::new(-2.0, 2.0, 1.0));
        assert_eq!(config.defocus_angle, 0.0);
        // Untouched
        assert_eq!(config.vfov, 20.0);
        assert_eq!(config.focus_dist, 10.0);
    }

    #[test]
    fn test_scene_and_log_level() {
        let args = Args::try_parse_from(["lumen", "--scene", "materials", "--log-level", "debug"]).unwrap();
        assert_eq!(args.scene, SceneKind::Materials);
        assert_eq!(LevelFilter::from(args.log_level), LevelFilter::Debug);
    }
}
