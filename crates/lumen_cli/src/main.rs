use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use lumen_renderer::{
    render_to_sink, Camera, CancelToken, NoProgress, PixelSink, PngSink, PpmSink, RenderOptions, RenderProgress,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::thread;
use std::time::Duration;

mod cli;
mod logger;
mod progress;
mod scenes;

use cli::Args;
use logger::init_logger;
use progress::ProgressBarReporter;

/// Pick a sink from the output path: "-" is PPM on stdout, otherwise the
/// extension decides.
fn open_sink(path: &Path) -> Result<Box<dyn PixelSink>> {
    if path == Path::new("-") {
        return Ok(Box::new(PpmSink::new(BufWriter::new(io::stdout().lock()))));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("ppm") => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(PpmSink::new(BufWriter::new(file))))
        }
        Some("png") => Ok(Box::new(PngSink::new(path))),
        _ => bail!("Unsupported output format for {} (use .png or .ppm)", path.display()),
    }
}

/// Cancel `token` once `seconds` have elapsed.
fn spawn_watchdog(seconds: f64, token: CancelToken) -> Result<()> {
    let limit = Duration::try_from_secs_f64(seconds).context("Invalid --time-limit")?;
    thread::Builder::new()
        .name("lumen-watchdog".into())
        .spawn(move || {
            thread::sleep(limit);
            log::warn!("Time limit of {:.1?} reached, cancelling render", limit);
            token.cancel();
        })
        .context("Failed to spawn watchdog thread")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    info!("Lumen {}", env!("CARGO_PKG_VERSION"));

    let mut setup = match &args.scene_file {
        Some(path) => {
            info!("Loading scene from {}", path.display());
            scenes::load(path).with_context(|| format!("Failed to load scene {}", path.display()))?
        }
        None => {
            info!("Building {:?} scene", args.scene);
            scenes::builtin(args.scene, args.seed)
        }
    };
    args.apply_overrides(&mut setup.camera);

    let camera = Camera::new(setup.camera);
    info!(
        "Scene: {} spheres, {} materials",
        setup.scene.len(),
        setup.scene.material_count()
    );

    let options = RenderOptions {
        seed: args.seed,
        bucket_size: args.bucket_size,
        threads: args.threads,
        cancel: CancelToken::new(),
    };

    if let Some(seconds) = args.time_limit {
        spawn_watchdog(seconds, options.cancel.clone())?;
    }

    let mut sink = open_sink(&args.output)?;

    let total_pixels = u64::from(camera.image_width()) * u64::from(camera.image_height());
    let progress: Box<dyn RenderProgress> = if args.no_progress {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressBarReporter::new(total_pixels))
    };

    render_to_sink(&setup.scene, &camera, &options, progress.as_ref(), sink.as_mut()).context("Render failed")?;

    if args.output != Path::new("-") {
        info!("Image saved to {}", args.output.display());
    }

    Ok(())
}
