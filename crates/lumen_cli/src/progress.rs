use indicatif::{ProgressBar, ProgressStyle};
use lumen_renderer::RenderProgress;

/// Terminal progress bar counting finished pixels.
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    pub fn new(total_pixels: u64) -> Self {
        let bar = ProgressBar::new(total_pixels);
        let style = ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} px  ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl RenderProgress for ProgressBarReporter {
    fn advance(&self, pixels: u64) {
        self.bar.inc(pixels);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}
