use clap::{value_parser, Parser};

use crate::format::ModelFormat;

#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(about = "Headless probe for the gallery's model loading pipeline")]
pub struct CliArgs {
    /// Signed URL of the model asset to load.
    pub url: String,

    /// Declared format; skips extension sniffing, exactly like the format
    /// column the upload form records.
    #[arg(long, env = "VITRINE_FORMAT", value_parser = value_parser!(ModelFormat))]
    pub format: Option<ModelFormat>,

    /// Retries after the initial attempt.
    #[arg(long, default_value_t = 2, env = "VITRINE_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    /// Fixed pause between attempts, in milliseconds.
    #[arg(long, default_value_t = 1500, env = "VITRINE_RETRY_DELAY_MS")]
    pub retry_delay_ms: u64,

    /// Vertical field of view the camera fit assumes, in degrees.
    #[arg(long, default_value_t = 50.0)]
    pub fov_degrees: f32,

    /// Fit for a small (mobile-class) viewport with on-screen controls.
    #[arg(long)]
    pub compact_viewport: bool,
}
