use std::path::PathBuf;

use clap::Parser;

use crate::gaze::GazePolicy;
use crate::types::Size;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file (created with defaults if missing)
    #[arg(short, long, default_value = "gaze-trail.json")]
    pub config: PathBuf,

    /// Gaze normalization policy, overrides the config file
    #[arg(long, value_enum)]
    pub policy: Option<GazePolicy>,

    /// Stop after this many timer ticks
    #[arg(long, default_value_t = 200)]
    pub ticks: u32,

    /// Tick interval in milliseconds, overrides the config file
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Overlay viewport size
    #[arg(long, default_value = "1440x900")]
    pub viewport: Size,

    /// Replay recorded keypoint snapshots (JSON) instead of the simulated eye
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Write the final overlay to this PNG
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
