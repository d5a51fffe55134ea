use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::*;

use gaze_trail::args::Args;
use gaze_trail::config::AppConfig;
use gaze_trail::logging;
use gaze_trail::overlay::{RasterSurface, SharedViewport};
use gaze_trail::pipeline::{KeypointSource, ReplaySource, SimulatedSource};
use gaze_trail::render_loop::RenderLoop;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    // 0. Config, with CLI overrides
    let mut config = AppConfig::load_from(&args.config)?;
    if let Some(policy) = args.policy {
        config.gaze.policy = policy;
    }
    if let Some(ms) = args.interval_ms {
        config.tracking.tick_interval_ms = ms;
    }
    config.validate()?;

    // 1. Keypoint source
    let replay = match &args.replay {
        Some(path) => Some(Arc::new(ReplaySource::load(path)?)),
        None => None,
    };
    let source: Arc<dyn KeypointSource> = match &replay {
        Some(r) => r.clone() as Arc<dyn KeypointSource>,
        None => Arc::new(SimulatedSource::new(
            config.gaze.capture(),
            &config.landmarks.eye_contour,
            &config.landmarks.iris,
        )),
    };

    // 2. Overlay
    let viewport = SharedViewport::new(args.viewport);
    let surface = RasterSurface::new(
        args.viewport,
        config.render.dot_color(),
        config.render.background(),
    );
    let mut render_loop = RenderLoop::from_config(source, viewport, surface, &config);
    println!("{}", format!("Keypoint source: {}", render_loop.source_name()).green());

    // 3. Run until the tick budget is spent or the replay runs dry
    let handle = render_loop.stop_handle();
    let interval = config.tracking.tick_interval();
    let budget = args.ticks;
    let stopper = async move {
        for _ in 0..budget {
            tokio::time::sleep(interval).await;
            if replay.as_ref().is_some_and(|r| r.is_exhausted()) {
                break;
            }
        }
        handle.stop();
    };
    let (report, ()) = tokio::join!(render_loop.run(), stopper);

    // 4. Summary
    let stats = &report.stats;
    println!("{}", "Tracking finished".green().bold());
    println!("{:<22} {}", "Ticks:", stats.ticks);
    println!("{:<22} {}", "Trail points:", report.trail.len());
    println!("{:<22} {:.1}%", "Effective rate:", stats.effective_rate() * 100.0);
    for (kind, count) in &stats.skipped {
        println!("{:<22} {}", format!("Skipped ({}):", kind), count.to_string().yellow());
    }
    if stats.not_ready_warnings > 0 {
        println!(
            "{:<22} {}",
            "Not-ready warnings:",
            stats.not_ready_warnings.to_string().yellow()
        );
    }
    if let Some(last) = report.trail.last() {
        println!("{:<22} ({:.0}, {:.0})", "Last gaze point:", last.x, last.y);
    }

    if let Some(path) = &args.output {
        render_loop.into_surface().save_png(path)?;
        println!("{}", format!("Overlay written to {}", path.display()).cyan());
    }

    Ok(())
}
