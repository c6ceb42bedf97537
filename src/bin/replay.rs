//! railmap-replay binary
//!
//! Feeds a recorded snapshot log (JSON Lines, one partial snapshot per
//! line) through the view engine and reports what the engine did with it.
//! Useful for smoke-testing captured sessions without a renderer attached.
//!
//! ## Configuration (flags / env)
//!
//! | Key                  | Default | Description                           |
//! |----------------------|---------|---------------------------------------|
//! | `RAILMAP_LOG`        | —       | Path to the JSONL snapshot log        |
//! | `RAILMAP_FRAMES`     | `60`    | Frames ticked between snapshots       |
//! | `RAILMAP_WIDTH`      | `1280`  | Viewport width (device pixels)        |
//! | `RAILMAP_HEIGHT`     | `720`   | Viewport height (device pixels)       |
//! | `RAILMAP_RESOLUTION` | `1.0`   | Device pixel ratio                    |

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use railmap_view::{Snapshot, ViewConfig, Viewport, WorldModel};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "railmap-replay", about = "Railmap snapshot log replayer", version)]
struct Args {
    /// Path to the JSONL snapshot log
    #[arg(env = "RAILMAP_LOG")]
    log: PathBuf,

    /// Frames ticked between snapshots
    #[arg(long, env = "RAILMAP_FRAMES", default_value_t = 60)]
    frames: u32,

    /// Viewport width in device pixels
    #[arg(long, env = "RAILMAP_WIDTH", default_value_t = 1280.0)]
    width: f64,

    /// Viewport height in device pixels
    #[arg(long, env = "RAILMAP_HEIGHT", default_value_t = 720.0)]
    height: f64,

    /// Device pixel ratio
    #[arg(long, env = "RAILMAP_RESOLUTION", default_value_t = 1.0)]
    resolution: f64,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("railmap_view=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut model = WorldModel::new(
        ViewConfig::default(),
        Viewport::new(args.width, args.height, args.resolution),
    )?;

    let file = File::open(&args.log)
        .with_context(|| format!("opening snapshot log {}", args.log.display()))?;
    let reader = BufReader::new(file);

    let mut snapshots = 0usize;
    let mut skipped = 0usize;
    let mut dangling = 0usize;
    let mut frames = 0u64;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", lineno + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let snapshot: Snapshot = serde_json::from_str(&line)
            .with_context(|| format!("parsing snapshot on line {}", lineno + 1))?;

        let report = model.merge_all(&snapshot);
        snapshots += 1;
        skipped += report.skipped;
        dangling += report.resolution.dangling_count();

        // Let the interpolations play out between snapshots, the way a
        // display loop would.
        for _ in 0..args.frames {
            model.tick();
            if model.is_changed() {
                model.render();
            }
            frames += 1;
            if !model.is_animating() {
                break;
            }
        }
    }

    log::info!(
        "replayed {} snapshot(s) over {} frame(s): {} entities live, {} record(s) skipped, {} dangling reference(s)",
        snapshots,
        frames,
        model.entity_count(),
        skipped,
        dangling,
    );

    Ok(())
}
