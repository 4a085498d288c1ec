use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use serde::Serialize;

use linecount_rs::integration::{DetectionSource, Frame};
use linecount_rs::{
    AssignmentStrategy, CounterConfig, CountingPipeline, CountsSummary, JsonLinesSource, LineAxis,
    LineConfig, TrackId, TrackerConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "linecount",
    version,
    about = "Count unique vehicles by type crossing a virtual line, from recorded detections"
)]
struct Args {
    /// JSON Lines detection frames; reads stdin when omitted
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// JSON configuration file; replaces the tuning flags below
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Line position as a fraction of frame height (or width with --vertical)
    #[arg(long, default_value_t = 0.5)]
    line_y: f64,
    /// Half-width of the dead band around the line
    #[arg(long, default_value_t = 0.02)]
    margin: f64,
    #[arg(long)]
    invert_directions: bool,
    /// Use a vertical line and count horizontal motion
    #[arg(long)]
    vertical: bool,
    /// Frames a track may go unmatched before it is dropped
    #[arg(long, default_value_t = 30)]
    max_age: u32,
    /// Maximum match distance between a track and a detection (normalized)
    #[arg(long, default_value_t = 0.1)]
    gate: f64,
    #[arg(long, default_value_t = 0.0)]
    iou_weight: f64,
    /// Detection confidence threshold
    #[arg(long, default_value_t = 0.25)]
    conf: f64,
    #[arg(long, value_enum, default_value_t = Assignment::Greedy)]
    assignment: Assignment,
    /// Where to write the summary JSON
    #[arg(long, value_name = "PATH")]
    save_json: Option<PathBuf>,
    /// Where to write crossing events, one JSON object per line
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,
    /// Stop after this many frames (0 = no limit)
    #[arg(long, default_value_t = 0)]
    max_frames: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Assignment {
    Greedy,
    Optimal,
}

impl Args {
    fn counter_config(&self) -> Result<CounterConfig> {
        if let Some(path) = &self.config {
            return CounterConfig::from_path(path)
                .with_context(|| format!("loading configuration from {}", path.display()));
        }
        Ok(CounterConfig {
            tracker: TrackerConfig {
                max_age: self.max_age,
                match_gate_distance: self.gate,
                iou_weight: self.iou_weight,
                assignment: match self.assignment {
                    Assignment::Greedy => AssignmentStrategy::Greedy,
                    Assignment::Optimal => AssignmentStrategy::Optimal,
                },
                ..TrackerConfig::default()
            },
            line: LineConfig {
                line_position: self.line_y,
                hysteresis_margin: self.margin,
                invert_directions: self.invert_directions,
                axis: if self.vertical {
                    LineAxis::Vertical
                } else {
                    LineAxis::Horizontal
                },
            },
            min_confidence: self.conf,
        })
    }
}

/// Stops a source after a fixed number of frames.
struct Limited<D> {
    inner: D,
    remaining: Option<u64>,
}

impl<D> Limited<D> {
    fn new(inner: D, max_frames: u64) -> Self {
        Self {
            inner,
            remaining: (max_frames > 0).then_some(max_frames),
        }
    }
}

impl<D: DetectionSource> DetectionSource for Limited<D> {
    type Error = D::Error;

    fn next_frame(&mut self) -> std::result::Result<Option<Frame>, Self::Error> {
        match self.remaining.as_mut() {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                self.inner.next_frame()
            }
            None => self.inner.next_frame(),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    source: String,
    line_y: f64,
    invert_directions: bool,
    counts: &'a CountsSummary,
    counted_track_ids: Vec<TrackId>,
    frames: u64,
    rejected_detections: u64,
    below_confidence: u64,
    generated_at: String,
}

fn count<D>(
    pipeline: &mut CountingPipeline,
    source: D,
    max_frames: u64,
    mut events: Option<BufWriter<File>>,
) -> Result<()>
where
    D: DetectionSource<Error = linecount_rs::Error>,
{
    for event in pipeline.crossings(Limited::new(source, max_frames)) {
        let event = event?;
        if let Some(out) = events.as_mut() {
            serde_json::to_writer(&mut *out, &event)?;
            writeln!(out)?;
        }
    }
    if let Some(mut out) = events {
        out.flush()?;
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = args.counter_config()?;
    let line = config.line.clone();
    let mut pipeline = CountingPipeline::new(config).context("invalid configuration")?;

    let events = match &args.events {
        Some(path) => {
            ensure_parent_dir(path)?;
            let file = File::create(path)
                .with_context(|| format!("creating events file {}", path.display()))?;
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let source_name = match &args.input {
        Some(path) => {
            let source = JsonLinesSource::open(path)?;
            count(&mut pipeline, source, args.max_frames, events)?;
            path.display().to_string()
        }
        None => {
            let source = JsonLinesSource::new(io::stdin().lock(), "<stdin>");
            count(&mut pipeline, source, args.max_frames, events)?;
            "<stdin>".to_string()
        }
    };

    let summary = pipeline.summary();
    let stats = pipeline.stats();
    info!(
        "processed {} frames: {} crossings ({} in, {} out), {} rejected detections",
        stats.frames,
        summary.total,
        summary.total_in(),
        summary.total_out(),
        stats.rejected_detections()
    );

    let report = Report {
        source: source_name,
        line_y: line.line_position,
        invert_directions: line.invert_directions,
        counts: &summary,
        counted_track_ids: summary.counted_track_ids.iter().copied().collect(),
        frames: stats.frames,
        rejected_detections: stats.rejected_detections(),
        below_confidence: stats.below_confidence,
        generated_at: chrono::Utc::now().to_rfc3339(),
    };
    let payload = serde_json::to_string_pretty(&report)?;

    if let Some(path) = &args.save_json {
        ensure_parent_dir(path)?;
        fs::write(path, &payload).with_context(|| format!("writing {}", path.display()))?;
    }
    println!("{payload}");
    Ok(())
}
