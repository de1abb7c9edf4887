use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use coverage_map_rs::config::HeatmapConfiguration;
use coverage_map_rs::feed::spawn_feed;
use coverage_map_rs::session::SharedRecorder;
use coverage_map_rs::storage;
use coverage_map_rs::types::{Sample, SampleLabels, SignalQuality};
use glam::Vec3;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coverage_map")]
#[command(about = "Signal coverage heatmap - grid aggregation, interpolation and dead-zone detection", long_about = None)]
struct Args {
    /// Sample log to process (.json or .json.gz). Omit to run a simulated walk.
    #[arg(value_name = "SAMPLES")]
    input: Option<PathBuf>,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cell edge length in meters
    #[arg(long)]
    cell_size: Option<f32>,

    /// Neighborhood blend weight (0 disables smoothing)
    #[arg(long)]
    smoothing_factor: Option<f32>,

    /// Skip the interpolation stage
    #[arg(long, default_value_t = false)]
    no_interpolation: bool,

    /// Interpolation search radius in cells
    #[arg(long)]
    interpolation_radius: Option<u32>,

    /// Cells averaging below this (dBm) are weak
    #[arg(long, allow_hyphen_values = true)]
    dead_zone_threshold: Option<i32>,

    /// Max seed-to-member distance for a dead zone (meters)
    #[arg(long)]
    cluster_distance: Option<f32>,

    /// Minimum weak cells per dead zone
    #[arg(long)]
    min_cluster_size: Option<usize>,

    /// Seconds between simulated samples
    #[arg(long)]
    sampling_interval: Option<f64>,

    /// Write a JSON snapshot of cells, zones and statistics
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Write the raw sample log (.json or .json.gz)
    #[arg(long)]
    export: Option<PathBuf>,
}

impl Args {
    fn configuration(&self) -> Result<HeatmapConfiguration> {
        let mut config = match &self.config {
            Some(path) => HeatmapConfiguration::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HeatmapConfiguration::default(),
        };

        if let Some(v) = self.cell_size {
            config.set_cell_size(v);
        }
        if let Some(v) = self.smoothing_factor {
            config.set_smoothing_factor(v);
        }
        if self.no_interpolation {
            config.set_interpolation_enabled(false);
        }
        if let Some(v) = self.interpolation_radius {
            config.set_interpolation_radius(v);
        }
        if let Some(v) = self.dead_zone_threshold {
            config.set_dead_zone_threshold(v);
        }
        if let Some(v) = self.cluster_distance {
            config.set_cluster_distance(v);
        }
        if let Some(v) = self.min_cluster_size {
            config.set_min_cluster_size(v);
        }
        if let Some(v) = self.sampling_interval {
            config.set_sampling_interval(v);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.configuration()?;
    let recorder = SharedRecorder::new(config.clone());

    println!("[{}] Coverage Map RS Starting", ts_now());

    match &args.input {
        Some(path) => {
            let samples = storage::load_samples(path)
                .with_context(|| format!("loading samples from {}", path.display()))?;
            println!("[{}] Loaded {} samples from {}", ts_now(), samples.len(), path.display());
            recorder.with(|r| r.import_samples(samples))?;
        }
        None => simulate_walk(&recorder, &config)?,
    }

    let snapshot = recorder.snapshot()?;
    println!("[{}] {}", ts_now(), snapshot.status);
    println!("  Cells: {}", snapshot.cells.len());
    if let Some(stats) = &snapshot.statistics {
        println!(
            "  Signal: avg {} dBm, min {} dBm, max {} dBm",
            stats.average_strength, stats.min_strength, stats.max_strength
        );
        println!(
            "  Coverage: {:.2} m² over {:.1} s",
            stats.coverage_area, stats.duration_seconds
        );
        for quality in SignalQuality::ALL {
            let count = stats.quality_distribution.get(&quality).copied().unwrap_or(0);
            println!("  {:>9}: {}", quality.label(), count);
        }
    }
    println!("  Dead zones: {}", snapshot.dead_zones.len());
    for zone in &snapshot.dead_zones {
        println!(
            "    {} at ({:.2}, {:.2}, {:.2}) r={:.2} m, {} cells",
            zone,
            zone.center.x,
            zone.center.y,
            zone.center.z,
            zone.radius,
            zone.member_count()
        );
    }

    if let Some(path) = &args.snapshot {
        snapshot
            .save(path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        println!("[{}] Snapshot saved to {}", ts_now(), path.display());
    }

    if let Some(path) = &args.export {
        let samples = recorder.with(|r| r.samples().to_vec())?;
        storage::save_samples(path, &samples)
            .with_context(|| format!("writing samples {}", path.display()))?;
        println!("[{}] Exported {} samples to {}", ts_now(), samples.len(), path.display());
    }

    Ok(())
}

/// Serpentine walk across a 6 m × 4 m floor with one access point near the
/// origin and a lossy far corner.
fn simulate_walk(recorder: &SharedRecorder, config: &HeatmapConfiguration) -> Result<()> {
    const ACCESS_POINT: Vec3 = Vec3::new(0.5, 1.0, 0.5);
    let step = (config.sampling_interval() as f32 * 0.5).max(0.05);

    let (feed, worker) = spawn_feed(recorder.clone(), 256);
    feed.start()?;

    let labels = SampleLabels::new(Some("sim-net".to_string()), Some("02:00:00:00:00:01".to_string()))
        .with_frequency(5.0);

    let mut row = 0;
    let mut z = 0.0f32;
    while z <= 4.0 {
        let xs: Vec<f32> = (0..)
            .map(|i| i as f32 * step)
            .take_while(|x| *x <= 6.0)
            .collect();
        let ordered: Box<dyn Iterator<Item = &f32>> = if row % 2 == 0 {
            Box::new(xs.iter())
        } else {
            Box::new(xs.iter().rev())
        };
        for &x in ordered {
            let position = Vec3::new(x, 1.0, z);
            feed.sample(Sample::new(position, simulated_strength(position, ACCESS_POINT)).with_labels(labels.clone()))?;
        }
        row += 1;
        z += step;
    }

    feed.stop()?;
    drop(feed);

    let report = worker
        .join()
        .map_err(|_| anyhow::anyhow!("capture feed worker panicked"))?;
    println!(
        "[{}] Simulated walk: {} samples accepted, {} rejected",
        ts_now(),
        report.accepted,
        report.rejected
    );
    Ok(())
}

/// Log-distance path loss plus extra attenuation behind a wall at x > 4.5, z > 2.5
fn simulated_strength(position: Vec3, access_point: Vec3) -> i32 {
    let distance = position.distance(access_point).max(0.1);
    let mut rssi = -35.0 - 25.0 * distance.log10();
    if position.x > 4.5 && position.z > 2.5 {
        rssi -= 30.0;
    }
    // Deterministic ripple so neighboring cells differ
    rssi += ((position.x * 7.0).sin() + (position.z * 5.0).cos()) * 2.0;
    (rssi.round() as i32).clamp(-100, 0)
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
