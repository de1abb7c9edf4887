//! Heatmap configuration
//!
//! Setters clamp into documented ranges instead of failing. Values loaded
//! from a config file go through the same setters.

use crate::error::HResult;
use crate::grid::GridIndex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ===== Defaults =====
pub const DEFAULT_CELL_SIZE: f32 = 0.3;
pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.5;
pub const DEFAULT_INTERPOLATION_RADIUS: u32 = 2;
pub const DEFAULT_DEAD_ZONE_THRESHOLD: i32 = -75;
pub const DEFAULT_CLUSTER_DISTANCE: f32 = 0.6;
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;
pub const DEFAULT_SAMPLING_INTERVAL: f64 = 1.0;

// ===== Ranges =====
pub const CELL_SIZE_RANGE: (f32, f32) = (0.01, 10.0);
pub const INTERPOLATION_RADIUS_MAX: u32 = 8;
pub const DEAD_ZONE_THRESHOLD_RANGE: (i32, i32) = (-100, 0);
pub const CLUSTER_DISTANCE_RANGE: (f32, f32) = (0.01, 100.0);
pub const MIN_CLUSTER_SIZE_RANGE: (usize, usize) = (1, 10_000);
pub const SAMPLING_INTERVAL_RANGE: (f64, f64) = (0.05, 60.0);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct HeatmapConfiguration {
    cell_size: f32,
    smoothing_factor: f32,
    interpolation_enabled: bool,
    interpolation_radius: u32,
    dead_zone_threshold: i32,
    cluster_distance: f32,
    min_cluster_size: usize,
    sampling_interval: f64,
}

impl HeatmapConfiguration {
    pub fn new() -> Self {
        HeatmapConfiguration {
            cell_size: DEFAULT_CELL_SIZE,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            interpolation_enabled: true,
            interpolation_radius: DEFAULT_INTERPOLATION_RADIUS,
            dead_zone_threshold: DEFAULT_DEAD_ZONE_THRESHOLD,
            cluster_distance: DEFAULT_CLUSTER_DISTANCE,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
        }
    }

    /// Load from a JSON file; every field is optional
    pub fn load(path: &Path) -> HResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> HResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> HResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn grid(&self) -> GridIndex {
        GridIndex::new(self.cell_size)
    }

    // ----- getters -----

    /// Cell edge length in meters
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// 0 disables smoothing
    pub fn smoothing_factor(&self) -> f32 {
        self.smoothing_factor
    }

    pub fn interpolation_enabled(&self) -> bool {
        self.interpolation_enabled
    }

    /// Search cube half-width in cells
    pub fn interpolation_radius(&self) -> u32 {
        self.interpolation_radius
    }

    /// Cells averaging strictly below this are weak
    pub fn dead_zone_threshold(&self) -> i32 {
        self.dead_zone_threshold
    }

    pub fn cluster_distance(&self) -> f32 {
        self.cluster_distance
    }

    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Seconds between capture ticks (advisory, owned by the capture side)
    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    // ----- clamping setters -----

    pub fn set_cell_size(&mut self, value: f32) {
        self.cell_size = clamp_f32(value, CELL_SIZE_RANGE, DEFAULT_CELL_SIZE);
    }

    pub fn set_smoothing_factor(&mut self, value: f32) {
        self.smoothing_factor = clamp_f32(value, (0.0, 1.0), DEFAULT_SMOOTHING_FACTOR);
    }

    pub fn set_interpolation_enabled(&mut self, value: bool) {
        self.interpolation_enabled = value;
    }

    pub fn set_interpolation_radius(&mut self, value: u32) {
        self.interpolation_radius = value.min(INTERPOLATION_RADIUS_MAX);
    }

    pub fn set_dead_zone_threshold(&mut self, value: i32) {
        self.dead_zone_threshold = value.clamp(DEAD_ZONE_THRESHOLD_RANGE.0, DEAD_ZONE_THRESHOLD_RANGE.1);
    }

    pub fn set_cluster_distance(&mut self, value: f32) {
        self.cluster_distance = clamp_f32(value, CLUSTER_DISTANCE_RANGE, DEFAULT_CLUSTER_DISTANCE);
    }

    pub fn set_min_cluster_size(&mut self, value: usize) {
        self.min_cluster_size = value.clamp(MIN_CLUSTER_SIZE_RANGE.0, MIN_CLUSTER_SIZE_RANGE.1);
    }

    pub fn set_sampling_interval(&mut self, value: f64) {
        self.sampling_interval = if value.is_finite() {
            value.clamp(SAMPLING_INTERVAL_RANGE.0, SAMPLING_INTERVAL_RANGE.1)
        } else {
            DEFAULT_SAMPLING_INTERVAL
        };
    }

    // ----- builder-style -----

    pub fn with_cell_size(mut self, value: f32) -> Self {
        self.set_cell_size(value);
        self
    }

    pub fn with_smoothing_factor(mut self, value: f32) -> Self {
        self.set_smoothing_factor(value);
        self
    }

    pub fn with_interpolation(mut self, enabled: bool) -> Self {
        self.set_interpolation_enabled(enabled);
        self
    }

    pub fn with_interpolation_radius(mut self, value: u32) -> Self {
        self.set_interpolation_radius(value);
        self
    }

    pub fn with_dead_zone_threshold(mut self, value: i32) -> Self {
        self.set_dead_zone_threshold(value);
        self
    }

    pub fn with_cluster_distance(mut self, value: f32) -> Self {
        self.set_cluster_distance(value);
        self
    }

    pub fn with_min_cluster_size(mut self, value: usize) -> Self {
        self.set_min_cluster_size(value);
        self
    }

    pub fn with_sampling_interval(mut self, value: f64) -> Self {
        self.set_sampling_interval(value);
        self
    }
}

impl Default for HeatmapConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_f32(value: f32, range: (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(range.0, range.1)
    } else {
        fallback
    }
}

/// On-disk shape: all fields optional, routed through the clamping setters
#[derive(Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    cell_size: Option<f32>,
    smoothing_factor: Option<f32>,
    interpolation_enabled: Option<bool>,
    interpolation_radius: Option<u32>,
    dead_zone_threshold: Option<i32>,
    cluster_distance: Option<f32>,
    min_cluster_size: Option<usize>,
    sampling_interval: Option<f64>,
}

impl From<ConfigFile> for HeatmapConfiguration {
    fn from(file: ConfigFile) -> Self {
        let mut config = HeatmapConfiguration::new();
        if let Some(v) = file.cell_size {
            config.set_cell_size(v);
        }
        if let Some(v) = file.smoothing_factor {
            config.set_smoothing_factor(v);
        }
        if let Some(v) = file.interpolation_enabled {
            config.set_interpolation_enabled(v);
        }
        if let Some(v) = file.interpolation_radius {
            config.set_interpolation_radius(v);
        }
        if let Some(v) = file.dead_zone_threshold {
            config.set_dead_zone_threshold(v);
        }
        if let Some(v) = file.cluster_distance {
            config.set_cluster_distance(v);
        }
        if let Some(v) = file.min_cluster_size {
            config.set_min_cluster_size(v);
        }
        if let Some(v) = file.sampling_interval {
            config.set_sampling_interval(v);
        }
        config
    }
}
