use crate::cell::HeatmapCell;
use crate::dead_zone::DeadZone;
use crate::error::HResult;
use crate::grid::GridCoordinate;
use crate::session::{HeatmapRecorder, SessionState};
use crate::stats::HeatmapStatistics;
use crate::types::{strength_to_percentage, SignalQuality};
use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Render-ready view of one cell
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CellView {
    pub coordinate: GridCoordinate,
    pub label: String,
    pub position: Vec3,
    pub average_strength: i32,
    pub average_normalized_strength: f32,
    /// Average strength as 0-100 of the display scale
    pub percentage: u8,
    pub sample_count: usize,
    pub quality: SignalQuality,
    pub measured: bool,
}

impl From<&HeatmapCell> for CellView {
    fn from(cell: &HeatmapCell) -> Self {
        CellView {
            coordinate: cell.coordinate(),
            label: cell.coordinate().to_string(),
            position: cell.position(),
            average_strength: cell.average_strength(),
            average_normalized_strength: cell.average_normalized_strength(),
            percentage: strength_to_percentage(cell.average_strength()),
            sample_count: cell.sample_count(),
            quality: cell.quality(),
            measured: cell.is_measured(),
        }
    }
}

/// Point-in-time dump of a recorder for renderers and dashboards
#[derive(Serialize, Clone, Debug)]
pub struct HeatmapSnapshot {
    pub generated_at: DateTime<Utc>,
    pub state: SessionState,
    pub status: String,
    pub sample_count: usize,
    pub cells: Vec<CellView>,
    pub dead_zones: Vec<DeadZone>,
    pub statistics: Option<HeatmapStatistics>,
}

impl HeatmapSnapshot {
    pub fn capture(recorder: &HeatmapRecorder) -> Self {
        HeatmapSnapshot {
            generated_at: Utc::now(),
            state: recorder.state(),
            status: recorder.status().to_string(),
            sample_count: recorder.samples().len(),
            cells: recorder.cells().iter().map(CellView::from).collect(),
            dead_zones: recorder.dead_zones().to_vec(),
            statistics: recorder.statistics().cloned(),
        }
    }

    pub fn to_json(&self) -> HResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> HResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
