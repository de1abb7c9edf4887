use crate::cell::{CellMap, HeatmapCell};
use crate::config::HeatmapConfiguration;
use crate::grid::GridCoordinate;
use crate::types::{Sample, SampleKind};
use std::collections::HashMap;

/// Neighborhood blending for cell averages
///
/// One simultaneous pass: every neighbor lookup reads the pre-smoothing
/// averages, so no smoothed value feeds another cell in the same pass.
#[derive(Clone, Copy, Debug)]
pub struct CellSmoother {
    factor: f32,
}

impl CellSmoother {
    /// `factor` is clamped to [0, 1]; 0 disables smoothing
    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        CellSmoother { factor }
    }

    pub fn from_config(config: &HeatmapConfiguration) -> Self {
        Self::new(config.smoothing_factor())
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn is_active(&self) -> bool {
        self.factor > 0.0
    }

    /// Blend `avg * (1 - factor) + neighborhood_mean * factor`, rounded
    pub fn blend(&self, average: i32, neighborhood_mean: f64) -> i32 {
        let factor = self.factor as f64;
        (average as f64 * (1.0 - factor) + neighborhood_mean * factor).round() as i32
    }

    pub fn smooth(&self, cells: CellMap) -> CellMap {
        if !self.is_active() || cells.is_empty() {
            return cells;
        }

        let averages: HashMap<GridCoordinate, i32> = cells
            .iter()
            .map(|c| (c.coordinate(), c.average_strength()))
            .collect();

        let mut smoothed_count = 0usize;
        let smoothed: Vec<HeatmapCell> = cells
            .into_cells()
            .into_iter()
            .map(|mut cell| {
                let neighbor_strengths: Vec<i32> = cell
                    .coordinate()
                    .neighbors()
                    .filter_map(|n| averages.get(&n).copied())
                    .collect();

                if neighbor_strengths.is_empty() {
                    return cell;
                }

                let sum: i64 = neighbor_strengths.iter().map(|&s| s as i64).sum();
                let mean = sum as f64 / neighbor_strengths.len() as f64;
                let blended = self.blend(cell.average_strength(), mean);

                let replacement = Sample::derived(
                    SampleKind::Smoothed,
                    cell.position(),
                    blended,
                    cell.latest_sample(),
                );
                cell.replace_samples(replacement);
                smoothed_count += 1;
                cell
            })
            .collect();

        log::debug!("smoothing: {} of {} cells blended", smoothed_count, smoothed.len());
        CellMap::from_cells(smoothed)
    }
}
