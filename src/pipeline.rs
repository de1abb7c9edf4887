use crate::cell::CellMap;
use crate::config::HeatmapConfiguration;
use crate::dead_zone::{DeadZone, DeadZoneDetector};
use crate::interpolation::Interpolator;
use crate::smoothing::CellSmoother;
use crate::stats::{HeatmapStatistics, RecordingWindow, StatisticsCalculator};
use crate::types::Sample;

/// Result of one post-processing run
#[derive(Clone, Debug, Default)]
pub struct PipelineOutput {
    pub cells: CellMap,
    pub dead_zones: Vec<DeadZone>,
    pub statistics: HeatmapStatistics,
}

/// Batch post-processing over a frozen sample log
///
/// Stage order is fixed: interpolation → smoothing → dead-zone detection →
/// statistics. Each stage consumes the previous stage's output in full.
pub struct HeatmapPipeline {
    config: HeatmapConfiguration,
}

impl HeatmapPipeline {
    pub fn new(config: HeatmapConfiguration) -> Self {
        HeatmapPipeline { config }
    }

    pub fn config(&self) -> &HeatmapConfiguration {
        &self.config
    }

    pub fn run(&self, recorded: CellMap, samples: &[Sample], window: RecordingWindow) -> PipelineOutput {
        let recorded_cells = recorded.len();

        let cells = if self.config.interpolation_enabled() {
            Interpolator::from_config(&self.config).interpolate(recorded, samples)
        } else {
            recorded
        };

        let cells = CellSmoother::from_config(&self.config).smooth(cells);

        let dead_zones = DeadZoneDetector::from_config(&self.config).detect(&cells);

        let statistics =
            StatisticsCalculator::new(self.config.grid()).calculate(samples, window, &dead_zones);

        log::debug!(
            "pipeline: {} samples, {} recorded cells -> {} cells, {} dead zones",
            samples.len(),
            recorded_cells,
            cells.len(),
            dead_zones.len()
        );

        PipelineOutput {
            cells,
            dead_zones,
            statistics,
        }
    }
}
