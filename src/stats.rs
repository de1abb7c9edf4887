use crate::dead_zone::DeadZone;
use crate::grid::{GridCoordinate, GridIndex};
use crate::types::{Sample, SignalQuality};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Wall-clock bounds of a recording session
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RecordingWindow {
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

impl RecordingWindow {
    pub fn new(started_at: DateTime<Utc>, stopped_at: DateTime<Utc>) -> Self {
        RecordingWindow {
            started_at: Some(started_at),
            stopped_at: Some(stopped_at),
        }
    }

    /// Seconds between start and stop, if both are known
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => {
                Some((stop - start).num_milliseconds().max(0) as f64 / 1000.0)
            }
            _ => None,
        }
    }
}

/// Summary metrics for one processed sample set
///
/// `Default` is the neutral value reported for an empty log.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HeatmapStatistics {
    pub total_samples: usize,
    pub average_strength: i32,
    pub min_strength: i32,
    pub max_strength: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    /// Occupied raw-sample cells × cell area (m²)
    pub coverage_area: f32,
    pub dead_zone_count: usize,
    pub dead_zones: Vec<DeadZone>,
    pub quality_distribution: BTreeMap<SignalQuality, usize>,
}

impl HeatmapStatistics {
    pub fn is_empty(&self) -> bool {
        self.total_samples == 0
    }
}

pub struct StatisticsCalculator {
    grid: GridIndex,
}

impl StatisticsCalculator {
    pub fn new(grid: GridIndex) -> Self {
        StatisticsCalculator { grid }
    }

    pub fn calculate(
        &self,
        samples: &[Sample],
        window: RecordingWindow,
        dead_zones: &[DeadZone],
    ) -> HeatmapStatistics {
        let raw: Vec<&Sample> = samples.iter().filter(|s| s.is_measured()).collect();
        if raw.is_empty() {
            return HeatmapStatistics::default();
        }

        let mut min_strength = i32::MAX;
        let mut max_strength = i32::MIN;
        let mut sum: i64 = 0;
        let mut distribution: BTreeMap<SignalQuality, usize> = BTreeMap::new();
        let mut occupied: HashSet<GridCoordinate> = HashSet::with_capacity(raw.len());

        for sample in &raw {
            min_strength = min_strength.min(sample.strength);
            max_strength = max_strength.max(sample.strength);
            sum += sample.strength as i64;
            *distribution.entry(sample.quality()).or_insert(0) += 1;
            occupied.insert(self.grid.to_grid(sample.position));
        }

        let duration_seconds = window
            .duration_seconds()
            .unwrap_or_else(|| timestamp_span_seconds(&raw));

        let started_at = window
            .started_at
            .or_else(|| raw.iter().map(|s| s.timestamp).min());

        HeatmapStatistics {
            total_samples: raw.len(),
            average_strength: (sum as f64 / raw.len() as f64).round() as i32,
            min_strength,
            max_strength,
            started_at,
            duration_seconds,
            coverage_area: occupied.len() as f32 * self.grid.cell_area(),
            dead_zone_count: dead_zones.len(),
            dead_zones: dead_zones.to_vec(),
            quality_distribution: distribution,
        }
    }
}

fn timestamp_span_seconds(samples: &[&Sample]) -> f64 {
    let first = samples.iter().map(|s| s.timestamp).min();
    let last = samples.iter().map(|s| s.timestamp).max();
    match (first, last) {
        (Some(first), Some(last)) => (last - first).num_milliseconds().max(0) as f64 / 1000.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use glam::Vec3;

    fn sample(x: f32, strength: i32) -> Sample {
        Sample::new(Vec3::new(x, 0.0, 0.0), strength)
    }

    #[test]
    fn test_empty_is_neutral() {
        let calc = StatisticsCalculator::new(GridIndex::new(0.3));
        let stats = calc.calculate(&[], RecordingWindow::default(), &[]);
        assert!(stats.is_empty());
        assert_eq!(stats, HeatmapStatistics::default());
    }

    #[test]
    fn test_min_max_mean() {
        let calc = StatisticsCalculator::new(GridIndex::new(0.3));
        let samples = vec![sample(0.0, -40), sample(0.05, -60), sample(0.0, -90)];
        let stats = calc.calculate(&samples, RecordingWindow::default(), &[]);

        assert_eq!(stats.total_samples, 3);
        assert_eq!(stats.min_strength, -90);
        assert_eq!(stats.max_strength, -40);
        assert_eq!(stats.average_strength, -63);
        assert_eq!(stats.dead_zone_count, 0);
    }

    #[test]
    fn test_coverage_area_counts_distinct_cells() {
        let calc = StatisticsCalculator::new(GridIndex::new(0.5));
        let samples = vec![sample(0.0, -50), sample(0.1, -50), sample(1.0, -50), sample(2.0, -50)];
        let stats = calc.calculate(&samples, RecordingWindow::default(), &[]);
        assert_relative_eq!(stats.coverage_area, 3.0 * 0.25);
    }

    #[test]
    fn test_duration_from_window() {
        let calc = StatisticsCalculator::new(GridIndex::new(0.3));
        let start = Utc::now();
        let window = RecordingWindow::new(start, start + Duration::milliseconds(12_500));
        let stats = calc.calculate(&[sample(0.0, -50)], window, &[]);

        assert_relative_eq!(stats.duration_seconds, 12.5);
        assert_eq!(stats.started_at, Some(start));
    }

    #[test]
    fn test_duration_from_timestamps_without_window() {
        let calc = StatisticsCalculator::new(GridIndex::new(0.3));
        let t0 = Utc::now();
        let samples = vec![
            sample(0.0, -50).with_timestamp(t0 + Duration::seconds(4)),
            sample(0.0, -50).with_timestamp(t0),
            sample(0.0, -50).with_timestamp(t0 + Duration::seconds(2)),
        ];
        let stats = calc.calculate(&samples, RecordingWindow::default(), &[]);

        assert_relative_eq!(stats.duration_seconds, 4.0);
        assert_eq!(stats.started_at, Some(t0));
    }

    #[test]
    fn test_quality_distribution() {
        let calc = StatisticsCalculator::new(GridIndex::new(0.3));
        let samples = vec![sample(0.0, -35), sample(0.0, -45), sample(0.0, -60), sample(0.0, -95)];
        let stats = calc.calculate(&samples, RecordingWindow::default(), &[]);

        assert_eq!(stats.quality_distribution.get(&SignalQuality::Good), Some(&2));
        assert_eq!(stats.quality_distribution.get(&SignalQuality::Fair), Some(&1));
        assert_eq!(stats.quality_distribution.get(&SignalQuality::Poor), Some(&1));
        assert_eq!(stats.quality_distribution.get(&SignalQuality::Excellent), None);
        let total: usize = stats.quality_distribution.values().sum();
        assert_eq!(total, stats.total_samples);
    }
}
