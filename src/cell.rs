use crate::grid::{GridCoordinate, GridIndex};
use crate::types::{SignalQuality, Sample};
use glam::Vec3;
use std::cell::OnceCell;
use std::collections::HashMap;

/// Aggregates derived from a cell's samples
#[derive(Clone, Copy, Debug, PartialEq)]
struct CellSummary {
    average_strength: i32,
    average_normalized_strength: f32,
    latest_index: usize,
}

impl CellSummary {
    fn compute(samples: &[Sample]) -> Self {
        let count = samples.len().max(1) as f64;
        let sum: i64 = samples.iter().map(|s| s.strength as i64).sum();
        let normalized_sum: f32 = samples.iter().map(|s| s.normalized_strength()).sum();

        // Latest by timestamp; later entries win ties
        let latest_index = samples
            .iter()
            .enumerate()
            .fold(0, |best, (idx, s)| {
                if s.timestamp >= samples[best].timestamp {
                    idx
                } else {
                    best
                }
            });

        CellSummary {
            average_strength: (sum as f64 / count).round() as i32,
            average_normalized_strength: (normalized_sum / count as f32).clamp(0.0, 1.0),
            latest_index,
        }
    }
}

/// Aggregation bucket for every sample that quantizes to one coordinate
///
/// Always holds at least one sample. Aggregates are computed on first read
/// and dropped whenever the sample list changes.
#[derive(Clone, Debug)]
pub struct HeatmapCell {
    coordinate: GridCoordinate,
    position: Vec3,
    samples: Vec<Sample>,
    summary: OnceCell<CellSummary>,
}

impl HeatmapCell {
    pub fn new(coordinate: GridCoordinate, position: Vec3, first: Sample) -> Self {
        HeatmapCell {
            coordinate,
            position,
            samples: vec![first],
            summary: OnceCell::new(),
        }
    }

    pub fn coordinate(&self) -> GridCoordinate {
        self.coordinate
    }

    /// World-space center
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
        self.summary.take();
    }

    /// Swap the whole sample list for a single sample
    pub fn replace_samples(&mut self, sample: Sample) {
        self.samples.clear();
        self.samples.push(sample);
        self.summary.take();
    }

    fn summary(&self) -> &CellSummary {
        self.summary.get_or_init(|| CellSummary::compute(&self.samples))
    }

    /// Rounded mean RSSI
    pub fn average_strength(&self) -> i32 {
        self.summary().average_strength
    }

    /// Mean of normalized strengths, always within [0, 1]
    pub fn average_normalized_strength(&self) -> f32 {
        self.summary().average_normalized_strength
    }

    pub fn latest_sample(&self) -> &Sample {
        &self.samples[self.summary().latest_index]
    }

    pub fn quality(&self) -> SignalQuality {
        SignalQuality::from_strength(self.average_strength())
    }

    /// True when every sample came straight from the capture pipeline
    pub fn is_measured(&self) -> bool {
        self.samples.iter().all(Sample::is_measured)
    }
}

/// Sparse grid: at most one cell per coordinate, iterated in creation order
#[derive(Clone, Debug, Default)]
pub struct CellMap {
    cells: Vec<HeatmapCell>,
    index: HashMap<GridCoordinate, usize>,
}

impl CellMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket `samples` onto `grid` in log order
    pub fn from_samples<'a>(grid: &GridIndex, samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let mut map = CellMap::new();
        for sample in samples {
            map.insert_sample(grid, sample.clone());
        }
        map
    }

    /// Rebuild from cells, keeping the first cell for any repeated coordinate
    pub fn from_cells(cells: impl IntoIterator<Item = HeatmapCell>) -> Self {
        let mut map = CellMap::new();
        for cell in cells {
            map.insert_cell(cell);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coordinate: &GridCoordinate) -> bool {
        self.index.contains_key(coordinate)
    }

    pub fn get(&self, coordinate: &GridCoordinate) -> Option<&HeatmapCell> {
        self.index.get(coordinate).map(|&idx| &self.cells[idx])
    }

    pub fn cells(&self) -> &[HeatmapCell] {
        &self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeatmapCell> {
        self.cells.iter()
    }

    pub fn coordinates(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.cells.iter().map(|c| c.coordinate)
    }

    /// Add a sample to its cell, creating the cell if needed
    ///
    /// Returns the coordinate and whether a new cell was created.
    pub fn insert_sample(&mut self, grid: &GridIndex, sample: Sample) -> (GridCoordinate, bool) {
        let coordinate = grid.to_grid(sample.position);
        match self.index.get(&coordinate) {
            Some(&idx) => {
                self.cells[idx].push(sample);
                (coordinate, false)
            }
            None => {
                let cell = HeatmapCell::new(coordinate, grid.to_world(coordinate), sample);
                self.index.insert(coordinate, self.cells.len());
                self.cells.push(cell);
                (coordinate, true)
            }
        }
    }

    /// Insert a whole cell; never overwrites. Returns false if occupied.
    pub fn insert_cell(&mut self, cell: HeatmapCell) -> bool {
        if self.index.contains_key(&cell.coordinate) {
            return false;
        }
        self.index.insert(cell.coordinate, self.cells.len());
        self.cells.push(cell);
        true
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.index.clear();
    }

    pub fn into_cells(self) -> Vec<HeatmapCell> {
        self.cells
    }
}
