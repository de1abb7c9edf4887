use crate::cell::{CellMap, HeatmapCell};
use crate::grid::{GridCoordinate, GridIndex};
use crate::types::Sample;

/// Append-only sample log plus the live per-cell view
///
/// The log only ever holds measured samples. Synthetic samples produced by
/// post-processing live in the cells.
#[derive(Clone, Debug, Default)]
pub struct SampleStore {
    grid: GridIndex,
    log: Vec<Sample>,
    cells: CellMap,
}

impl SampleStore {
    pub fn new(grid: GridIndex) -> Self {
        SampleStore {
            grid,
            log: Vec::with_capacity(512),
            cells: CellMap::new(),
        }
    }

    /// Rebuild log and cells from an ordered sample set
    pub fn from_samples(grid: GridIndex, samples: Vec<Sample>) -> Self {
        let cells = CellMap::from_samples(&grid, &samples);
        SampleStore {
            grid,
            log: samples,
            cells,
        }
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    /// Append to the log and bucket into the owning cell
    pub fn append(&mut self, sample: Sample) -> GridCoordinate {
        let (coordinate, _) = self.cells.insert_sample(&self.grid, sample.clone());
        self.log.push(sample);
        coordinate
    }

    pub fn samples(&self) -> &[Sample] {
        &self.log
    }

    pub fn sample_count(&self) -> usize {
        self.log.len()
    }

    pub fn cells(&self) -> &[HeatmapCell] {
        self.cells.cells()
    }

    /// Take the live cells out for post-processing
    pub fn take_cells(&mut self) -> CellMap {
        std::mem::take(&mut self.cells)
    }

    /// Install post-processed cells
    pub fn replace_cells(&mut self, cells: CellMap) {
        self.cells = cells;
    }

    /// Re-bucket the log onto `grid`, discarding post-processed cells
    pub fn rebuild_cells(&mut self, grid: GridIndex) {
        self.grid = grid;
        self.cells = CellMap::from_samples(&self.grid, &self.log);
    }

    /// Drop everything and adopt a new grid
    pub fn reset(&mut self, grid: GridIndex) {
        self.grid = grid;
        self.log.clear();
        self.cells.clear();
    }
}
