use crate::cell::{CellMap, HeatmapCell};
use crate::config::HeatmapConfiguration;
use crate::grid::{GridCoordinate, GridIndex};
use crate::types::{Sample, SampleKind};
use glam::Vec3;
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// Raw samples influence candidates within this many cell widths
pub const INFLUENCE_RADIUS_CELLS: f32 = 3.0;
/// Distance floor for inverse-distance weights (meters)
pub const MIN_WEIGHT_DISTANCE: f32 = 0.01;

type IndexedPoint = GeomWithData<[f32; 3], usize>;

/// R-Tree over raw sample positions, payload = index into the sample log
///
/// # Architecture
/// - Bulk-loaded once per interpolation pass
/// - Radius queries return log indices so callers can read labels and strengths
pub struct RawSampleIndex {
    tree: RTree<IndexedPoint>,
}

impl RawSampleIndex {
    /// Index only measured samples; synthetic ones never seed interpolation
    pub fn build(samples: &[Sample]) -> Self {
        let points: Vec<IndexedPoint> = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_measured())
            .map(|(idx, s)| GeomWithData::new(s.position.to_array(), idx))
            .collect();

        RawSampleIndex {
            tree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Log indices of samples strictly closer than `radius`, ascending
    pub fn within(&self, position: Vec3, radius: f32) -> Vec<(usize, f32)> {
        let query = position.to_array();
        let mut hits: Vec<(usize, f32)> = self
            .tree
            .locate_within_distance(query, radius * radius)
            .map(|p| (p.data, Vec3::from_array(*p.geom()).distance(position)))
            .filter(|(_, dist)| *dist < radius)
            .collect();

        hits.sort_by_key(|(idx, _)| *idx);
        hits
    }
}

/// Fills empty cells near existing data by inverse-distance weighting over
/// raw samples
///
/// Candidates are drawn from the cells that exist before the pass starts, so
/// freshly interpolated cells never seed further interpolation.
#[derive(Clone, Copy, Debug)]
pub struct Interpolator {
    grid: GridIndex,
    search_radius: u32,
}

impl Interpolator {
    pub fn new(grid: GridIndex, search_radius: u32) -> Self {
        Interpolator {
            grid,
            search_radius,
        }
    }

    pub fn from_config(config: &HeatmapConfiguration) -> Self {
        Self::new(config.grid(), config.interpolation_radius())
    }

    /// Influence radius in meters
    pub fn influence_radius(&self) -> f32 {
        self.grid.cell_size() * INFLUENCE_RADIUS_CELLS
    }

    /// Returns `cells` plus any interpolated cells; existing cells are untouched
    pub fn interpolate(&self, mut cells: CellMap, samples: &[Sample]) -> CellMap {
        let index = RawSampleIndex::build(samples);
        if index.is_empty() || self.search_radius == 0 {
            return cells;
        }

        let seeds: Vec<GridCoordinate> = cells.coordinates().collect();
        let mut added = 0usize;

        for seed in &seeds {
            for candidate in seed.cube(self.search_radius) {
                if cells.contains(&candidate) {
                    continue;
                }

                let center = self.grid.to_world(candidate);
                if let Some(sample) = self.estimate_at(&index, samples, center) {
                    cells.insert_cell(HeatmapCell::new(candidate, center, sample));
                    added += 1;
                }
            }
        }

        log::debug!(
            "interpolation: {} seed cells, {} cells added",
            seeds.len(),
            added
        );
        cells
    }

    /// Weighted estimate at `position`, or None when no raw sample is in range
    ///
    /// weight = 1 / max(distance, MIN_WEIGHT_DISTANCE)
    pub fn estimate_at(
        &self,
        index: &RawSampleIndex,
        samples: &[Sample],
        position: Vec3,
    ) -> Option<Sample> {
        let nearby = index.within(position, self.influence_radius());
        if nearby.is_empty() {
            return None;
        }

        let mut total_weight = 0.0f64;
        let mut weighted_sum = 0.0f64;
        let mut nearest: Option<(usize, f32)> = None;

        for &(idx, dist) in &nearby {
            let weight = 1.0 / dist.max(MIN_WEIGHT_DISTANCE) as f64;
            total_weight += weight;
            weighted_sum += weight * samples[idx].strength as f64;

            if nearest.map_or(true, |(_, best)| dist < best) {
                nearest = Some((idx, dist));
            }
        }

        let (nearest_idx, _) = nearest?;
        let strength = (weighted_sum / total_weight).round() as i32;

        Some(Sample::derived(
            SampleKind::Interpolated,
            position,
            strength,
            &samples[nearest_idx],
        ))
    }
}
