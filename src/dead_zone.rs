use crate::cell::{CellMap, HeatmapCell};
use crate::config::HeatmapConfiguration;
use crate::grid::GridCoordinate;
use crate::types::{Sample, SignalQuality};
use glam::Vec3;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Cluster of weak cells, rebuilt from scratch on every detection pass
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeadZone {
    pub center: Vec3,
    pub radius: f32,
    pub average_strength: i32,
    /// Member cell coordinates, seed first
    pub cells: Vec<GridCoordinate>,
    /// Union of the member cells' samples
    pub measurements: Vec<Sample>,
}

impl DeadZone {
    pub fn member_count(&self) -> usize {
        self.cells.len()
    }

    pub fn quality(&self) -> SignalQuality {
        SignalQuality::from_strength(self.average_strength)
    }

    pub fn contains(&self, coordinate: &GridCoordinate) -> bool {
        self.cells.contains(coordinate)
    }
}

impl Display for DeadZone {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dead zone: {} dBm", self.average_strength)
    }
}

/// Groups weak cells into dead zones
///
/// # Algorithm
/// Single pass, seed based. Weak cells are visited in cell order; each
/// unclaimed cell becomes a seed and claims every other unclaimed weak cell
/// within `cluster_distance` of the seed itself (no chaining through
/// members). Clusters smaller than `min_cluster_size` are dropped.
#[derive(Clone, Copy, Debug)]
pub struct DeadZoneDetector {
    threshold: i32,
    cluster_distance: f32,
    min_cluster_size: usize,
    cell_size: f32,
}

impl DeadZoneDetector {
    pub fn new(threshold: i32, cluster_distance: f32, min_cluster_size: usize, cell_size: f32) -> Self {
        DeadZoneDetector {
            threshold,
            cluster_distance,
            min_cluster_size: min_cluster_size.max(1),
            cell_size,
        }
    }

    pub fn from_config(config: &HeatmapConfiguration) -> Self {
        Self::new(
            config.dead_zone_threshold(),
            config.cluster_distance(),
            config.min_cluster_size(),
            config.cell_size(),
        )
    }

    /// Average strictly below the threshold
    pub fn is_weak(&self, cell: &HeatmapCell) -> bool {
        cell.average_strength() < self.threshold
    }

    pub fn detect(&self, cells: &CellMap) -> Vec<DeadZone> {
        let weak: Vec<&HeatmapCell> = cells.iter().filter(|c| self.is_weak(c)).collect();
        let mut claimed = vec![false; weak.len()];
        let mut zones = Vec::new();

        for seed_idx in 0..weak.len() {
            if claimed[seed_idx] {
                continue;
            }
            claimed[seed_idx] = true;

            let seed = weak[seed_idx];
            let mut members = vec![seed];

            for other_idx in (seed_idx + 1)..weak.len() {
                if claimed[other_idx] {
                    continue;
                }
                let other = weak[other_idx];
                if seed.position().distance(other.position()) <= self.cluster_distance {
                    members.push(other);
                    claimed[other_idx] = true;
                }
            }

            if members.len() >= self.min_cluster_size {
                zones.push(self.build_zone(&members));
            }
        }

        log::debug!(
            "dead zones: {} weak cells, {} zones (threshold {} dBm)",
            weak.len(),
            zones.len(),
            self.threshold
        );
        zones
    }

    fn build_zone(&self, members: &[&HeatmapCell]) -> DeadZone {
        let count = members.len();
        let center = members.iter().fold(Vec3::ZERO, |acc, c| acc + c.position()) / count as f32;
        let strength_sum: i64 = members.iter().map(|c| c.average_strength() as i64).sum();

        DeadZone {
            center,
            radius: self.cell_size * (count as f32).sqrt(),
            average_strength: (strength_sum as f64 / count as f64).round() as i32,
            cells: members.iter().map(|c| c.coordinate()).collect(),
            measurements: members
                .iter()
                .flat_map(|c| c.samples().iter().cloned())
                .collect(),
        }
    }
}
