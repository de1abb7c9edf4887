use glam::Vec3;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Integer cell coordinate in the sparse 3D grid
#[derive(Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Debug, Default, Serialize)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        GridCoordinate { x, y, z }
    }

    /// None when the shifted coordinate leaves the i32 range
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(GridCoordinate {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// Every coordinate in the cube of half-width `radius` around this one,
    /// excluding the center
    ///
    /// Order: x-major, then y, then z (deterministic). Coordinates past the
    /// edge of the i32 range are skipped.
    pub fn cube(&self, radius: u32) -> impl Iterator<Item = GridCoordinate> + '_ {
        let r = radius as i32;
        (-r..=r).flat_map(move |dx| {
            (-r..=r).flat_map(move |dy| {
                (-r..=r).filter_map(move |dz| {
                    if dx == 0 && dy == 0 && dz == 0 {
                        None
                    } else {
                        self.offset(dx, dy, dz)
                    }
                })
            })
        })
    }

    /// The 26 face/edge/corner-adjacent coordinates
    pub fn neighbors(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.cube(1)
    }

    /// Chebyshev distance in cells
    pub fn chebyshev_distance(&self, other: &GridCoordinate) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        let dz = (self.z as i64 - other.z as i64).unsigned_abs();
        dx.max(dy).max(dz).min(u32::MAX as u64) as u32
    }
}

impl Display for GridCoordinate {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "cell_{}_{}_{}", self.x, self.y, self.z)
    }
}

/// Quantizes world positions onto cubic cells of side `cell_size`
///
/// A coordinate `c` owns the cube centered on `c * cell_size`, so
/// `to_grid` rounds to the nearest integer on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridIndex {
    cell_size: f32,
}

impl GridIndex {
    /// Falls back to the default cell size when `cell_size` is not a positive finite number
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            crate::config::DEFAULT_CELL_SIZE
        };
        GridIndex { cell_size }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position → owning cell
    pub fn to_grid(&self, position: Vec3) -> GridCoordinate {
        let scaled = (position / self.cell_size).round();
        GridCoordinate {
            x: scaled.x as i32,
            y: scaled.y as i32,
            z: scaled.z as i32,
        }
    }

    /// Cell → world-space center
    pub fn to_world(&self, coordinate: GridCoordinate) -> Vec3 {
        Vec3::new(
            coordinate.x as f32 * self.cell_size,
            coordinate.y as f32 * self.cell_size,
            coordinate.z as f32 * self.cell_size,
        )
    }

    /// Area of one cell face in square meters
    pub fn cell_area(&self) -> f32 {
        self.cell_size * self.cell_size
    }
}

impl Default for GridIndex {
    fn default() -> Self {
        GridIndex::new(crate::config::DEFAULT_CELL_SIZE)
    }
}
