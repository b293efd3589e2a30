/// Grid index: maps points onto integer tile keys in the x/y plane
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer grid coordinates of a tile. Equal keys mean the same tile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileKey {
    pub grid_x: i64,
    pub grid_y: i64,
}

impl TileKey {
    pub fn new(grid_x: i64, grid_y: i64) -> Self {
        Self { grid_x, grid_y }
    }

    /// Base file name shared by every artifact of this tile.
    pub fn base_name(&self) -> String {
        format!("tile_{}_{}", self.grid_x, self.grid_y)
    }

    /// File name of the merged tile dataset.
    pub fn dataset_file_name(&self) -> String {
        format!("{}.ply", self.base_name())
    }

    /// File name of one spill unit of this tile.
    pub fn spill_file_name(&self, chunk_index: usize) -> String {
        format!("{}_chunk_{}.ply", self.base_name(), chunk_index)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.grid_x, self.grid_y)
    }
}

/// Tile holding `point`, measured from `origin` in cells of `tile_size`.
///
/// Only x and y take part; z is carried by the record but never partitions.
pub fn tile_key(point: &[f64; 3], origin: &[f64; 3], tile_size: f64) -> TileKey {
    TileKey {
        grid_x: ((point[0] - origin[0]) / tile_size).floor() as i64,
        grid_y: ((point[1] - origin[1]) / tile_size).floor() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_floor_from_origin() {
        let origin = [0.0, 0.0, 0.0];
        assert_eq!(tile_key(&[0.0, 0.0, 0.0], &origin, 100.0), TileKey::new(0, 0));
        assert_eq!(tile_key(&[150.0, 0.0, 0.0], &origin, 100.0), TileKey::new(1, 0));
        assert_eq!(tile_key(&[0.0, 150.0, 0.0], &origin, 100.0), TileKey::new(0, 1));
        assert_eq!(tile_key(&[99.999, 99.999, 0.0], &origin, 100.0), TileKey::new(0, 0));
        assert_eq!(tile_key(&[-0.5, 0.0, 0.0], &origin, 100.0), TileKey::new(-1, 0));
    }

    #[test]
    fn z_does_not_partition() {
        let origin = [10.0, 20.0, -5.0];
        let low = tile_key(&[55.0, 75.0, -1000.0], &origin, 25.0);
        let high = tile_key(&[55.0, 75.0, 1000.0], &origin, 25.0);
        assert_eq!(low, high);
        assert_eq!(low, TileKey::new(1, 2));
    }

    #[test]
    fn same_cell_means_same_key() {
        let origin = [3.0, 4.0, 0.0];
        for i in 0..50 {
            let a = [3.0 + i as f64 * 0.37, 4.0 + i as f64 * 0.11, 0.0];
            let b = [a[0] + 1e-9, a[1], 7.0];
            let ka = tile_key(&a, &origin, 2.0);
            assert_eq!(ka, tile_key(&a, &origin, 2.0));
            if ((a[0] - 3.0) / 2.0).floor() == ((b[0] - 3.0) / 2.0).floor() {
                assert_eq!(ka, tile_key(&b, &origin, 2.0));
            }
        }
    }

    #[test]
    fn artifact_names_follow_key() {
        let key = TileKey::new(-3, 12);
        assert_eq!(key.base_name(), "tile_-3_12");
        assert_eq!(key.spill_file_name(4), "tile_-3_12_chunk_4.ply");
        assert_eq!(key.dataset_file_name(), "tile_-3_12.ply");
    }
}
