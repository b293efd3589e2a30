/// Chunk spiller and the disk-backed arena of spill units it fills
use crate::error::Result;
use crate::grid::{TileKey, tile_key};
use crate::ply::write_points;
use crate::point::PointRecord;
use log::debug;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One persisted group of points for a (tile, chunk) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SpillUnit {
    pub key: TileKey,
    pub chunk_index: usize,
    pub path: PathBuf,
    pub point_count: usize,
}

/// Append-only arena of spill units addressed by (TileKey, chunk_index).
///
/// Only unit locations are held in memory; point data lives on disk.
/// Units of a tile are kept in ascending chunk order.
#[derive(Debug)]
pub struct SpillArena {
    dir: PathBuf,
    units: BTreeMap<TileKey, Vec<SpillUnit>>,
}

impl SpillArena {
    /// Create an empty arena backed by `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            units: BTreeMap::new(),
        })
    }

    /// Location a unit for (key, chunk) is written to.
    pub fn unit_path(&self, key: TileKey, chunk_index: usize) -> PathBuf {
        self.dir.join(key.spill_file_name(chunk_index))
    }

    /// Register a unit whose file has been fully written.
    pub fn register(&mut self, unit: SpillUnit) {
        let units = self.units.entry(unit.key).or_default();
        debug_assert!(
            units.last().is_none_or(|last| last.chunk_index < unit.chunk_index),
            "spill units of a tile must arrive once per chunk, in chunk order"
        );
        units.push(unit);
    }

    /// Tile keys that received at least one unit, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &TileKey> {
        self.units.keys()
    }

    /// Units of one tile in chunk order.
    pub fn units(&self, key: &TileKey) -> &[SpillUnit] {
        self.units.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tile_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    /// Delete every spill file and the arena directory.
    pub fn purge(self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        debug!("Purged {} spill units", self.unit_count());
        Ok(())
    }
}

/// Groups one chunk of points by tile and persists each group as a spill unit.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSpiller {
    origin: [f64; 3],
    tile_size: f64,
}

impl ChunkSpiller {
    pub fn new(origin: [f64; 3], tile_size: f64) -> Self {
        Self { origin, tile_size }
    }

    /// Group a chunk's points by tile key. Input order is kept within a group.
    pub fn group(&self, chunk: Vec<PointRecord>) -> BTreeMap<TileKey, Vec<PointRecord>> {
        let mut groups: BTreeMap<TileKey, Vec<PointRecord>> = BTreeMap::new();
        for point in chunk {
            let key = tile_key(&point.position, &self.origin, self.tile_size);
            groups.entry(key).or_default().push(point);
        }
        groups
    }

    /// Spill one chunk: at most one unit per tile present in the chunk.
    /// Returns the number of units written.
    pub fn spill(
        &self,
        arena: &mut SpillArena,
        chunk_index: usize,
        chunk: Vec<PointRecord>,
    ) -> Result<usize> {
        let groups = self.group(chunk);
        let units = groups
            .into_par_iter()
            .map(|(key, points)| -> Result<SpillUnit> {
                let path = arena.unit_path(key, chunk_index);
                write_points(&path, &points)?;
                Ok(SpillUnit {
                    key,
                    chunk_index,
                    path,
                    point_count: points.len(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let written = units.len();
        for unit in units {
            arena.register(unit);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Rgb8;

    fn point(x: f64, y: f64) -> PointRecord {
        PointRecord::new(x, y, 0.0, Rgb8([10, 20, 30]))
    }

    #[test]
    fn group_splits_by_tile() {
        let spiller = ChunkSpiller::new([0.0, 0.0, 0.0], 10.0);
        let groups = spiller.group(vec![point(1.0, 1.0), point(15.0, 1.0), point(2.0, 3.0)]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&TileKey::new(0, 0)].len(), 2);
        assert_eq!(groups[&TileKey::new(0, 0)][1], point(2.0, 3.0));
        assert_eq!(groups[&TileKey::new(1, 0)].len(), 1);
    }

    #[test]
    fn spill_writes_one_unit_per_tile_and_chunk() {
        let tmp = tempfile::tempdir().unwrap();
        let mut arena = SpillArena::create(&tmp.path().join("tmp")).unwrap();
        let spiller = ChunkSpiller::new([0.0, 0.0, 0.0], 10.0);

        let written = spiller
            .spill(&mut arena, 0, vec![point(1.0, 1.0), point(2.0, 2.0), point(11.0, 1.0)])
            .unwrap();
        assert_eq!(written, 2);
        spiller.spill(&mut arena, 1, vec![point(3.0, 3.0)]).unwrap();

        assert_eq!(arena.tile_count(), 2);
        assert_eq!(arena.unit_count(), 3);
        let units = arena.units(&TileKey::new(0, 0));
        assert_eq!(
            units.iter().map(|u| u.chunk_index).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(units[0].point_count, 2);
        assert!(units[1].path.ends_with("tile_0_0_chunk_1.ply"));
        assert!(units.iter().all(|u| u.path.exists()));
    }

    #[test]
    fn purge_removes_spill_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("tmp");
        let mut arena = SpillArena::create(&dir).unwrap();
        ChunkSpiller::new([0.0; 3], 1.0)
            .spill(&mut arena, 0, vec![point(0.5, 0.5)])
            .unwrap();
        arena.purge().unwrap();
        assert!(!dir.exists());
    }
}
