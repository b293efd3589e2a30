/// Tile merger: concatenates a tile's spill units into its final dataset
use crate::error::Result;
use crate::grid::TileKey;
use crate::ply::PointSetWriter;
use crate::progress;
use crate::spill::{SpillArena, SpillUnit};
use log::info;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Final, durable point set of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDataset {
    pub key: TileKey,
    pub path: PathBuf,
    pub point_count: usize,
}

#[derive(Debug, Clone)]
pub struct TileMerger {
    output_dir: PathBuf,
    show_progress: bool,
}

impl TileMerger {
    pub fn new(output_dir: &Path, show_progress: bool) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            show_progress,
        }
    }

    /// Stream every unit of `key`, in the given (chunk) order, into one dataset file,
    /// then delete the units. A tile without points gets no file.
    pub fn merge_tile(&self, key: TileKey, units: &[SpillUnit]) -> Result<Option<TileDataset>> {
        let point_count: usize = units.iter().map(|u| u.point_count).sum();
        if point_count == 0 {
            return Ok(None);
        }

        let path = self.output_dir.join(key.dataset_file_name());
        let mut writer = PointSetWriter::create(&path, point_count)?;
        for unit in units {
            writer.append_file(&unit.path)?;
        }
        writer.finish()?;

        for unit in units {
            fs::remove_file(&unit.path)?;
        }

        Ok(Some(TileDataset {
            key,
            path,
            point_count,
        }))
    }

    /// Merge every tile of the arena, then purge spill storage entirely.
    /// Tiles are independent and merged in parallel; results are in key order.
    pub fn merge_all(&self, arena: SpillArena) -> Result<Vec<TileDataset>> {
        let keys: Vec<TileKey> = arena.keys().copied().collect();
        let pb = progress::bar(keys.len() as u64, "tiles", "Merging spill units", self.show_progress);

        let merged = keys
            .par_iter()
            .map(|key| {
                let dataset = self.merge_tile(*key, arena.units(key));
                pb.inc(1);
                dataset
            })
            .collect::<Result<Vec<_>>>()?;
        pb.finish_with_message("Tiles merged");

        arena.purge()?;

        let datasets: Vec<TileDataset> = merged.into_iter().flatten().collect();
        info!(
            "Wrote {} tile datasets to {}",
            datasets.len(),
            self.output_dir.display()
        );
        Ok(datasets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::read_points;
    use crate::point::{PointRecord, Rgb8};
    use crate::spill::ChunkSpiller;

    #[test]
    fn merge_concatenates_in_chunk_order_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let spill_dir = tmp.path().join("tmp");
        let mut arena = SpillArena::create(&spill_dir).unwrap();
        let spiller = ChunkSpiller::new([0.0; 3], 10.0);

        let a = PointRecord::new(1.0, 1.0, 0.0, Rgb8([1, 1, 1]));
        let b = PointRecord::new(2.0, 2.0, 0.0, Rgb8([2, 2, 2]));
        let c = PointRecord::new(3.0, 3.0, 0.0, Rgb8([3, 3, 3]));
        spiller.spill(&mut arena, 0, vec![a, b]).unwrap();
        spiller.spill(&mut arena, 1, vec![c]).unwrap();

        let merger = TileMerger::new(tmp.path(), false);
        let datasets = merger.merge_all(arena).unwrap();

        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].point_count, 3);
        assert_eq!(read_points(&datasets[0].path).unwrap(), vec![a, b, c]);
        assert!(!spill_dir.exists());
    }

    #[test]
    fn empty_tile_gets_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let merger = TileMerger::new(tmp.path(), false);
        let key = TileKey::new(4, 4);
        assert_eq!(merger.merge_tile(key, &[]).unwrap(), None);
        assert!(!tmp.path().join(key.dataset_file_name()).exists());
    }
}
