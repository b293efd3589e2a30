/// Out-of-core spatial tiler: streams a point cloud into per-tile datasets
/// holding at most one chunk of points in memory at a time.
use crate::bounds::PointCloudBounds;
use crate::error::{PipelineError, Result};
use crate::merge::{TileDataset, TileMerger};
use crate::progress;
use crate::source::PointSource;
use crate::spill::{ChunkSpiller, SpillArena};
use log::info;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct SpatialTiler {
    pub tile_size: f64,
    pub chunk_size: usize,
    pub show_progress: bool,
}

/// What one tiling pass produced.
#[derive(Debug, Clone)]
pub struct TilingSummary {
    pub bounds: PointCloudBounds,
    pub input_points: u64,
    pub chunks: usize,
    pub spill_units: usize,
    /// Non-empty tiles in key order.
    pub tiles: Vec<TileDataset>,
}

impl SpatialTiler {
    pub fn new(tile_size: f64, chunk_size: usize) -> Self {
        Self {
            tile_size,
            chunk_size,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Partition `source` into tile datasets under `output_dir`, using
    /// `spill_dir` for intermediate units. Spill storage is purged on success.
    pub fn run(
        &self,
        source: &mut dyn PointSource,
        output_dir: &Path,
        spill_dir: &Path,
    ) -> Result<TilingSummary> {
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "tile size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.chunk_size == 0 {
            return Err(PipelineError::InvalidConfig("chunk size must be at least 1".into()));
        }

        let bounds = source.bounds();
        let origin = [bounds.min_x, bounds.min_y, bounds.min_z];
        info!(
            "Tiling with {} m tiles from origin ({:.2}, {:.2}), {} points per chunk",
            self.tile_size, origin[0], origin[1], self.chunk_size
        );
        if !source.has_colour() {
            info!("No colour data found, every point gets the sentinel colour");
        }

        let spiller = ChunkSpiller::new(origin, self.tile_size);
        let mut arena = SpillArena::create(spill_dir)?;

        let pb = match source.len_hint() {
            Some(len) => progress::bar(len, "points", "Spilling chunks", self.show_progress),
            None => progress::spinner("Spilling chunks", self.show_progress),
        };

        let mut input_points = 0u64;
        let mut chunk_index = 0usize;
        loop {
            let chunk = source.read_chunk(self.chunk_size)?;
            if chunk.is_empty() {
                break;
            }
            let chunk_len = chunk.len() as u64;
            spiller.spill(&mut arena, chunk_index, chunk)?;
            input_points += chunk_len;
            chunk_index += 1;
            pb.inc(chunk_len);
        }
        pb.finish_with_message("Chunks spilled");

        let spill_units = arena.unit_count();
        info!(
            "Spilled {} points in {} chunks into {} units across {} tiles",
            input_points,
            chunk_index,
            spill_units,
            arena.tile_count()
        );

        let tiles = TileMerger::new(output_dir, self.show_progress).merge_all(arena)?;

        Ok(TilingSummary {
            bounds,
            input_points,
            chunks: chunk_index,
            spill_units,
            tiles,
        })
    }
}
