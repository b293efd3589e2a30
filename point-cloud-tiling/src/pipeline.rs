/// End-to-end run: tiling, reconstruction, polycount allocation, texturing.
use crate::bake::{TextureBaker, TexturedTile};
use crate::config::PipelineConfig;
use crate::decimate::MeshDecimator;
use crate::error::{PipelineError, Result};
use crate::grid::TileKey;
use crate::layout::OutputLayout;
use crate::manifest::{MeshingCounts, RunReport, TexturingCounts, TilingCounts};
use crate::merge::TileDataset;
use crate::mesh::TileMesh;
use crate::ply::{read_mesh, read_points, write_mesh};
use crate::polycount::PolycountAllocator;
use crate::progress;
use crate::reconstruct::SurfaceReconstructor;
use crate::source::{LasSource, PointSource};
use crate::tiler::SpatialTiler;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Outcome of one tile in a tile-scoped stage.
enum TileOutcome<T> {
    Done(T),
    Dropped(TileKey),
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    reconstructor: &'a dyn SurfaceReconstructor,
    decimator: &'a dyn MeshDecimator,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: PipelineConfig,
        reconstructor: &'a dyn SurfaceReconstructor,
        decimator: &'a dyn MeshDecimator,
    ) -> Self {
        Self {
            config,
            reconstructor,
            decimator,
        }
    }

    /// Run on a LAS/LAZ file. A missing input fails before any output is touched.
    pub fn run_las(&self, input: &Path, output_root: &Path) -> Result<RunReport> {
        let mut source = LasSource::open(input)?;
        self.run(&mut source, &input.display().to_string(), output_root)
    }

    /// Run every stage on `source`, writing under `output_root`.
    pub fn run(
        &self,
        source: &mut dyn PointSource,
        input_label: &str,
        output_root: &Path,
    ) -> Result<RunReport> {
        self.config.validate()?;
        let started = Instant::now();
        let layout = OutputLayout::prepare(output_root)?;

        let tiling = SpatialTiler::new(self.config.tile_size, self.config.chunk_size)
            .with_progress(self.config.show_progress)
            .run(source, &layout.tiling, &layout.spill)?;
        info!("Split {} into {} tiles", input_label, tiling.tiles.len());

        let (mut meshes, dropped_by_reconstruction) =
            self.reconstruct_tiles(&tiling.tiles, &layout.meshing);
        info!("Generated {} meshes", meshes.len());

        // Barrier: the budget needs every tile's triangle count.
        let polycount = PolycountAllocator::new(self.config.max_total_polycount).enforce(
            &mut meshes,
            self.decimator,
            self.config.show_progress,
        )?;

        let (textured, dropped_by_texturing) =
            self.texture_tiles(&tiling.tiles, &meshes, &layout.texturing);
        info!("Textured {} meshes", textured.len());

        let report = RunReport {
            input: input_label.to_string(),
            bounds: tiling.bounds,
            config: self.config.clone(),
            tiling: TilingCounts {
                input_points: tiling.input_points,
                chunks: tiling.chunks,
                spill_units: tiling.spill_units,
                tiles_written: tiling.tiles.len(),
            },
            meshing: MeshingCounts {
                meshes_reconstructed: meshes.len() + polycount.failed.len(),
                dropped_by_reconstruction,
                total_triangles_before: polycount.total_before,
                total_triangles_after: polycount.total_after,
                decimated: polycount.decimated,
                dropped_by_decimation: polycount.failed,
            },
            texturing: TexturingCounts {
                textured: textured.len(),
                dropped_by_texturing,
            },
            elapsed_seconds: started.elapsed().as_secs_f64(),
        };
        report.write(&layout.report)?;
        report.log_summary();
        Ok(report)
    }

    /// Reconstruct, trim and persist each tile's mesh. Tiles are independent;
    /// a failed or absent reconstruction drops only that tile.
    fn reconstruct_tiles(
        &self,
        tiles: &[TileDataset],
        meshing_dir: &Path,
    ) -> (Vec<TileMesh>, Vec<TileKey>) {
        let pb = progress::bar(tiles.len() as u64, "tiles", "Meshing", self.config.show_progress);
        let outcomes: Vec<TileOutcome<TileMesh>> = tiles
            .par_iter()
            .map(|tile| {
                let outcome = match self.reconstruct_tile(tile, meshing_dir) {
                    Ok(Some(mesh)) => TileOutcome::Done(mesh),
                    Ok(None) => {
                        warn!("Dropping tile {}: no surface reconstructed", tile.key);
                        TileOutcome::Dropped(tile.key)
                    }
                    Err(e) => {
                        warn!("Dropping tile {}: {}", tile.key, e);
                        TileOutcome::Dropped(tile.key)
                    }
                };
                pb.inc(1);
                outcome
            })
            .collect();
        pb.finish_with_message("Meshes generated");
        split_outcomes(outcomes)
    }

    fn reconstruct_tile(&self, tile: &TileDataset, meshing_dir: &Path) -> Result<Option<TileMesh>> {
        let points = read_points(&tile.path)?;
        let reconstruction = self
            .reconstructor
            .reconstruct(&points, self.config.meshing_depth)
            .map_err(|e| PipelineError::Collaborator {
                tile: tile.key,
                reason: e.to_string(),
            })?;
        let Some(reconstruction) = reconstruction else {
            return Ok(None);
        };

        let mesh = reconstruction.trim_low_confidence(self.config.confidence_trim_percentile);
        if mesh.is_empty() {
            return Ok(None);
        }

        let path = meshing_dir.join(tile.key.dataset_file_name());
        write_mesh(&path, &mesh)?;
        Ok(Some(TileMesh {
            key: tile.key,
            path,
            triangle_count: mesh.triangle_count(),
        }))
    }

    /// Bake every surviving mesh against its own tile's points.
    fn texture_tiles(
        &self,
        tiles: &[TileDataset],
        meshes: &[TileMesh],
        texturing_dir: &Path,
    ) -> (Vec<TexturedTile>, Vec<TileKey>) {
        let datasets: HashMap<TileKey, &TileDataset> = tiles.iter().map(|t| (t.key, t)).collect();
        let baker = TextureBaker::new(self.config.texture_resolution, self.config.paint_mode);
        let pb = progress::bar(meshes.len() as u64, "meshes", "Texturing", self.config.show_progress);

        let outcomes: Vec<TileOutcome<TexturedTile>> = meshes
            .par_iter()
            .map(|tile_mesh| {
                let result = datasets
                    .get(&tile_mesh.key)
                    .ok_or_else(|| PipelineError::Collaborator {
                        tile: tile_mesh.key,
                        reason: "no point set for mesh".into(),
                    })
                    .and_then(|dataset| {
                        let points = read_points(&dataset.path)?;
                        let mesh = read_mesh(&tile_mesh.path)?;
                        baker.bake_to_dir(tile_mesh.key, &mesh, &points, texturing_dir)
                    });
                pb.inc(1);
                match result {
                    Ok(textured) => TileOutcome::Done(textured),
                    Err(e) => {
                        warn!("Dropping tile {}: texturing failed: {}", tile_mesh.key, e);
                        TileOutcome::Dropped(tile_mesh.key)
                    }
                }
            })
            .collect();
        pb.finish_with_message("Meshes textured");
        split_outcomes(outcomes)
    }
}

fn split_outcomes<T>(outcomes: Vec<TileOutcome<T>>) -> (Vec<T>, Vec<TileKey>) {
    let mut done = Vec::new();
    let mut dropped = Vec::new();
    for outcome in outcomes {
        match outcome {
            TileOutcome::Done(value) => done.push(value),
            TileOutcome::Dropped(key) => dropped.push(key),
        }
    }
    (done, dropped)
}
