/// Run report: per-stage tile counts so dropped tiles are visible
use crate::bounds::PointCloudBounds;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::grid::TileKey;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Tiling stage outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TilingCounts {
    pub input_points: u64,
    pub chunks: usize,
    pub spill_units: usize,
    pub tiles_written: usize,
}

/// Reconstruction and polycount stage outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MeshingCounts {
    pub meshes_reconstructed: usize,
    pub dropped_by_reconstruction: Vec<TileKey>,
    pub total_triangles_before: u64,
    /// Sum of requested decimation targets. The decimator's actual counts may differ.
    pub total_triangles_after: u64,
    pub decimated: bool,
    pub dropped_by_decimation: Vec<TileKey>,
}

/// Texturing stage outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TexturingCounts {
    pub textured: usize,
    pub dropped_by_texturing: Vec<TileKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: String,
    pub bounds: PointCloudBounds,
    pub config: PipelineConfig,
    pub tiling: TilingCounts,
    pub meshing: MeshingCounts,
    pub texturing: TexturingCounts,
    pub elapsed_seconds: f64,
}

impl RunReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Wrote run report: {}", path.display());
        Ok(())
    }

    /// Log a summary of every stage.
    pub fn log_summary(&self) {
        info!("Run summary for {}:", self.input);
        info!(
            "  Tiling: {} points in {} chunks -> {} tiles",
            self.tiling.input_points, self.tiling.chunks, self.tiling.tiles_written
        );
        info!(
            "  Meshing: {} meshes, {} dropped by reconstruction",
            self.meshing.meshes_reconstructed,
            self.meshing.dropped_by_reconstruction.len()
        );
        if self.meshing.decimated {
            info!(
                "  Polycount: {} -> {} requested, {} dropped by decimation",
                self.meshing.total_triangles_before,
                self.meshing.total_triangles_after,
                self.meshing.dropped_by_decimation.len()
            );
        } else {
            info!(
                "  Polycount: {} within budget",
                self.meshing.total_triangles_before
            );
        }
        info!(
            "  Texturing: {} textured, {} dropped",
            self.texturing.textured,
            self.texturing.dropped_by_texturing.len()
        );
        info!("  Total time: {:.2} s", self.elapsed_seconds);
    }
}
