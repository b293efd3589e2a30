/// Polycount allocator: keeps the summed triangle count of all tiles under a budget
use crate::decimate::MeshDecimator;
use crate::error::{PipelineError, Result};
use crate::grid::TileKey;
use crate::mesh::TileMesh;
use crate::ply::{read_mesh, write_mesh};
use crate::progress;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

/// Requested triangle budget of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub key: TileKey,
    pub triangle_count: u64,
    pub target: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationPlan {
    /// Total already fits the budget; nothing to do.
    WithinBudget { total: u64 },
    /// Every tile gets `floor(maximum * count / total)`.
    Decimate {
        total: u64,
        allocations: Vec<Allocation>,
    },
}

/// Result of enforcing a plan over the tile meshes.
#[derive(Debug, Clone, Default)]
pub struct PolycountSummary {
    pub total_before: u64,
    /// Sum of the requested targets, not of the counts the decimator achieved.
    pub total_after: u64,
    pub decimated: bool,
    pub failed: Vec<TileKey>,
}

#[derive(Debug, Clone, Copy)]
pub struct PolycountAllocator {
    pub max_total_polycount: u64,
}

impl PolycountAllocator {
    pub fn new(max_total_polycount: u64) -> Self {
        Self {
            max_total_polycount,
        }
    }

    /// Compute proportional targets. Tiles without a mesh (`None`) are skipped
    /// and add nothing to the total.
    pub fn plan(&self, counts: &[(TileKey, Option<u64>)]) -> AllocationPlan {
        let present: Vec<(TileKey, u64)> = counts
            .iter()
            .filter_map(|(key, count)| count.map(|c| (*key, c)))
            .collect();
        let total: u64 = present.iter().map(|(_, c)| c).sum();
        if total <= self.max_total_polycount {
            return AllocationPlan::WithinBudget { total };
        }

        let allocations = present
            .into_iter()
            .map(|(key, triangle_count)| Allocation {
                key,
                triangle_count,
                target: (self.max_total_polycount as u128 * triangle_count as u128
                    / total as u128) as u64,
            })
            .collect();
        AllocationPlan::Decimate { total, allocations }
    }

    /// Apply the plan to persisted tile meshes. Must run after every tile's
    /// triangle count is known. Each mesh file is replaced in place and its
    /// recorded count set to the requested target (the decimator's actual
    /// count may differ). Tiles whose decimation fails are removed from `tiles`.
    pub fn enforce(
        &self,
        tiles: &mut Vec<TileMesh>,
        decimator: &dyn MeshDecimator,
        show_progress: bool,
    ) -> Result<PolycountSummary> {
        let counts: Vec<(TileKey, Option<u64>)> = tiles
            .iter()
            .map(|t| (t.key, Some(t.triangle_count)))
            .collect();

        let (total, allocations) = match self.plan(&counts) {
            AllocationPlan::WithinBudget { total } => {
                info!(
                    "Total polycount {} within maximum {}, no decimation",
                    total, self.max_total_polycount
                );
                return Ok(PolycountSummary {
                    total_before: total,
                    total_after: total,
                    decimated: false,
                    failed: Vec::new(),
                });
            }
            AllocationPlan::Decimate { total, allocations } => (total, allocations),
        };

        info!(
            "Total polycount {} exceeds maximum {}, decimating {} meshes",
            total,
            self.max_total_polycount,
            allocations.len()
        );

        let pb = progress::bar(tiles.len() as u64, "meshes", "Decimating", show_progress);
        let outcomes: Vec<std::result::Result<u64, PipelineError>> = tiles
            .par_iter()
            .zip(allocations.par_iter())
            .map(|(tile, allocation)| {
                let outcome = decimate_file(tile, allocation.target, decimator);
                pb.inc(1);
                outcome
            })
            .collect();
        pb.finish_with_message("Meshes decimated");

        let mut failed = Vec::new();
        let mut kept = Vec::with_capacity(tiles.len());
        for (mut tile, outcome) in tiles.drain(..).zip(outcomes) {
            match outcome {
                Ok(target) => {
                    tile.triangle_count = target;
                    kept.push(tile);
                }
                Err(e) => {
                    warn!("Dropping tile {}: decimation failed: {}", tile.key, e);
                    failed.push(tile.key);
                }
            }
        }
        *tiles = kept;

        Ok(PolycountSummary {
            total_before: total,
            total_after: tiles.iter().map(|t| t.triangle_count).sum(),
            decimated: true,
            failed,
        })
    }
}

fn decimate_file(tile: &TileMesh, target: u64, decimator: &dyn MeshDecimator) -> Result<u64> {
    let mesh = read_mesh(&tile.path)?;
    let decimated = decimator.decimate(mesh, target)?;
    write_mesh(&tile.path, &decimated)?;
    Ok(target)
}
