/// Mesh decimation collaborator and a vertex-clustering reference implementation
use crate::error::Result;
use crate::mesh::Mesh;
use std::collections::{BTreeSet, HashMap};

/// External polygon-count reduction. The result may exceed or undershoot
/// `target_triangle_count`; a target of zero may yield an empty mesh.
pub trait MeshDecimator: Sync {
    fn decimate(&self, mesh: Mesh, target_triangle_count: u64) -> Result<Mesh>;
}

/// Clusters vertices on a shrinking x/y grid until the mesh fits the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexClusterDecimator;

impl VertexClusterDecimator {
    /// Merge every vertex of a `cells` x `cells` grid cell into its mean position.
    fn cluster(mesh: &Mesh, cells: usize) -> Mesh {
        let bounds = mesh.bounds();
        let max = (cells - 1) as f64;
        let mut cluster_of: HashMap<(usize, usize), u32> = HashMap::new();
        let mut sums: Vec<([f64; 3], u32)> = Vec::new();
        let mut remap = Vec::with_capacity(mesh.vertices.len());

        for vertex in &mesh.vertices {
            let cx = (bounds.normalize_x(vertex[0]) * cells as f64).clamp(0.0, max) as usize;
            let cy = (bounds.normalize_y(vertex[1]) * cells as f64).clamp(0.0, max) as usize;
            let id = *cluster_of.entry((cx, cy)).or_insert_with(|| {
                sums.push(([0.0; 3], 0));
                (sums.len() - 1) as u32
            });
            let (sum, count) = &mut sums[id as usize];
            for axis in 0..3 {
                sum[axis] += vertex[axis];
            }
            *count += 1;
            remap.push(id);
        }

        let vertices = sums
            .iter()
            .map(|(sum, count)| {
                let n = *count as f64;
                [sum[0] / n, sum[1] / n, sum[2] / n]
            })
            .collect();

        let mut seen = BTreeSet::new();
        let mut triangles = Vec::new();
        for t in &mesh.triangles {
            let mapped = [
                remap[t[0] as usize],
                remap[t[1] as usize],
                remap[t[2] as usize],
            ];
            if mapped[0] == mapped[1] || mapped[1] == mapped[2] || mapped[0] == mapped[2] {
                continue;
            }
            let mut canonical = mapped;
            canonical.sort_unstable();
            if seen.insert(canonical) {
                triangles.push(mapped);
            }
        }

        let mut clustered = Mesh {
            vertices,
            triangles,
        };
        clustered.compact();
        clustered
    }
}

impl MeshDecimator for VertexClusterDecimator {
    fn decimate(&self, mesh: Mesh, target_triangle_count: u64) -> Result<Mesh> {
        if mesh.triangle_count() <= target_triangle_count {
            return Ok(mesh);
        }
        if target_triangle_count == 0 {
            return Ok(Mesh::default());
        }

        // A clustered surface grid of n x n cells holds about 2n^2 triangles.
        let mut cells = ((target_triangle_count as f64 / 2.0).sqrt().ceil() as usize).max(1);
        loop {
            let clustered = Self::cluster(&mesh, cells);
            if clustered.triangle_count() <= target_triangle_count || cells == 1 {
                return Ok(clustered);
            }
            cells = (cells * 3 / 4).max(1);
        }
    }
}
