/// Triangle meshes produced by surface reconstruction
use crate::bounds::PointCloudBounds;
use crate::grid::TileKey;
use std::path::PathBuf;

/// Vertex positions plus triangle index triples. No topology repair is done here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

/// Reconstruction output: a mesh and one confidence value per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    pub mesh: Mesh,
    pub confidence: Vec<f64>,
}

/// A tile's mesh as persisted between stages.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMesh {
    pub key: TileKey,
    pub path: PathBuf,
    pub triangle_count: u64,
}

impl Mesh {
    pub fn triangle_count(&self) -> u64 {
        self.triangles.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> PointCloudBounds {
        PointCloudBounds::from_positions(&self.vertices)
    }

    /// Drop vertices no triangle references and renumber the rest, keeping order.
    pub fn compact(&mut self) {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &index in triangle {
                used[index as usize] = true;
            }
        }
        self.retain_vertices(&used);
    }

    /// Keep vertices where `keep[i]` holds. Triangles touching a removed vertex go too.
    pub fn retain_vertices(&mut self, keep: &[bool]) {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (i, vertex) in self.vertices.iter().enumerate() {
            if keep[i] {
                remap[i] = vertices.len() as u32;
                vertices.push(*vertex);
            }
        }
        self.triangles = self
            .triangles
            .iter()
            .filter_map(|t| {
                let mapped = [
                    remap[t[0] as usize],
                    remap[t[1] as usize],
                    remap[t[2] as usize],
                ];
                (!mapped.contains(&u32::MAX)).then_some(mapped)
            })
            .collect();
        self.vertices = vertices;
    }
}

/// Linearly interpolated percentile of `values`, `percentile` in [0, 100].
pub fn percentile(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (percentile / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

impl Reconstruction {
    /// Remove vertices whose confidence falls strictly below the given percentile,
    /// every triangle touching them, and any vertex left unreferenced.
    pub fn trim_low_confidence(self, trim_percentile: f64) -> Mesh {
        let Reconstruction {
            mut mesh,
            confidence,
        } = self;
        if trim_percentile > 0.0 && confidence.len() == mesh.vertices.len() {
            if let Some(threshold) = percentile(&confidence, trim_percentile) {
                let keep: Vec<bool> = confidence.iter().map(|&c| c >= threshold).collect();
                mesh.retain_vertices(&keep);
            }
        }
        mesh.compact();
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [5.0, 5.0, 5.0],
            ],
            triangles: vec![[0, 1, 2], [1, 3, 2]],
        }
    }

    #[test]
    fn compact_drops_unreferenced_vertices() {
        let mut mesh = quad();
        mesh.compact();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert_eq!(percentile(&values, 12.5), Some(1.5));
        assert_eq!(percentile(&[], 5.0), None);
    }

    #[test]
    fn trimming_removes_lowest_confidence_vertex_and_its_triangles() {
        let reconstruction = Reconstruction {
            mesh: quad(),
            confidence: vec![0.1, 5.0, 5.0, 5.0, 5.0],
        };
        let mesh = reconstruction.trim_low_confidence(5.0);
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert!(!mesh.vertices.contains(&[0.0, 0.0, 0.0]));
    }

    #[test]
    fn uniform_confidence_keeps_everything() {
        let reconstruction = Reconstruction {
            mesh: quad(),
            confidence: vec![1.0; 5],
        };
        assert_eq!(reconstruction.trim_low_confidence(5.0).triangle_count(), 2);
    }
}
