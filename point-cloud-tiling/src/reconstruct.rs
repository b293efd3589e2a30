/// Surface reconstruction collaborator and a heightfield reference implementation
use crate::bounds::PointCloudBounds;
use crate::error::Result;
use crate::mesh::{Mesh, Reconstruction};
use crate::point::PointRecord;

/// External surface reconstruction: points to a triangle mesh with
/// per-vertex confidence. `None` for degenerate or empty input.
pub trait SurfaceReconstructor: Sync {
    fn reconstruct(&self, points: &[PointRecord], depth: u32) -> Result<Option<Reconstruction>>;
}

/// Deepest grid the heightfield reconstructor will build (4096 cells per side).
pub const MAX_HEIGHTFIELD_DEPTH: u32 = 12;

/// 2.5D reconstruction over a regular x/y grid of `2^depth` cells per side.
///
/// Each occupied cell becomes one vertex at the cell centre with the mean z of
/// its points; confidence is the number of supporting points. Adjacent occupied
/// cells are joined into triangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeightfieldReconstructor;

impl HeightfieldReconstructor {
    fn grid_cell(bounds: &PointCloudBounds, cells: usize, x: f64, y: f64) -> (usize, usize) {
        let max = (cells - 1) as f64;
        let cx = (bounds.normalize_x(x) * cells as f64).clamp(0.0, max) as usize;
        let cy = (bounds.normalize_y(y) * cells as f64).clamp(0.0, max) as usize;
        (cx, cy)
    }
}

impl SurfaceReconstructor for HeightfieldReconstructor {
    fn reconstruct(&self, points: &[PointRecord], depth: u32) -> Result<Option<Reconstruction>> {
        if points.len() < 3 {
            return Ok(None);
        }
        let bounds = PointCloudBounds::from_positions(points.iter().map(|p| &p.position));
        let (width, height, _) = bounds.dimensions();
        if !(width > 0.0 && height > 0.0) {
            return Ok(None);
        }

        let cells = 1usize << depth.clamp(1, MAX_HEIGHTFIELD_DEPTH);
        let mut height_sum = vec![0.0f64; cells * cells];
        let mut support = vec![0u32; cells * cells];
        for point in points {
            let (cx, cy) = Self::grid_cell(&bounds, cells, point.x(), point.y());
            let idx = cy * cells + cx;
            height_sum[idx] += point.z();
            support[idx] += 1;
        }

        let cell_w = width / cells as f64;
        let cell_h = height / cells as f64;
        let mut vertex_of = vec![u32::MAX; cells * cells];
        let mut mesh = Mesh::default();
        let mut confidence = Vec::new();
        for cy in 0..cells {
            for cx in 0..cells {
                let idx = cy * cells + cx;
                if support[idx] == 0 {
                    continue;
                }
                vertex_of[idx] = mesh.vertices.len() as u32;
                mesh.vertices.push([
                    bounds.min_x + (cx as f64 + 0.5) * cell_w,
                    bounds.min_y + (cy as f64 + 0.5) * cell_h,
                    height_sum[idx] / support[idx] as f64,
                ]);
                confidence.push(support[idx] as f64);
            }
        }

        // Each 2x2 block of cells contributes up to two triangles.
        for cy in 0..cells - 1 {
            for cx in 0..cells - 1 {
                let a = vertex_of[cy * cells + cx];
                let b = vertex_of[cy * cells + cx + 1];
                let c = vertex_of[(cy + 1) * cells + cx];
                let d = vertex_of[(cy + 1) * cells + cx + 1];
                let present = [a, b, c, d].iter().filter(|&&v| v != u32::MAX).count();
                match present {
                    4 => {
                        mesh.triangles.push([a, b, d]);
                        mesh.triangles.push([a, d, c]);
                    }
                    3 => {
                        let corners: Vec<u32> =
                            [a, b, d, c].into_iter().filter(|&v| v != u32::MAX).collect();
                        mesh.triangles.push([corners[0], corners[1], corners[2]]);
                    }
                    _ => {}
                }
            }
        }

        if mesh.is_empty() {
            return Ok(None);
        }
        Ok(Some(Reconstruction { mesh, confidence }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Rgb8;

    fn grid_points(n: usize, spacing: f64) -> Vec<PointRecord> {
        let mut points = Vec::new();
        for j in 0..n {
            for i in 0..n {
                points.push(PointRecord::new(
                    i as f64 * spacing,
                    j as f64 * spacing,
                    (i + j) as f64,
                    Rgb8([100, 100, 100]),
                ));
            }
        }
        points
    }

    #[test]
    fn dense_grid_reconstructs_full_surface() {
        let reconstruction = HeightfieldReconstructor
            .reconstruct(&grid_points(16, 1.0), 2)
            .unwrap()
            .expect("surface");
        // 4x4 cells, all occupied: 16 vertices, 3x3 blocks of two triangles.
        assert_eq!(reconstruction.mesh.vertices.len(), 16);
        assert_eq!(reconstruction.mesh.triangle_count(), 18);
        assert_eq!(reconstruction.confidence.len(), 16);
        assert_eq!(reconstruction.confidence.iter().sum::<f64>(), 256.0);
    }

    #[test]
    fn degenerate_input_is_absent() {
        let line: Vec<_> = (0..10)
            .map(|i| PointRecord::new(i as f64, 0.0, 0.0, Rgb8::SENTINEL))
            .collect();
        assert!(HeightfieldReconstructor.reconstruct(&line, 4).unwrap().is_none());
        assert!(HeightfieldReconstructor.reconstruct(&line[..2], 4).unwrap().is_none());
        assert!(HeightfieldReconstructor.reconstruct(&[], 4).unwrap().is_none());
    }

    #[test]
    fn vertex_heights_are_cell_means() {
        let points = vec![
            PointRecord::new(0.0, 0.0, 2.0, Rgb8::SENTINEL),
            PointRecord::new(0.1, 0.1, 4.0, Rgb8::SENTINEL),
            PointRecord::new(1.0, 0.0, 0.0, Rgb8::SENTINEL),
            PointRecord::new(0.0, 1.0, 0.0, Rgb8::SENTINEL),
        ];
        let reconstruction = HeightfieldReconstructor
            .reconstruct(&points, 1)
            .unwrap()
            .expect("surface");
        assert_eq!(reconstruction.mesh.vertices[0][2], 3.0);
        assert_eq!(reconstruction.confidence[0], 2.0);
        assert_eq!(reconstruction.mesh.triangle_count(), 1);
    }
}
