/// Planar UV projection of tile meshes
///
/// `u` grows with x and `v` grows with y, both normalised over the mesh's own
/// x/y bounding box. This is the bottom-left-origin convention of OBJ `vt`
/// records; the painter flips `v` when it addresses raster rows.
use crate::bounds::PointCloudBounds;
use crate::mesh::Mesh;

/// Projection frame derived from a mesh's planar extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvProjector {
    bounds: PointCloudBounds,
}

/// One `[u, v]` pair per mesh vertex, each in `[0, 1]`.
pub type UvMap = Vec<[f64; 2]>;

impl UvProjector {
    /// Frame over the mesh vertices. `None` for a mesh with no vertices.
    pub fn from_mesh(mesh: &Mesh) -> Option<Self> {
        let bounds = mesh.bounds();
        (!bounds.is_empty()).then_some(Self { bounds })
    }

    pub fn bounds(&self) -> &PointCloudBounds {
        &self.bounds
    }

    /// Project a position. An axis with zero extent maps to 0.5; values outside
    /// the frame (point samples beyond the mesh) are returned unclamped.
    pub fn project(&self, x: f64, y: f64) -> [f64; 2] {
        [self.bounds.normalize_x(x), self.bounds.normalize_y(y)]
    }

    pub fn project_mesh(&self, mesh: &Mesh) -> UvMap {
        mesh.vertices.iter().map(|v| self.project(v[0], v[1])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::DEGENERATE_AXIS_VALUE;

    fn mesh(vertices: Vec<[f64; 3]>) -> Mesh {
        Mesh {
            vertices,
            triangles: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn uvs_span_unit_square() {
        let m = mesh(vec![
            [10.0, 20.0, 0.0],
            [30.0, 20.0, 1.0],
            [10.0, 60.0, 2.0],
            [25.0, 35.0, 3.0],
        ]);
        let projector = UvProjector::from_mesh(&m).unwrap();
        let uvs = projector.project_mesh(&m);
        assert_eq!(uvs[0], [0.0, 0.0]);
        assert_eq!(uvs[1], [1.0, 0.0]);
        assert_eq!(uvs[2], [0.0, 1.0]);
        assert_eq!(uvs[3], [0.75, 0.375]);
        assert!(uvs
            .iter()
            .flatten()
            .all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn zero_extent_axis_maps_to_midpoint() {
        let m = mesh(vec![[5.0, 0.0, 0.0], [5.0, 2.0, 0.0], [5.0, 4.0, 0.0]]);
        let uvs = UvProjector::from_mesh(&m).unwrap().project_mesh(&m);
        for uv in &uvs {
            assert_eq!(uv[0], DEGENERATE_AXIS_VALUE);
            assert!(!uv[1].is_nan());
        }
        assert_eq!(uvs[2][1], 1.0);
    }

    #[test]
    fn empty_mesh_has_no_frame() {
        assert!(UvProjector::from_mesh(&Mesh::default()).is_none());
    }
}
