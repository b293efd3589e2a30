/// Texture baker: UV projection, painting and dilation for one tile,
/// persisted as a paired mesh + texture artifact
use crate::dilate::{count_unpainted, dilate};
use crate::error::Result;
use crate::grid::TileKey;
use crate::mesh::Mesh;
use crate::obj::{write_mtl, write_obj};
use crate::paint::{PaintMode, TexturePainter};
use crate::point::PointRecord;
use crate::uv::{UvMap, UvProjector};
use image::RgbImage;
use log::debug;
use std::path::{Path, PathBuf};

/// Files of one textured tile, all sharing the tile's base name.
#[derive(Debug, Clone, PartialEq)]
pub struct TexturedTile {
    pub key: TileKey,
    pub mesh_path: PathBuf,
    pub material_path: PathBuf,
    pub texture_path: PathBuf,
}

/// In-memory bake result before it is written.
#[derive(Debug, Clone)]
pub struct BakedTexture {
    pub uvs: UvMap,
    pub texture: RgbImage,
    /// Texels no point reached before dilation.
    pub unpainted_before_dilation: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureBaker {
    painter: TexturePainter,
}

impl TextureBaker {
    pub fn new(resolution: u32, mode: PaintMode) -> Self {
        Self {
            painter: TexturePainter::new(resolution, mode),
        }
    }

    /// Project, paint and dilate. The mesh is only read. A mesh without
    /// vertices bakes to an empty UV map and a blank texture.
    pub fn bake(&self, mesh: &Mesh, points: &[PointRecord]) -> BakedTexture {
        let Some(projector) = UvProjector::from_mesh(mesh) else {
            let texture = self.painter.blank();
            let unpainted = count_unpainted(&texture);
            return BakedTexture {
                uvs: Vec::new(),
                texture,
                unpainted_before_dilation: unpainted,
            };
        };

        let uvs = projector.project_mesh(mesh);
        let painted = self.painter.paint(&projector, points);
        let unpainted_before_dilation = count_unpainted(&painted);
        let texture = dilate(painted);

        BakedTexture {
            uvs,
            texture,
            unpainted_before_dilation,
        }
    }

    /// Bake and write `{base}.obj`, `{base}.mtl` and `{base}.png` into `output_dir`.
    pub fn bake_to_dir(
        &self,
        key: TileKey,
        mesh: &Mesh,
        points: &[PointRecord],
        output_dir: &Path,
    ) -> Result<TexturedTile> {
        let baked = self.bake(mesh, points);
        debug!(
            "Tile {}: {} of {} texels filled by dilation",
            key,
            baked.unpainted_before_dilation,
            baked.texture.width() * baked.texture.height()
        );

        let base = key.base_name();
        let texture_name = format!("{}.png", base);
        let material_name = format!("{}.mtl", base);
        let texture_path = output_dir.join(&texture_name);
        let material_path = output_dir.join(&material_name);
        let mesh_path = output_dir.join(format!("{}.obj", base));

        baked.texture.save(&texture_path)?;
        write_mtl(&material_path, &texture_name)?;
        write_obj(&mesh_path, mesh, &baked.uvs, &material_name)?;

        Ok(TexturedTile {
            key,
            mesh_path,
            material_path,
            texture_path,
        })
    }
}
