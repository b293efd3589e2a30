/// Wavefront OBJ + MTL writer for textured tile meshes
use crate::error::Result;
use crate::mesh::Mesh;
use crate::uv::UvMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Material name bound to every face of a tile.
pub const MATERIAL_NAME: &str = "tile_texture";

/// Write `{stem}.mtl` binding one diffuse texture.
pub fn write_mtl(path: &Path, texture_file_name: &str) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "newmtl {}", MATERIAL_NAME)?;
    writeln!(w, "Ka 1.0 1.0 1.0")?;
    writeln!(w, "Kd 1.0 1.0 1.0")?;
    writeln!(w, "Ks 0.0 0.0 0.0")?;
    writeln!(w, "illum 1")?;
    writeln!(w, "map_Kd {}", texture_file_name)?;
    w.flush()?;
    Ok(())
}

/// Write a mesh with one UV per vertex. Faces reference the vertex's own UV,
/// so every triangle corner carries its projected coordinate.
pub fn write_obj(path: &Path, mesh: &Mesh, uvs: &UvMap, mtl_file_name: &str) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "mtllib {}", mtl_file_name)?;

    for v in &mesh.vertices {
        writeln!(w, "v {} {} {}", v[0], v[1], v[2])?;
    }
    for t in uvs {
        writeln!(w, "vt {} {}", t[0], t[1])?;
    }

    writeln!(w, "usemtl {}", MATERIAL_NAME)?;
    let has_uv = uvs.len() == mesh.vertices.len() && !uvs.is_empty();
    for tri in &mesh.triangles {
        let [a, b, c] = tri.map(|i| i as usize + 1); // 1-based
        if has_uv {
            writeln!(w, "f {}/{} {}/{} {}/{}", a, a, b, b, c, c)?;
        } else {
            writeln!(w, "f {} {} {}", a, b, c)?;
        }
    }
    w.flush()?;
    Ok(())
}
