/// Output area of one run: a stage directory per pipeline step
use crate::constants::{MESHING_DIR, REPORT_FILE, SPILL_DIR, TEXTURING_DIR, TILING_DIR};
use crate::error::Result;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub tiling: PathBuf,
    pub spill: PathBuf,
    pub meshing: PathBuf,
    pub texturing: PathBuf,
    pub report: PathBuf,
}

impl OutputLayout {
    /// Paths under `root`, without touching the filesystem.
    pub fn new(root: &Path) -> Self {
        let tiling = root.join(TILING_DIR);
        Self {
            root: root.to_path_buf(),
            spill: tiling.join(SPILL_DIR),
            tiling,
            meshing: root.join(MESHING_DIR),
            texturing: root.join(TEXTURING_DIR),
            report: root.join(REPORT_FILE),
        }
    }

    /// Recreate every stage directory empty. Called once, at the start of a run;
    /// files in `root` that belong to no stage are left alone.
    pub fn prepare(root: &Path) -> Result<Self> {
        let layout = Self::new(root);
        for dir in [&layout.tiling, &layout.meshing, &layout.texturing] {
            if dir.exists() {
                debug!("Clearing {}", dir.display());
                fs::remove_dir_all(dir)?;
            }
            fs::create_dir_all(dir)?;
        }
        if layout.report.exists() {
            fs::remove_file(&layout.report)?;
        }
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_resets_stage_directories_only() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join(TILING_DIR).join("tile_9_9.ply");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();
        let unrelated = tmp.path().join("notes.txt");
        fs::write(&unrelated, b"keep").unwrap();

        let layout = OutputLayout::prepare(tmp.path()).unwrap();
        assert!(!stale.exists());
        assert!(unrelated.exists());
        assert!(layout.tiling.is_dir());
        assert!(layout.meshing.is_dir());
        assert!(layout.texturing.is_dir());
        assert!(layout.spill.starts_with(&layout.tiling));
    }
}
