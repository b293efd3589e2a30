/// Pipeline configuration: defaults, optional JSON file, validation
use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CONFIDENCE_TRIM_PERCENTILE, DEFAULT_MAX_TOTAL_POLYCOUNT,
    DEFAULT_MESHING_DEPTH, DEFAULT_TEXTURE_RESOLUTION, DEFAULT_TILE_SIZE,
};
use crate::error::{PipelineError, Result};
use crate::paint::PaintMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tile edge length in metres.
    pub tile_size: f64,
    /// Points per streaming chunk.
    pub chunk_size: usize,
    /// Budget for the summed triangle count of every tile.
    pub max_total_polycount: u64,
    /// Reconstruction depth passed to the surface reconstructor.
    pub meshing_depth: u32,
    /// Texture side length in pixels.
    pub texture_resolution: u32,
    /// Confidence percentile below which reconstructed vertices are trimmed.
    pub confidence_trim_percentile: f64,
    pub paint_mode: PaintMode,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_total_polycount: DEFAULT_MAX_TOTAL_POLYCOUNT,
            meshing_depth: DEFAULT_MESHING_DEPTH,
            texture_resolution: DEFAULT_TEXTURE_RESOLUTION,
            confidence_trim_percentile: DEFAULT_CONFIDENCE_TRIM_PERCENTILE,
            paint_mode: PaintMode::default(),
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "tile_size must be a positive number of metres, got {}",
                self.tile_size
            )));
        }
        if self.chunk_size == 0 {
            return Err(PipelineError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        if self.texture_resolution == 0 {
            return Err(PipelineError::InvalidConfig(
                "texture_resolution must be at least 1".into(),
            ));
        }
        if !(0.0..100.0).contains(&self.confidence_trim_percentile) {
            return Err(PipelineError::InvalidConfig(format!(
                "confidence_trim_percentile must be in [0, 100), got {}",
                self.confidence_trim_percentile
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tile_size, 100.0);
        assert_eq!(config.chunk_size, 10_000_000);
        assert_eq!(config.texture_resolution, 512);
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "tile_size": 25.0, "paint_mode": "average" }"#).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.tile_size, 25.0);
        assert_eq!(config.paint_mode, PaintMode::Average);
        assert_eq!(config.max_total_polycount, DEFAULT_MAX_TOTAL_POLYCOUNT);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad = [
            PipelineConfig {
                tile_size: 0.0,
                ..Default::default()
            },
            PipelineConfig {
                tile_size: f64::NAN,
                ..Default::default()
            },
            PipelineConfig {
                chunk_size: 0,
                ..Default::default()
            },
            PipelineConfig {
                texture_resolution: 0,
                ..Default::default()
            },
            PipelineConfig {
                confidence_trim_percentile: 100.0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(PipelineError::InvalidConfig(_))
            ));
        }
    }
}
