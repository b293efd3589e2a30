/// Shared defaults for point cloud tiling, meshing and texturing

/// Tile edge length in metres
pub const DEFAULT_TILE_SIZE: f64 = 100.0;

/// Points held in memory per streaming chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000_000;

/// Upper bound on the summed triangle count of every tile mesh
pub const DEFAULT_MAX_TOTAL_POLYCOUNT: u64 = 1_000_000;

/// Surface reconstruction depth (detail vs compute trade-off)
pub const DEFAULT_MESHING_DEPTH: u32 = 6;

/// Texture side length in pixels
pub const DEFAULT_TEXTURE_RESOLUTION: u32 = 512;

/// Vertices at or below this confidence percentile are trimmed after reconstruction
pub const DEFAULT_CONFIDENCE_TRIM_PERCENTILE: f64 = 5.0;

/// Colour assigned to every point when the source has no colour channels
pub const SENTINEL_COLOUR: [u8; 3] = [1, 0, 0];

/// Right shift narrowing a 16-bit colour channel to 8 bits.
/// Lossy: the low byte is discarded and cannot be recovered.
pub const COLOUR_NARROWING_SHIFT: u32 = 8;

/// Sub-directory names of a run's output root
pub const TILING_DIR: &str = "step1_tiling";
pub const MESHING_DIR: &str = "step2_meshing";
pub const TEXTURING_DIR: &str = "step3_texturing";
pub const SPILL_DIR: &str = "tmp";
pub const REPORT_FILE: &str = "report.json";
