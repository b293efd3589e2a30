//! Out-of-core point cloud tiling, per-tile surface reconstruction under a
//! global polycount budget, and per-tile texture baking.
pub mod bake;
pub mod bounds;
pub mod config;
pub mod constants;
pub mod decimate;
pub mod dilate;
pub mod error;
pub mod grid;
pub mod layout;
pub mod manifest;
pub mod merge;
pub mod mesh;
pub mod obj;
pub mod paint;
pub mod pipeline;
pub mod ply;
pub mod point;
pub mod polycount;
mod progress;
pub mod reconstruct;
pub mod source;
pub mod spill;
pub mod tiler;
pub mod uv;

pub use bounds::PointCloudBounds;
pub use config::PipelineConfig;
pub use decimate::{MeshDecimator, VertexClusterDecimator};
pub use error::{PipelineError, Result};
pub use grid::{TileKey, tile_key};
pub use manifest::RunReport;
pub use mesh::{Mesh, Reconstruction};
pub use paint::PaintMode;
pub use pipeline::Pipeline;
pub use point::{PointRecord, Rgb8};
pub use reconstruct::{HeightfieldReconstructor, SurfaceReconstructor};
pub use source::{LasSource, MemorySource, PointSource};
pub use tiler::{SpatialTiler, TilingSummary};
