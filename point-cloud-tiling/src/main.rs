/// Point cloud tiling, meshing and texturing entry point
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use point_cloud_tiling::{
    HeightfieldReconstructor, PaintMode, Pipeline, PipelineConfig, VertexClusterDecimator,
};
use std::path::PathBuf;

/// How overlapping points combine in a texel.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum PaintArg {
    /// Later points overwrite earlier ones.
    LastWriter,
    /// Texel takes the mean colour of its points.
    Average,
}

impl From<PaintArg> for PaintMode {
    fn from(arg: PaintArg) -> Self {
        match arg {
            PaintArg::LastWriter => PaintMode::LastWriter,
            PaintArg::Average => PaintMode::Average,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "point-cloud-tiling", version)]
struct Args {
    /// Input LAS/LAZ point cloud.
    input: PathBuf,

    #[arg(long, default_value = "./output")]
    output_dir: PathBuf,

    /// JSON configuration file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tile edge length in metres.
    #[arg(long)]
    tile_size: Option<f64>,

    /// Points read per streaming chunk.
    #[arg(long, alias = "points-buffer-size")]
    chunk_size: Option<usize>,

    #[arg(long)]
    max_total_polycount: Option<u64>,

    #[arg(long)]
    meshing_depth: Option<u32>,

    /// Texture side length in pixels.
    #[arg(long)]
    texture_resolution: Option<u32>,

    #[arg(long)]
    confidence_trim_percentile: Option<f64>,

    #[arg(long, value_enum)]
    paint_mode: Option<PaintArg>,

    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

impl Args {
    fn into_config(self) -> Result<(PathBuf, PathBuf, PipelineConfig)> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(v) = self.tile_size {
            config.tile_size = v;
        }
        if let Some(v) = self.chunk_size {
            config.chunk_size = v;
        }
        if let Some(v) = self.max_total_polycount {
            config.max_total_polycount = v;
        }
        if let Some(v) = self.meshing_depth {
            config.meshing_depth = v;
        }
        if let Some(v) = self.texture_resolution {
            config.texture_resolution = v;
        }
        if let Some(v) = self.confidence_trim_percentile {
            config.confidence_trim_percentile = v;
        }
        if let Some(v) = self.paint_mode {
            config.paint_mode = v.into();
        }
        if self.no_progress {
            config.show_progress = false;
        }
        Ok((self.input, self.output_dir, config))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (input, output_dir, config) = Args::parse().into_config()?;
    config.validate().context("invalid configuration")?;

    let reconstructor = HeightfieldReconstructor;
    let decimator = VertexClusterDecimator;
    let pipeline = Pipeline::new(config, &reconstructor, &decimator);

    let report = pipeline
        .run_las(&input, &output_dir)
        .with_context(|| format!("processing {}", input.display()))?;

    info!(
        "Done: {} textured tiles written to {}",
        report.texturing.textured,
        output_dir.display()
    );
    Ok(())
}
