/// Texture painter: splats point colours into texels through the mesh's UV frame
use crate::point::PointRecord;
use crate::uv::UvProjector;
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// How several points landing on one texel are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintMode {
    /// The last point in input order wins. Depends on input order.
    #[default]
    LastWriter,
    /// Rounded mean of every point on the texel. Independent of input order.
    Average,
}

/// Texel column and row for a UV pair on a `resolution`-sided raster.
/// Row 0 is the top of the image, so `v = 1` lands on row 0.
pub fn texel_for_uv(uv: [f64; 2], resolution: u32) -> (u32, u32) {
    let max = (resolution - 1) as f64;
    let px = (uv[0] * max).round().clamp(0.0, max) as u32;
    let py = ((1.0 - uv[1]) * max).round().clamp(0.0, max) as u32;
    (px, py)
}

#[derive(Debug, Clone, Copy)]
pub struct TexturePainter {
    pub resolution: u32,
    pub mode: PaintMode,
}

impl TexturePainter {
    pub fn new(resolution: u32, mode: PaintMode) -> Self {
        Self { resolution, mode }
    }

    /// Blank (all-zero, i.e. unpainted) texture.
    pub fn blank(&self) -> RgbImage {
        RgbImage::new(self.resolution, self.resolution)
    }

    /// Paint `points` into a fresh texture. Texels no point reaches stay zero.
    pub fn paint(&self, projector: &UvProjector, points: &[PointRecord]) -> RgbImage {
        let mut image = self.blank();
        match self.mode {
            PaintMode::LastWriter => {
                for point in points {
                    let (px, py) =
                        texel_for_uv(projector.project(point.x(), point.y()), self.resolution);
                    image.put_pixel(px, py, Rgb(point.colour.0));
                }
            }
            PaintMode::Average => {
                let res = self.resolution as usize;
                let mut sums = vec![[0u64; 3]; res * res];
                let mut counts = vec![0u64; res * res];
                for point in points {
                    let (px, py) =
                        texel_for_uv(projector.project(point.x(), point.y()), self.resolution);
                    let idx = py as usize * res + px as usize;
                    for (sum, channel) in sums[idx].iter_mut().zip(point.colour.0) {
                        *sum += channel as u64;
                    }
                    counts[idx] += 1;
                }
                for (idx, (sum, &count)) in sums.iter().zip(&counts).enumerate() {
                    if count == 0 {
                        continue;
                    }
                    let mean = sum.map(|s| ((s + count / 2) / count) as u8);
                    image.put_pixel((idx % res) as u32, (idx / res) as u32, Rgb(mean));
                }
            }
        }
        image
    }
}
