/// Mip dilation: fills unpainted (all-zero) texels from a max-reduced image pyramid
use image::{Rgb, RgbImage};

/// A texel with every channel at zero has not been painted.
pub fn is_unpainted(pixel: &Rgb<u8>) -> bool {
    pixel.0 == [0, 0, 0]
}

pub fn count_unpainted(image: &RgbImage) -> usize {
    image.pixels().filter(|p| is_unpainted(p)).count()
}

/// Successively halved copies of an image, level 0 being the original.
#[derive(Debug, Clone)]
pub struct MipPyramid {
    levels: Vec<RgbImage>,
}

impl MipPyramid {
    /// Halve with a per-channel 2x2 maximum until the image is 1x1. An odd
    /// trailing row or column is dropped before each halving.
    pub fn build(image: &RgbImage) -> Self {
        let mut levels = vec![image.clone()];
        while let Some(current) = levels.last() {
            let (w, h) = current.dimensions();
            if (w <= 1 && h <= 1) || w == 0 || h == 0 {
                break;
            }
            let reduced = reduce_max(current);
            levels.push(reduced);
        }
        Self { levels }
    }

    pub fn levels(&self) -> &[RgbImage] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// One pyramid step. A dimension already at 1 is kept rather than halved.
fn reduce_max(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let (nw, step_x) = if w > 1 { (w / 2, 2) } else { (1, 1) };
    let (nh, step_y) = if h > 1 { (h / 2, 2) } else { (1, 1) };
    RgbImage::from_fn(nw, nh, |x, y| {
        let mut out = [0u8; 3];
        for dy in 0..step_y {
            for dx in 0..step_x {
                let p = image.get_pixel(x * step_x + dx, y * step_y + dy);
                for c in 0..3 {
                    out[c] = out[c].max(p.0[c]);
                }
            }
        }
        Rgb(out)
    })
}

/// Nearest-neighbour resample to `width` x `height`, sampling texel centres.
pub fn upscale_nearest(level: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (lw, lh) = level.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let sx = ((2 * x as u64 + 1) * lw as u64 / (2 * width as u64)) as u32;
        let sy = ((2 * y as u64 + 1) * lh as u64 / (2 * height as u64)) as u32;
        *level.get_pixel(sx.min(lw - 1), sy.min(lh - 1))
    })
}

/// Fill every unpainted texel of `image` from the pyramid.
///
/// Levels are visited from the finest reduction (level 1) toward the 1x1
/// top, so a hole takes its colour from the nearest resolution that has any
/// painted texel beneath it. Stops once nothing is left unpainted. An
/// all-zero input stays all zero.
///
/// Odd truncation can hide a painted texel in the last row or column from
/// every coarser level; holes left after the 1x1 level take the channel
/// maximum of the whole image, the value that level would hold otherwise.
pub fn dilate(image: RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || count_unpainted(&image) == 0 {
        return image;
    }

    let pyramid = MipPyramid::build(&image);
    let mut working = image;
    for level in pyramid.levels().iter().skip(1) {
        let upscaled = upscale_nearest(level, width, height);
        for (pixel, fill) in working.pixels_mut().zip(upscaled.pixels()) {
            if is_unpainted(pixel) {
                *pixel = *fill;
            }
        }
        if count_unpainted(&working) == 0 {
            return working;
        }
    }

    let top = channel_max(&working);
    for pixel in working.pixels_mut() {
        if is_unpainted(pixel) {
            *pixel = top;
        }
    }
    working
}

fn channel_max(image: &RgbImage) -> Rgb<u8> {
    image.pixels().fold(Rgb([0, 0, 0]), |acc, p| {
        Rgb([acc.0[0].max(p.0[0]), acc.0[1].max(p.0[1]), acc.0[2].max(p.0[2])])
    })
}
