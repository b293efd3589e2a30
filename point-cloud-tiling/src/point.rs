/// Point records as carried through tiling and texturing
use crate::constants::{COLOUR_NARROWING_SHIFT, SENTINEL_COLOUR};

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb8(pub [u8; 3]);

impl Rgb8 {
    pub const SENTINEL: Rgb8 = Rgb8(SENTINEL_COLOUR);

    /// Narrow 16-bit channels to 8 bits with [`narrow_channel`].
    pub fn from_u16(red: u16, green: u16, blue: u16) -> Self {
        Rgb8([
            narrow_channel(red),
            narrow_channel(green),
            narrow_channel(blue),
        ])
    }

    /// All-zero colour, which the texture stages read as "unpainted".
    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0]
    }
}

/// Narrow a 16-bit colour channel to 8 bits by keeping the high byte.
///
/// This is lossy and one-directional: `v >> 8` discards the low byte, so
/// 256 distinct inputs map to each output and the original cannot be restored.
pub fn narrow_channel(value: u16) -> u8 {
    (value >> COLOUR_NARROWING_SHIFT) as u8
}

/// One geo-referenced point. Immutable once read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    pub position: [f64; 3],
    pub colour: Rgb8,
}

impl PointRecord {
    pub fn new(x: f64, y: f64, z: f64, colour: Rgb8) -> Self {
        Self {
            position: [x, y, z],
            colour,
        }
    }

    pub fn x(&self) -> f64 {
        self.position[0]
    }

    pub fn y(&self) -> f64 {
        self.position[1]
    }

    pub fn z(&self) -> f64 {
        self.position[2]
    }
}
