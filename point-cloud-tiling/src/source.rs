/// Streaming point sources feeding the spatial tiler
use crate::bounds::PointCloudBounds;
use crate::error::{PipelineError, Result};
use crate::point::{PointRecord, Rgb8};
use las::Reader;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A point stream whose bounding box is known before streaming begins.
pub trait PointSource {
    /// Axis-aligned bounds of every point the stream will yield.
    fn bounds(&self) -> PointCloudBounds;

    /// Whether the stream carries colour channels. Holds for the whole stream.
    fn has_colour(&self) -> bool;

    /// Total point count, when the format records it up front.
    fn len_hint(&self) -> Option<u64>;

    /// Read up to `max_points` records. An empty chunk means the stream is exhausted.
    fn read_chunk(&mut self, max_points: usize) -> Result<Vec<PointRecord>>;
}

/// LAS/LAZ file source. 16-bit colour is narrowed to 8 bits on read.
pub struct LasSource {
    reader: Reader,
    bounds: PointCloudBounds,
    has_colour: bool,
    point_count: u64,
}

impl LasSource {
    /// Open a LAS or LAZ file. A missing file is an input error.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }
        let reader = create_reader(path)?;
        let header = reader.header();
        let bounds = PointCloudBounds::from_las(&header.bounds());
        let has_colour = header.point_format().has_color;
        let point_count = header.number_of_points();

        info!("LAS/LAZ file information:");
        info!("  File: {}", path.display());
        info!(
            "  Version: {}.{}",
            header.version().major,
            header.version().minor
        );
        info!("  Points: {}", point_count);
        info!("  Point format: {:?}", header.point_format().to_u8());
        info!("  Colour channels: {}", if has_colour { "yes" } else { "no" });

        Ok(Self {
            reader,
            bounds,
            has_colour,
            point_count,
        })
    }
}

impl PointSource for LasSource {
    fn bounds(&self) -> PointCloudBounds {
        self.bounds
    }

    fn has_colour(&self) -> bool {
        self.has_colour
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.point_count)
    }

    fn read_chunk(&mut self, max_points: usize) -> Result<Vec<PointRecord>> {
        let has_colour = self.has_colour;
        let mut chunk = Vec::with_capacity(max_points.min(1 << 20));
        for point_result in self.reader.points().take(max_points) {
            let point = point_result?;
            let colour = match point.color {
                Some(c) if has_colour => Rgb8::from_u16(c.red, c.green, c.blue),
                _ => Rgb8::SENTINEL,
            };
            chunk.push(PointRecord::new(point.x, point.y, point.z, colour));
        }
        Ok(chunk)
    }
}

/// Create LAS file reader for point cloud access.
/// Handles both .las and .laz compressed formats.
fn create_reader(file_path: &Path) -> Result<Reader> {
    let file = File::open(file_path)?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

/// In-memory source, used for synthetic clouds and tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    points: Vec<PointRecord>,
    cursor: usize,
    bounds: PointCloudBounds,
    has_colour: bool,
}

impl MemorySource {
    /// Bounds are computed from the points. Without colour, every record
    /// is given the sentinel colour as it is read.
    pub fn new(points: Vec<PointRecord>, has_colour: bool) -> Self {
        let bounds = PointCloudBounds::from_positions(points.iter().map(|p| &p.position));
        Self {
            points,
            cursor: 0,
            bounds,
            has_colour,
        }
    }
}

impl PointSource for MemorySource {
    fn bounds(&self) -> PointCloudBounds {
        self.bounds
    }

    fn has_colour(&self) -> bool {
        self.has_colour
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.points.len() as u64)
    }

    fn read_chunk(&mut self, max_points: usize) -> Result<Vec<PointRecord>> {
        let end = (self.cursor + max_points).min(self.points.len());
        let mut chunk = self.points[self.cursor..end].to_vec();
        self.cursor = end;
        if !self.has_colour {
            for point in &mut chunk {
                point.colour = Rgb8::SENTINEL;
            }
        }
        Ok(chunk)
    }
}
