/// Binary little-endian PLY for tile point sets and tile meshes, via ply_rs
use crate::error::{PipelineError, Result};
use crate::mesh::Mesh;
use crate::point::{PointRecord, Rgb8};
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Header, Ply, Property, PropertyDef,
    PropertyType, ScalarType,
};
use ply_rs::writer::Writer;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const VERTEX: &str = "vertex";
const FACE: &str = "face";
const VERTEX_INDICES: &str = "vertex_indices";
const POSITION: [&str; 3] = ["x", "y", "z"];
const COLOUR: [&str; 3] = ["red", "green", "blue"];

fn vertex_def(count: usize, with_colour: bool) -> ElementDef {
    let mut def = ElementDef::new(VERTEX.to_string());
    def.count = count;
    for name in POSITION {
        def.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    if with_colour {
        for name in COLOUR {
            def.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        }
    }
    def
}

fn face_def(count: usize) -> ElementDef {
    let mut def = ElementDef::new(FACE.to_string());
    def.count = count;
    def.properties.add(PropertyDef::new(
        VERTEX_INDICES.to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::UInt),
    ));
    def
}

fn binary_header(elements: Vec<ElementDef>) -> Header {
    let mut header = Ply::<DefaultElement>::new().header;
    header.encoding = Encoding::BinaryLittleEndian;
    header.comments.push("point-cloud-tiling".to_string());
    for element in elements {
        header.elements.add(element);
    }
    header
}

/// Element definition `name`, which must declare every property in `required`.
fn element_def<'a>(
    header: &'a Header,
    name: &str,
    required: &[&str],
    path: &Path,
) -> Result<&'a ElementDef> {
    let def = header
        .elements
        .get(name)
        .ok_or_else(|| PipelineError::malformed(path, format!("missing `{}` element", name)))?;
    if let Some(missing) = required.iter().find(|p| def.properties.get(**p).is_none()) {
        return Err(PipelineError::malformed(
            path,
            format!("`{}` element has no `{}` property", name, missing),
        ));
    }
    Ok(def)
}

fn double(element: &DefaultElement, key: &str, path: &Path) -> Result<f64> {
    match element.get(key) {
        Some(Property::Double(v)) => Ok(*v),
        _ => Err(PipelineError::malformed(path, format!("`{}` is not a double", key))),
    }
}

fn uchar(element: &DefaultElement, key: &str, path: &Path) -> Result<u8> {
    match element.get(key) {
        Some(Property::UChar(v)) => Ok(*v),
        _ => Err(PipelineError::malformed(path, format!("`{}` is not a uchar", key))),
    }
}

fn position_element(position: &[f64; 3]) -> DefaultElement {
    let mut element = DefaultElement::new();
    for (name, value) in POSITION.iter().zip(position) {
        element.insert(name.to_string(), Property::Double(*value));
    }
    element
}

fn point_element(point: &PointRecord) -> DefaultElement {
    let mut element = position_element(&point.position);
    for (name, value) in COLOUR.iter().zip(point.colour.0) {
        element.insert(name.to_string(), Property::UChar(value));
    }
    element
}

fn position_of(element: &DefaultElement, path: &Path) -> Result<[f64; 3]> {
    Ok([
        double(element, "x", path)?,
        double(element, "y", path)?,
        double(element, "z", path)?,
    ])
}

fn point_of(element: &DefaultElement, path: &Path) -> Result<PointRecord> {
    Ok(PointRecord {
        position: position_of(element, path)?,
        colour: Rgb8([
            uchar(element, "red", path)?,
            uchar(element, "green", path)?,
            uchar(element, "blue", path)?,
        ]),
    })
}

/// Streaming point-set writer. The point count is fixed up front because
/// PLY records it in the header; records are then written batch by batch.
pub struct PointSetWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    ply: Writer<DefaultElement>,
    header: Header,
    expected: usize,
    written: usize,
}

impl PointSetWriter {
    pub fn create(path: &Path, point_count: usize) -> Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        let ply = Writer::<DefaultElement>::new();
        let header = binary_header(vec![vertex_def(point_count, true)]);
        ply.write_header(&mut writer, &header)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            ply,
            header,
            expected: point_count,
            written: 0,
        })
    }

    pub fn write(&mut self, points: &[PointRecord]) -> Result<()> {
        let def = element_def(&self.header, VERTEX, &[], &self.path)?;
        let elements: Vec<DefaultElement> = points.iter().map(point_element).collect();
        self.ply
            .write_payload_of_element(&mut self.writer, &elements, def, &self.header)?;
        self.written += points.len();
        Ok(())
    }

    /// Append every record of another point-set file. Only that file's
    /// points are held in memory.
    pub fn append_file(&mut self, path: &Path) -> Result<usize> {
        let points = read_points(path)?;
        self.write(&points)?;
        Ok(points.len())
    }

    /// Flush and check that the header count was honoured.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        if self.written != self.expected {
            return Err(PipelineError::malformed(
                &self.path,
                format!("header says {} points, wrote {}", self.expected, self.written),
            ));
        }
        Ok(())
    }
}

fn open(path: &Path) -> Result<(BufReader<File>, Parser<DefaultElement>, Header)> {
    let mut reader = BufReader::new(File::open(path)?);
    let parser = Parser::<DefaultElement>::new();
    let header = parser.read_header(&mut reader)?;
    Ok((reader, parser, header))
}

fn read_element(
    reader: &mut impl BufRead,
    parser: &Parser<DefaultElement>,
    header: &Header,
    def: &ElementDef,
) -> Result<Vec<DefaultElement>> {
    Ok(parser.read_payload_for_element(reader, def, header)?)
}

pub fn write_points(path: &Path, points: &[PointRecord]) -> Result<()> {
    let mut writer = PointSetWriter::create(path, points.len())?;
    writer.write(points)?;
    writer.finish()
}

pub fn read_points(path: &Path) -> Result<Vec<PointRecord>> {
    let (mut reader, parser, header) = open(path)?;
    let mut required = POSITION.to_vec();
    required.extend(COLOUR);
    let def = element_def(&header, VERTEX, &required, path)?;
    read_element(&mut reader, &parser, &header, def)?
        .iter()
        .map(|element| point_of(element, path))
        .collect()
}

/// Write a triangle mesh: double x/y/z vertices and uint index triples.
pub fn write_mesh(path: &Path, mesh: &Mesh) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let ply = Writer::<DefaultElement>::new();
    let header = binary_header(vec![
        vertex_def(mesh.vertices.len(), false),
        face_def(mesh.triangles.len()),
    ]);
    ply.write_header(&mut w, &header)?;

    let vertices: Vec<DefaultElement> = mesh.vertices.iter().map(position_element).collect();
    let def = element_def(&header, VERTEX, &[], path)?;
    ply.write_payload_of_element(&mut w, &vertices, def, &header)?;

    let faces: Vec<DefaultElement> = mesh
        .triangles
        .iter()
        .map(|triangle| {
            let mut face = DefaultElement::new();
            face.insert(VERTEX_INDICES.to_string(), Property::ListUInt(triangle.to_vec()));
            face
        })
        .collect();
    let def = element_def(&header, FACE, &[], path)?;
    ply.write_payload_of_element(&mut w, &faces, def, &header)?;

    w.flush()?;
    Ok(())
}

pub fn read_mesh(path: &Path) -> Result<Mesh> {
    let (mut reader, parser, header) = open(path)?;
    let vertex = element_def(&header, VERTEX, &POSITION, path)?;
    let face = element_def(&header, FACE, &[VERTEX_INDICES], path)?;

    let vertices = read_element(&mut reader, &parser, &header, vertex)?
        .iter()
        .map(|element| position_of(element, path))
        .collect::<Result<Vec<_>>>()?;

    let mut triangles = Vec::with_capacity(face.count);
    for element in read_element(&mut reader, &parser, &header, face)? {
        let Some(Property::ListUInt(indices)) = element.get(VERTEX_INDICES) else {
            return Err(PipelineError::malformed(path, "face indices are not uint"));
        };
        let &[a, b, c] = indices.as_slice() else {
            return Err(PipelineError::malformed(path, "non-triangle face"));
        };
        if [a, b, c].iter().any(|&i| i as usize >= vertices.len()) {
            return Err(PipelineError::malformed(path, "face index out of range"));
        }
        triangles.push([a, b, c]);
    }

    Ok(Mesh {
        vertices,
        triangles,
    })
}
