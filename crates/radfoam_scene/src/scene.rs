//! RadFoamScene - vertices and adjacency of a trained radiance foam.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use glam::Vec3;
use point_bvh::PointSet;

use crate::error::SceneError;
use crate::ply::{write_row, PlyElement, PlyFormat, PlyHeader, PlyProperty, PlyReader, ScalarType};

/// Spherical-harmonic color coefficients per vertex (degree 3, RGB).
pub const SH_COEFFS: usize = 45;

const VERTEX: &str = "vertex";
const ADJACENCY: &str = "adjacency";

/// Rows reserved up front; header counts are untrusted until the rows arrive.
const MAX_RESERVED_ROWS: usize = 1 << 20;

/// One cell site of the foam, laid out for upload to a storage buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadFoamVertex {
  pub position: Vec3,
  pub density: f32,
  /// RGB; the fourth byte is unused and always 0.
  pub color: [u8; 4],
  /// End offset of this vertex's neighbors in the adjacency list.
  pub adjacency_offset: u32,
  pub sh_coeffs: [f32; SH_COEFFS],
}

impl Default for RadFoamVertex {
  fn default() -> Self {
    Self {
      position: Vec3::ZERO,
      density: 0.0,
      color: [0; 4],
      adjacency_offset: 0,
      sh_coeffs: [0.0; SH_COEFFS],
    }
  }
}

/// Column of each vertex property within a row.
struct VertexColumns {
  position: [usize; 3],
  color: [usize; 3],
  density: usize,
  adjacency_offset: usize,
  sh: [Option<usize>; SH_COEFFS],
}

impl VertexColumns {
  fn resolve(element: &PlyElement) -> Result<Self, SceneError> {
    let require = |name: &str| {
      element
        .property_index(name)
        .ok_or_else(|| SceneError::MissingProperty {
          element: element.name.clone(),
          property: name.to_string(),
        })
    };

    let mut sh = [None; SH_COEFFS];
    for (i, column) in sh.iter_mut().enumerate() {
      *column = element.property_index(&format!("color_sh_{i}"));
    }

    Ok(Self {
      position: [require("x")?, require("y")?, require("z")?],
      color: [require("red")?, require("green")?, require("blue")?],
      density: require("density")?,
      adjacency_offset: require("adjacency_offset")?,
      sh,
    })
  }

  fn vertex(&self, row: &[f64], index: usize) -> Result<RadFoamVertex, SceneError> {
    let color = |column: usize, name: &str| {
      whole_number(row[column], u8::MAX.into())
        .map(|c| c as u8)
        .ok_or_else(|| out_of_range(VERTEX, index, name, row[column]))
    };

    let mut vertex = RadFoamVertex {
      position: Vec3::new(
        row[self.position[0]] as f32,
        row[self.position[1]] as f32,
        row[self.position[2]] as f32,
      ),
      density: row[self.density] as f32,
      color: [
        color(self.color[0], "red")?,
        color(self.color[1], "green")?,
        color(self.color[2], "blue")?,
        0,
      ],
      adjacency_offset: whole_number(row[self.adjacency_offset], u32::MAX).ok_or_else(|| {
        out_of_range(VERTEX, index, "adjacency_offset", row[self.adjacency_offset])
      })?,
      ..Default::default()
    };
    for (coeff, column) in vertex.sh_coeffs.iter_mut().zip(&self.sh) {
      if let Some(column) = column {
        *coeff = row[*column] as f32;
      }
    }
    Ok(vertex)
  }
}

/// `value` as an integer in `0..=max`, if it is one.
fn whole_number(value: f64, max: u32) -> Option<u32> {
  (value.fract() == 0.0 && (0.0..=f64::from(max)).contains(&value)).then_some(value as u32)
}

fn out_of_range(element: &str, row: usize, property: &str, value: f64) -> SceneError {
  SceneError::BadRow {
    element: element.to_string(),
    row,
    reason: format!("`{property}` value {value} is out of range"),
  }
}

/// A loaded radiance-foam scene.
///
/// Vertex `i`'s neighbors are `adjacency[start..end]`, where `end` is its
/// `adjacency_offset` and `start` is the previous vertex's offset (0 for the
/// first vertex). Offsets are validated on load.
#[derive(Clone, Debug)]
pub struct RadFoamScene {
  vertices: Vec<RadFoamVertex>,
  adjacency: Vec<u32>,
  points: PointSet,
}

impl RadFoamScene {
  /// Assemble a scene from parts, validating the adjacency offsets.
  pub fn new(vertices: Vec<RadFoamVertex>, adjacency: Vec<u32>) -> Result<Self, SceneError> {
    validate_adjacency(&vertices, &adjacency)?;
    let points = vertices.iter().map(|v| v.position).collect();
    Ok(Self {
      vertices,
      adjacency,
      points,
    })
  }

  /// Load a scene from a PLY file.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "radfoam_scene::load"))]
  pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
    let path = path.as_ref();
    #[cfg(feature = "tracing")]
    tracing::info!(path = %path.display(), "loading scene");

    let file = File::open(path)?;
    Self::from_reader(BufReader::new(file))
  }

  /// Parse a scene from any buffered PLY source.
  pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SceneError> {
    let mut reader = PlyReader::new(reader)?;
    let elements = reader.header().elements.clone();

    if !elements.iter().any(|e| e.name == VERTEX) {
      return Err(SceneError::MissingElement(VERTEX));
    }
    if !elements.iter().any(|e| e.name == ADJACENCY) {
      return Err(SceneError::MissingElement(ADJACENCY));
    }

    let mut vertices = Vec::new();
    let mut adjacency = Vec::new();
    let mut row = Vec::new();

    // Body elements come in header order
    for element in &elements {
      match element.name.as_str() {
        VERTEX => {
          let columns = VertexColumns::resolve(element)?;
          vertices.reserve(element.count.min(MAX_RESERVED_ROWS));
          for index in 0..element.count {
            reader.read_row(element, index, &mut row)?;
            vertices.push(columns.vertex(&row, index)?);
          }
        }
        ADJACENCY => {
          let column =
            element
              .property_index(ADJACENCY)
              .ok_or_else(|| SceneError::MissingProperty {
                element: element.name.clone(),
                property: ADJACENCY.to_string(),
              })?;
          adjacency.reserve(element.count.min(MAX_RESERVED_ROWS));
          for index in 0..element.count {
            reader.read_row(element, index, &mut row)?;
            let neighbor = whole_number(row[column], u32::MAX)
              .ok_or_else(|| out_of_range(ADJACENCY, index, ADJACENCY, row[column]))?;
            adjacency.push(neighbor);
          }
        }
        _ => reader.skip_element(element)?,
      }
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
      vertices = vertices.len(),
      adjacency = adjacency.len(),
      "scene loaded"
    );

    Self::new(vertices, adjacency)
  }

  /// Number of vertices (points).
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  pub fn vertices(&self) -> &[RadFoamVertex] {
    &self.vertices
  }

  /// Flat neighbor list, indexed through the per-vertex end offsets.
  pub fn adjacency(&self) -> &[u32] {
    &self.adjacency
  }

  /// Vertex positions in vertex order, ready for tree construction.
  pub fn points(&self) -> &PointSet {
    &self.points
  }

  /// Neighbors of vertex `index`.
  pub fn neighbors(&self, index: usize) -> Option<&[u32]> {
    let end = self.vertices.get(index)?.adjacency_offset as usize;
    let start = match index {
      0 => 0,
      _ => self.vertices[index - 1].adjacency_offset as usize,
    };
    self.adjacency.get(start..end)
  }

  /// Size of the vertex and adjacency buffers in bytes.
  pub fn buffer_bytes(&self) -> usize {
    std::mem::size_of_val(self.vertices.as_slice()) + std::mem::size_of_val(self.adjacency.as_slice())
  }

  /// Write the scene as PLY in `format`.
  pub fn write_ply<W: Write>(&self, writer: W, format: PlyFormat) -> Result<(), SceneError> {
    let mut writer = BufWriter::new(writer);
    let header = PlyHeader {
      format,
      elements: vec![vertex_element(self.vertices.len()), adjacency_element(self.adjacency.len())],
    };
    header.write(&mut writer)?;

    let mut bytes = Vec::new();
    let mut values = Vec::with_capacity(header.elements[0].properties.len());
    for vertex in &self.vertices {
      values.clear();
      values.extend(vertex.position.to_array().map(f64::from));
      values.extend(vertex.color[..3].iter().map(|c| f64::from(*c)));
      values.push(f64::from(vertex.density));
      values.push(f64::from(vertex.adjacency_offset));
      values.extend(vertex.sh_coeffs.iter().map(|c| f64::from(*c)));

      bytes.clear();
      write_row(format, &header.elements[0], &values, &mut bytes);
      writer.write_all(&bytes)?;
    }

    for neighbor in &self.adjacency {
      bytes.clear();
      write_row(format, &header.elements[1], &[f64::from(*neighbor)], &mut bytes);
      writer.write_all(&bytes)?;
    }

    writer.flush()?;
    Ok(())
  }

  /// Write the scene to a PLY file.
  pub fn save(&self, path: impl AsRef<Path>, format: PlyFormat) -> Result<(), SceneError> {
    self.write_ply(File::create(path)?, format)
  }
}

fn vertex_element(count: usize) -> PlyElement {
  let mut properties = vec![
    PlyProperty::new("x", ScalarType::Float32),
    PlyProperty::new("y", ScalarType::Float32),
    PlyProperty::new("z", ScalarType::Float32),
    PlyProperty::new("red", ScalarType::UInt8),
    PlyProperty::new("green", ScalarType::UInt8),
    PlyProperty::new("blue", ScalarType::UInt8),
    PlyProperty::new("density", ScalarType::Float32),
    PlyProperty::new("adjacency_offset", ScalarType::UInt32),
  ];
  properties.extend((0..SH_COEFFS).map(|i| PlyProperty::new(format!("color_sh_{i}"), ScalarType::Float32)));
  PlyElement {
    name: VERTEX.to_string(),
    count,
    properties,
  }
}

fn adjacency_element(count: usize) -> PlyElement {
  PlyElement {
    name: ADJACENCY.to_string(),
    count,
    properties: vec![PlyProperty::new(ADJACENCY, ScalarType::UInt32)],
  }
}

fn validate_adjacency(vertices: &[RadFoamVertex], adjacency: &[u32]) -> Result<(), SceneError> {
  let mut previous = 0u32;
  for (vertex, v) in vertices.iter().enumerate() {
    let offset = v.adjacency_offset;
    if offset < previous || offset as usize > adjacency.len() {
      return Err(SceneError::BadAdjacencyOffset {
        vertex,
        offset,
        previous,
        len: adjacency.len(),
      });
    }
    previous = offset;
  }

  let vertex_count = vertices.len();
  if let Some(entry) = adjacency.iter().position(|&n| n as usize >= vertex_count) {
    return Err(SceneError::BadNeighbor {
      entry,
      neighbor: adjacency[entry],
      vertex_count,
    });
  }
  Ok(())
}

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;
