//! Minimal PLY reader/writer for scalar-only elements.
//!
//! Handles the three standard encodings (`ascii`, `binary_little_endian`,
//! `binary_big_endian`). Every scalar is surfaced as `f64`, which holds all
//! PLY scalar types up to 32 bits exactly; callers narrow to their own
//! field types. List properties are rejected at header time.

use std::io::{BufRead, ErrorKind, Write};

use crate::error::SceneError;

/// Body encoding declared by the `format` header line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlyFormat {
  Ascii,
  BinaryLittleEndian,
  BinaryBigEndian,
}

impl PlyFormat {
  fn parse(name: &str) -> Option<Self> {
    match name {
      "ascii" => Some(Self::Ascii),
      "binary_little_endian" => Some(Self::BinaryLittleEndian),
      "binary_big_endian" => Some(Self::BinaryBigEndian),
      _ => None,
    }
  }

  /// Name used on the `format` header line.
  pub fn name(self) -> &'static str {
    match self {
      Self::Ascii => "ascii",
      Self::BinaryLittleEndian => "binary_little_endian",
      Self::BinaryBigEndian => "binary_big_endian",
    }
  }
}

/// Scalar property type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
  Int8,
  UInt8,
  Int16,
  UInt16,
  Int32,
  UInt32,
  Float32,
  Float64,
}

impl ScalarType {
  /// Parse both the classic (`uchar`, `float`) and sized (`uint8`,
  /// `float32`) spellings.
  pub fn parse(name: &str) -> Option<Self> {
    Some(match name {
      "char" | "int8" => Self::Int8,
      "uchar" | "uint8" => Self::UInt8,
      "short" | "int16" => Self::Int16,
      "ushort" | "uint16" => Self::UInt16,
      "int" | "int32" => Self::Int32,
      "uint" | "uint32" => Self::UInt32,
      "float" | "float32" => Self::Float32,
      "double" | "float64" => Self::Float64,
      _ => return None,
    })
  }

  /// Classic spelling, used when writing.
  pub fn name(self) -> &'static str {
    match self {
      Self::Int8 => "char",
      Self::UInt8 => "uchar",
      Self::Int16 => "short",
      Self::UInt16 => "ushort",
      Self::Int32 => "int",
      Self::UInt32 => "uint",
      Self::Float32 => "float",
      Self::Float64 => "double",
    }
  }

  /// Size in bytes in a binary body.
  pub fn size(self) -> usize {
    match self {
      Self::Int8 | Self::UInt8 => 1,
      Self::Int16 | Self::UInt16 => 2,
      Self::Int32 | Self::UInt32 | Self::Float32 => 4,
      Self::Float64 => 8,
    }
  }

  fn decode(self, bytes: &[u8], big_endian: bool) -> f64 {
    macro_rules! decode {
      ($ty:ty) => {{
        let raw = bytes[..std::mem::size_of::<$ty>()]
          .try_into()
          .unwrap_or_default();
        if big_endian {
          <$ty>::from_be_bytes(raw) as f64
        } else {
          <$ty>::from_le_bytes(raw) as f64
        }
      }};
    }
    match self {
      Self::Int8 => decode!(i8),
      Self::UInt8 => decode!(u8),
      Self::Int16 => decode!(i16),
      Self::UInt16 => decode!(u16),
      Self::Int32 => decode!(i32),
      Self::UInt32 => decode!(u32),
      Self::Float32 => decode!(f32),
      Self::Float64 => decode!(f64),
    }
  }

  fn encode(self, value: f64, big_endian: bool, out: &mut Vec<u8>) {
    macro_rules! encode {
      ($ty:ty) => {{
        let value = value as $ty;
        if big_endian {
          out.extend_from_slice(&value.to_be_bytes());
        } else {
          out.extend_from_slice(&value.to_le_bytes());
        }
      }};
    }
    match self {
      Self::Int8 => encode!(i8),
      Self::UInt8 => encode!(u8),
      Self::Int16 => encode!(i16),
      Self::UInt16 => encode!(u16),
      Self::Int32 => encode!(i32),
      Self::UInt32 => encode!(u32),
      Self::Float32 => encode!(f32),
      Self::Float64 => encode!(f64),
    }
  }
}

/// One scalar property of an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlyProperty {
  pub name: String,
  pub ty: ScalarType,
}

impl PlyProperty {
  pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
    Self {
      name: name.into(),
      ty,
    }
  }
}

/// An element declaration: name, row count and per-row properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlyElement {
  pub name: String,
  pub count: usize,
  pub properties: Vec<PlyProperty>,
}

impl PlyElement {
  /// Position of property `name` within a row.
  pub fn property_index(&self, name: &str) -> Option<usize> {
    self.properties.iter().position(|p| p.name == name)
  }

  /// Bytes per row in a binary body.
  pub fn row_size(&self) -> usize {
    self.properties.iter().map(|p| p.ty.size()).sum()
  }
}

/// Parsed PLY header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlyHeader {
  pub format: PlyFormat,
  pub elements: Vec<PlyElement>,
}

impl PlyHeader {
  /// Read header lines up to and including `end_header`.
  pub fn parse<R: BufRead>(reader: &mut R) -> Result<Self, SceneError> {
    let mut line = String::new();
    let mut line_no = 0usize;
    let mut format = None;
    let mut elements: Vec<PlyElement> = Vec::new();

    let invalid = |line: usize, reason: &str| SceneError::InvalidHeader {
      line,
      reason: reason.to_string(),
    };

    loop {
      line.clear();
      if reader.read_line(&mut line)? == 0 {
        return Err(invalid(line_no + 1, "missing end_header"));
      }
      line_no += 1;

      let mut tokens = line.split_ascii_whitespace();
      let keyword = tokens.next().unwrap_or("");

      if line_no == 1 {
        if keyword != "ply" {
          return Err(invalid(1, "not a PLY file"));
        }
        continue;
      }

      match keyword {
        "" | "comment" | "obj_info" => {}
        "format" => {
          let name = tokens.next().ok_or_else(|| invalid(line_no, "format without encoding"))?;
          format = Some(
            PlyFormat::parse(name).ok_or_else(|| SceneError::UnsupportedFormat(name.to_string()))?,
          );
        }
        "element" => {
          let name = tokens.next().ok_or_else(|| invalid(line_no, "element without name"))?;
          let count = tokens
            .next()
            .and_then(|c| c.parse::<usize>().ok())
            .ok_or_else(|| invalid(line_no, "element count is not a number"))?;
          elements.push(PlyElement {
            name: name.to_string(),
            count,
            properties: Vec::new(),
          });
        }
        "property" => {
          let element = elements
            .last_mut()
            .ok_or_else(|| invalid(line_no, "property before any element"))?;
          let ty = tokens.next().ok_or_else(|| invalid(line_no, "property without type"))?;
          if ty == "list" {
            let name = tokens.last().unwrap_or("").to_string();
            return Err(SceneError::ListProperty {
              element: element.name.clone(),
              property: name,
            });
          }
          let ty = ScalarType::parse(ty).ok_or_else(|| invalid(line_no, "unknown property type"))?;
          let name = tokens.next().ok_or_else(|| invalid(line_no, "property without name"))?;
          element.properties.push(PlyProperty::new(name, ty));
        }
        "end_header" => break,
        _ => return Err(invalid(line_no, "unknown keyword")),
      }
    }

    let format = format.ok_or_else(|| invalid(line_no, "missing format line"))?;
    Ok(Self { format, elements })
  }

  /// Element declaration by name.
  pub fn element(&self, name: &str) -> Option<&PlyElement> {
    self.elements.iter().find(|e| e.name == name)
  }

  /// Write the header, including `end_header`.
  pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), SceneError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format {} 1.0", self.format.name())?;
    for element in &self.elements {
      writeln!(writer, "element {} {}", element.name, element.count)?;
      for property in &element.properties {
        writeln!(writer, "property {} {}", property.ty.name(), property.name)?;
      }
    }
    writeln!(writer, "end_header")?;
    Ok(())
  }
}

/// Sequential row reader over a PLY body.
///
/// Rows must be read in header order, element by element.
pub struct PlyReader<R> {
  reader: R,
  header: PlyHeader,
  bytes: Vec<u8>,
  line: String,
}

impl<R: BufRead> PlyReader<R> {
  /// Parse the header and position the reader at the start of the body.
  pub fn new(mut reader: R) -> Result<Self, SceneError> {
    let header = PlyHeader::parse(&mut reader)?;
    Ok(Self {
      reader,
      header,
      bytes: Vec::new(),
      line: String::new(),
    })
  }

  pub fn header(&self) -> &PlyHeader {
    &self.header
  }

  /// Read the next row of `element` into `values`, one `f64` per property.
  pub fn read_row(
    &mut self,
    element: &PlyElement,
    row: usize,
    values: &mut Vec<f64>,
  ) -> Result<(), SceneError> {
    values.clear();
    let bad_row = |reason: String| SceneError::BadRow {
      element: element.name.clone(),
      row,
      reason,
    };

    match self.header.format {
      PlyFormat::Ascii => {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
          return Err(bad_row("unexpected end of file".to_string()));
        }
        let mut tokens = self.line.split_ascii_whitespace();
        for property in &element.properties {
          let token = tokens
            .next()
            .ok_or_else(|| bad_row(format!("missing value for `{}`", property.name)))?;
          // Parse floats at their declared width so ascii and binary agree bit for bit
          let parsed = match property.ty {
            ScalarType::Float32 => token.parse::<f32>().map(f64::from),
            _ => token.parse::<f64>(),
          };
          let value = parsed.map_err(|_| bad_row(format!("`{}` is not a number", token)))?;
          values.push(value);
        }
      }
      PlyFormat::BinaryLittleEndian | PlyFormat::BinaryBigEndian => {
        let big_endian = self.header.format == PlyFormat::BinaryBigEndian;
        self.bytes.resize(element.row_size(), 0);
        self.reader.read_exact(&mut self.bytes).map_err(|err| {
          if err.kind() == ErrorKind::UnexpectedEof {
            bad_row("unexpected end of file".to_string())
          } else {
            SceneError::Io(err)
          }
        })?;

        let mut offset = 0;
        for property in &element.properties {
          values.push(property.ty.decode(&self.bytes[offset..], big_endian));
          offset += property.ty.size();
        }
      }
    }
    Ok(())
  }

  /// Read and discard every row of `element`.
  pub fn skip_element(&mut self, element: &PlyElement) -> Result<(), SceneError> {
    let mut values = Vec::with_capacity(element.properties.len());
    for row in 0..element.count {
      self.read_row(element, row, &mut values)?;
    }
    Ok(())
  }
}

/// Encode one row of `element` in `format`, appending to `out`.
///
/// `values` holds one number per property, in property order.
pub fn write_row(format: PlyFormat, element: &PlyElement, values: &[f64], out: &mut Vec<u8>) {
  debug_assert_eq!(values.len(), element.properties.len());
  match format {
    PlyFormat::Ascii => {
      let mut first = true;
      for (property, value) in element.properties.iter().zip(values) {
        if !first {
          out.push(b' ');
        }
        first = false;
        let token = match property.ty {
          ScalarType::Float32 => format!("{}", *value as f32),
          ScalarType::Float64 => format!("{}", value),
          _ => format!("{}", *value as i64),
        };
        out.extend_from_slice(token.as_bytes());
      }
      out.push(b'\n');
    }
    PlyFormat::BinaryLittleEndian | PlyFormat::BinaryBigEndian => {
      let big_endian = format == PlyFormat::BinaryBigEndian;
      for (property, value) in element.properties.iter().zip(values) {
        property.ty.encode(*value, big_endian, out);
      }
    }
  }
}
