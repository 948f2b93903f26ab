/// Wavefront OBJ reader for triangulated `v`/`vt`/`vn`/`f` meshes
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use nalgebra::{Vector2, Vector3};
use nom::{
    character::complete::{char, u32 as index},
    combinator::{all_consuming, opt},
    number::complete::float,
    IResult,
};
use tracing::debug;

use crate::error::{LabyrinthResult, ParseError, ParseErrorKind};
use crate::geometry::{FaceStatement, RawGeometry, VertexRef};

/// Incremental line-by-line OBJ parser
#[derive(Debug, Default)]
pub struct ObjParser {
    geometry: RawGeometry,
    /// Face statement text by line, for index errors raised in `finish`
    face_sources: HashMap<usize, String>,
    lines: usize,
}

impl ObjParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one source line. `line_no` is 1-based and only used for diagnostics.
    pub fn feed_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        self.lines = self.lines.max(line_no);

        let mut fields = line.split_whitespace();
        let Some(tag) = fields.next() else {
            return Ok(());
        };
        let fields: Vec<&str> = fields.collect();
        let fail = |kind| ParseError::new(line_no, line.trim(), kind);

        match tag {
            "v" => {
                let [x, y, z] = parse_floats::<3>("v", &fields).map_err(fail)?;
                self.geometry.positions.push(Vector3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>("vt", &fields).map_err(fail)?;
                self.geometry.tex_coords.push(Vector2::new(u, v));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>("vn", &fields).map_err(fail)?;
                self.geometry.normals.push(Vector3::new(x, y, z));
            }
            "f" => {
                if fields.len() != 3 {
                    return Err(fail(ParseErrorKind::UnsupportedFaceArity {
                        found: fields.len(),
                    }));
                }
                let mut corners = [VertexRef::new(0, None, 0); 3];
                for (corner, token) in corners.iter_mut().zip(&fields) {
                    *corner = parse_vertex_ref(token).map_err(fail)?;
                }
                self.geometry.faces.push(FaceStatement::new(line_no, corners));
                self.face_sources.insert(line_no, line.trim().to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Finish parsing and check every face index against the declared lists
    pub fn finish(mut self) -> Result<RawGeometry, ParseError> {
        if let Err(mut err) = self.geometry.validate() {
            if let Some(source) = self.face_sources.remove(&err.line) {
                err.content = source;
            }
            return Err(err);
        }
        debug!(
            lines = self.lines,
            positions = self.geometry.positions.len(),
            tex_coords = self.geometry.tex_coords.len(),
            normals = self.geometry.normals.len(),
            faces = self.geometry.faces.len(),
            "parsed OBJ source"
        );
        Ok(self.geometry)
    }
}

/// Parse an OBJ source held in memory
pub fn parse_obj(source: &str) -> Result<RawGeometry, ParseError> {
    let mut parser = ObjParser::new();
    for (i, line) in source.lines().enumerate() {
        parser.feed_line(i + 1, line)?;
    }
    parser.finish()
}

/// Parse an OBJ source from any buffered reader
pub fn read_obj<R: BufRead>(reader: R) -> LabyrinthResult<RawGeometry> {
    let mut parser = ObjParser::new();
    for (i, line) in reader.lines().enumerate() {
        parser.feed_line(i + 1, &line?)?;
    }
    Ok(parser.finish()?)
}

/// Load and parse an OBJ file from disk
pub fn load_obj<P: AsRef<Path>>(path: P) -> LabyrinthResult<RawGeometry> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading OBJ file");
    let file = File::open(path)?;
    read_obj(BufReader::new(file))
}

fn parse_floats<const N: usize>(
    tag: &'static str,
    fields: &[&str],
) -> Result<[f32; N], ParseErrorKind> {
    if fields.len() < N {
        return Err(ParseErrorKind::MissingField {
            tag,
            expected: N,
            found: fields.len(),
        });
    }

    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(fields) {
        *value = parse_float(token)?;
    }
    Ok(values)
}

/// NaN and infinities are rejected along with unparsable tokens
fn parse_float(token: &str) -> Result<f32, ParseErrorKind> {
    match all_consuming(number)(token) {
        Ok((_, value)) if value.is_finite() => Ok(value),
        _ => Err(ParseErrorKind::MalformedNumber {
            token: token.to_string(),
        }),
    }
}

fn parse_vertex_ref(token: &str) -> Result<VertexRef, ParseErrorKind> {
    all_consuming(vertex_ref)(token)
        .map(|(_, corner)| corner)
        .map_err(|_| ParseErrorKind::MalformedVertexRef {
            token: token.to_string(),
        })
}

fn number(input: &str) -> IResult<&str, f32> {
    float(input)
}

fn vertex_ref(input: &str) -> IResult<&str, VertexRef> {
    let (input, position) = index(input)?;
    let (input, _) = char('/')(input)?;
    let (input, tex_coord) = opt(index)(input)?;
    let (input, _) = char('/')(input)?;
    let (input, normal) = index(input)?;
    Ok((input, VertexRef::new(position, tex_coord, normal)))
}
