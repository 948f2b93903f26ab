/// Load-time geometry as declared in a mesh source
use std::fmt;

use nalgebra::{Vector2, Vector3};

use crate::error::{Attribute, ParseError, ParseErrorKind};

/// One face corner: 1-based indices into the attribute lists of a [`RawGeometry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexRef {
    pub position: u32,
    /// `None` when the corner was written as `p//n`
    pub tex_coord: Option<u32>,
    pub normal: u32,
}

impl VertexRef {
    pub fn new(position: u32, tex_coord: Option<u32>, normal: u32) -> Self {
        Self {
            position,
            tex_coord,
            normal,
        }
    }
}

impl fmt::Display for VertexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tex_coord {
            Some(tex) => write!(f, "{}/{}/{}", self.position, tex, self.normal),
            None => write!(f, "{}//{}", self.position, self.normal),
        }
    }
}

/// A triangle face statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceStatement {
    /// Source line the statement came from, 0 for generated geometry
    pub line: usize,
    pub corners: [VertexRef; 3],
}

impl FaceStatement {
    pub fn new(line: usize, corners: [VertexRef; 3]) -> Self {
        Self { line, corners }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line, self.to_string(), kind)
    }
}

impl fmt::Display for FaceStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = &self.corners;
        write!(f, "f {} {} {}", a, b, c)
    }
}

/// Per-attribute lists and face statements, exactly as declared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGeometry {
    pub positions: Vec<Vector3<f32>>,
    pub tex_coords: Vec<Vector2<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub faces: Vec<FaceStatement>,
}

impl RawGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check that every face index points inside its attribute list.
    ///
    /// Fails on the first offending corner in file order. The error quotes the
    /// statement rebuilt from its corners; [`crate::obj::ObjParser`] swaps in the
    /// source text.
    pub fn validate(&self) -> Result<(), ParseError> {
        for face in &self.faces {
            for corner in &face.corners {
                check_index(face, Attribute::Position, corner.position, self.positions.len())?;
                if let Some(tex) = corner.tex_coord {
                    check_index(face, Attribute::TexCoord, tex, self.tex_coords.len())?;
                }
                check_index(face, Attribute::Normal, corner.normal, self.normals.len())?;
            }
        }
        Ok(())
    }

    /// Create a cube centred on the origin, for demos and tests
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut geometry = Self::new();

        geometry.positions = vec![
            Vector3::new(-half, -half, half),
            Vector3::new(half, -half, half),
            Vector3::new(half, half, half),
            Vector3::new(-half, half, half),
            Vector3::new(-half, -half, -half),
            Vector3::new(half, -half, -half),
            Vector3::new(half, half, -half),
            Vector3::new(-half, half, -half),
        ];
        geometry.tex_coords = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        geometry.normals = vec![
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
        ];

        // (quad corners, normal) per side; each quad splits into two triangles
        let sides: [([u32; 4], u32); 6] = [
            ([1, 2, 3, 4], 1), // front
            ([5, 8, 7, 6], 2), // back
            ([8, 4, 3, 7], 3), // top
            ([5, 6, 2, 1], 4), // bottom
            ([6, 7, 3, 2], 5), // right
            ([5, 1, 4, 8], 6), // left
        ];
        for (quad, normal) in sides {
            let corner = |i: usize| VertexRef::new(quad[i], Some(i as u32 + 1), normal);
            geometry
                .faces
                .push(FaceStatement::new(0, [corner(0), corner(1), corner(2)]));
            geometry
                .faces
                .push(FaceStatement::new(0, [corner(0), corner(2), corner(3)]));
        }

        geometry
    }
}

fn check_index(
    face: &FaceStatement,
    attribute: Attribute,
    index: u32,
    len: usize,
) -> Result<(), ParseError> {
    if index == 0 || index as usize > len {
        return Err(face.error(ParseErrorKind::IndexOutOfRange {
            attribute,
            index,
            len,
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_is_valid() {
        let cube = RawGeometry::cube(2.0);
        assert_eq!(cube.positions.len(), 8);
        assert_eq!(cube.face_count(), 12);
        assert!(cube.validate().is_ok());
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = RawGeometry::cube(2.0);
        for face in &cube.faces {
            let [a, b, c] = face.corners.map(|r| cube.positions[r.position as usize - 1]);
            let winding = (b - a).cross(&(c - a)).normalize();
            let normal = cube.normals[face.corners[0].normal as usize - 1];
            assert!((winding - normal).norm() < 1e-6, "{face} winds inward");
        }
    }

    #[test]
    fn test_validate_rejects_zero_index() {
        let mut geometry = RawGeometry::cube(1.0);
        geometry.faces[3].corners[1].position = 0;
        let err = geometry.validate().unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::IndexOutOfRange {
                attribute: Attribute::Position,
                index: 0,
                len: 8,
            }
        );
    }

    #[test]
    fn test_validate_rejects_missing_tex_coord() {
        let mut geometry = RawGeometry::cube(1.0);
        geometry.faces[0].corners[2].tex_coord = Some(5);
        let err = geometry.validate().unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::IndexOutOfRange {
                attribute: Attribute::TexCoord,
                index: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_face_display_round_trips_empty_uv() {
        let face = FaceStatement::new(
            3,
            [
                VertexRef::new(1, None, 1),
                VertexRef::new(2, Some(4), 1),
                VertexRef::new(3, None, 2),
            ],
        );
        assert_eq!(face.to_string(), "f 1//1 2/4/1 3//2");
    }
}
