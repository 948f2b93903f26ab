/// Flattening of face-indexed geometry into GPU-ready vertex arrays
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ParseError;
use crate::geometry::{RawGeometry, VertexRef};

/// Texture coordinate written for vertices that have none
pub const SENTINEL_UV: [f32; 2] = [-1.0, -1.0];

/// How face corners are mapped onto output vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexStrategy {
    /// One vertex per declared position. The first corner touching a position
    /// decides its texture coordinate, the last one decides its normal.
    #[default]
    SharedPosition,
    /// One vertex per distinct `pos/tex/normal` corner.
    TupleKeyed,
}

/// Structure-of-arrays vertex data ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVertexBuffer {
    /// xyz per vertex
    pub positions: Vec<f32>,
    /// uv per vertex, V flipped for a bottom-left texture origin
    pub tex_coords: Vec<f32>,
    /// xyz per vertex
    pub normals: Vec<f32>,
    /// Three per triangle, in face order
    pub indices: Vec<u32>,
}

impl FlatVertexBuffer {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of indices to draw
    pub fn primitive_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, vertex: usize) -> [f32; 3] {
        let i = vertex * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    pub fn tex_coord(&self, vertex: usize) -> [f32; 2] {
        let i = vertex * 2;
        [self.tex_coords[i], self.tex_coords[i + 1]]
    }

    pub fn normal(&self, vertex: usize) -> [f32; 3] {
        let i = vertex * 3;
        [self.normals[i], self.normals[i + 1], self.normals[i + 2]]
    }

    /// Build the buffer from parsed geometry.
    ///
    /// Index ranges are checked before anything is written, so a hand-built
    /// [`RawGeometry`] with bad indices fails the same way a bad file does.
    pub fn build(raw: &RawGeometry, strategy: VertexStrategy) -> Result<Self, ParseError> {
        raw.validate()?;
        let buffer = match strategy {
            VertexStrategy::SharedPosition => shared_position(raw),
            VertexStrategy::TupleKeyed => tuple_keyed(raw),
        };
        debug!(
            ?strategy,
            vertices = buffer.vertex_count(),
            indices = buffer.primitive_count(),
            "built vertex buffer"
        );
        Ok(buffer)
    }
}

fn resolve_uv(raw: &RawGeometry, corner: &VertexRef) -> [f32; 2] {
    match corner.tex_coord {
        Some(tex) => {
            let uv = raw.tex_coords[tex as usize - 1];
            [uv.x, 1.0 - uv.y]
        }
        None => SENTINEL_UV,
    }
}

fn shared_position(raw: &RawGeometry) -> FlatVertexBuffer {
    let vertex_count = raw.positions.len();

    let mut positions = Vec::with_capacity(vertex_count * 3);
    for p in &raw.positions {
        positions.extend_from_slice(&[p.x, p.y, p.z]);
    }

    let mut tex_coords = SENTINEL_UV.repeat(vertex_count);
    let mut uv_written = vec![false; vertex_count];
    let mut normals = vec![0.0; vertex_count * 3];
    let mut indices = Vec::with_capacity(raw.faces.len() * 3);

    for face in &raw.faces {
        for corner in &face.corners {
            let vertex = corner.position as usize - 1;
            indices.push(vertex as u32);

            let uv = resolve_uv(raw, corner);
            if !uv_written[vertex] {
                tex_coords[vertex * 2..vertex * 2 + 2].copy_from_slice(&uv);
                uv_written[vertex] = true;
            } else if tex_coords[vertex * 2..vertex * 2 + 2] != uv {
                trace!(line = face.line, vertex, "texture coordinate conflict, keeping first");
            }

            let n = raw.normals[corner.normal as usize - 1];
            normals[vertex * 3..vertex * 3 + 3].copy_from_slice(&[n.x, n.y, n.z]);
        }
    }

    FlatVertexBuffer {
        positions,
        tex_coords,
        normals,
        indices,
    }
}

fn tuple_keyed(raw: &RawGeometry) -> FlatVertexBuffer {
    let mut slots: HashMap<VertexRef, u32> = HashMap::new();
    let mut buffer = FlatVertexBuffer {
        positions: Vec::new(),
        tex_coords: Vec::new(),
        normals: Vec::new(),
        indices: Vec::with_capacity(raw.faces.len() * 3),
    };

    for face in &raw.faces {
        for corner in &face.corners {
            let slot = *slots.entry(*corner).or_insert_with(|| {
                let p = raw.positions[corner.position as usize - 1];
                let n = raw.normals[corner.normal as usize - 1];
                buffer.positions.extend_from_slice(&[p.x, p.y, p.z]);
                buffer.tex_coords.extend_from_slice(&resolve_uv(raw, corner));
                buffer.normals.extend_from_slice(&[n.x, n.y, n.z]);
                (buffer.positions.len() / 3 - 1) as u32
            });
            buffer.indices.push(slot);
        }
    }

    buffer
}
