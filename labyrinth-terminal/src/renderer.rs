/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use labyrinth_core::projection::project_to_screen;
use labyrinth_core::sink::uniforms;
use labyrinth_core::{BufferSink, FlatVertexBuffer, MatrixConvention, PointLight, UniformSink};
use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light every lit face receives regardless of orientation
const AMBIENT: f32 = 0.15;

/// Identifies a mesh uploaded to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(u32);

#[derive(Debug, Error, PartialEq)]
pub enum UploadError {
    #[error("position array length {0} is not a multiple of 3")]
    RaggedPositions(usize),
    #[error("index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("no mesh uploaded under {0:?}")]
    UnknownMesh(MeshHandle),
    #[error("uniform `{0}` was never set")]
    MissingUniform(&'static str),
}

struct GpuMesh {
    positions: Vec<Point3<f32>>,
    indices: Vec<u32>,
}

#[derive(Default)]
struct Uniforms {
    matrices: HashMap<String, Matrix4<f32>>,
    vec3s: HashMap<String, Vector3<f32>>,
    vec4s: HashMap<String, Vector4<f32>>,
    floats: HashMap<String, f32>,
    ints: HashMap<String, i32>,
}

/// Material values read back from the uniforms
struct Surface {
    tint: f32,
    shine_damper: f32,
    reflectivity: f32,
}

impl Uniforms {
    /// Untextured surfaces are tinted by `colour`; textured ones draw at full
    /// intensity since the terminal has no sampler.
    fn surface(&self) -> Surface {
        let use_colour = self.ints.get(uniforms::USE_COLOUR).map_or(true, |&v| v != 0);
        let tint = match self.vec4s.get(uniforms::COLOUR) {
            Some(colour) if use_colour => colour.xyz().mean(),
            _ => 1.0,
        };
        Surface {
            tint,
            shine_damper: self.floats.get(uniforms::SHINE_DAMPER).copied().unwrap_or(1.0),
            reflectivity: self.floats.get(uniforms::REFLECTIVITY).copied().unwrap_or(0.0),
        }
    }

    fn matrix(&self, name: &'static str) -> Result<&Matrix4<f32>, RenderError> {
        self.matrices
            .get(name)
            .ok_or(RenderError::MissingUniform(name))
    }
}

/// ASCII renderer that converts uploaded meshes to terminal characters.
///
/// Acts as both buffer and uniform sink. Its "vertex stage" reads matrices in the
/// shape given by its [`MatrixConvention`] and lights faces in eye space.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    convention: MatrixConvention,
    meshes: HashMap<MeshHandle, GpuMesh>,
    next_handle: u32,
    uniforms: Uniforms,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize, convention: MatrixConvention) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            convention,
            meshes: HashMap::new(),
            next_handle: 0,
            uniforms: Uniforms::default(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; width * height];
        self.char_buffer = vec![' '; width * height];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Characters currently in the frame buffer, row-major
    pub fn frame(&self) -> &[char] {
        &self.char_buffer
    }

    /// Draw an uploaded mesh with the uniforms set so far. Returns the number of
    /// triangles that reached the frame buffer.
    pub fn draw_mesh(&mut self, handle: MeshHandle) -> Result<usize, RenderError> {
        let mesh = self
            .meshes
            .get(&handle)
            .ok_or(RenderError::UnknownMesh(handle))?;

        let projection = *self.uniforms.matrix(uniforms::PROJECTION_MATRIX)?;
        let model_view = match self.convention {
            MatrixConvention::ModelView => *self.uniforms.matrix(uniforms::MODEL_VIEW_MATRIX)?,
            MatrixConvention::SeparateViewModel => {
                self.uniforms.matrix(uniforms::VIEW_MATRIX)?
                    * self.uniforms.matrix(uniforms::TRANSFORMATION_MATRIX)?
            }
        };
        let light = self.light();
        let surface = self.uniforms.surface();

        let mut visible = Vec::new();
        for corners in mesh.indices.chunks_exact(3) {
            let eye = [
                model_view.transform_point(&mesh.positions[corners[0] as usize]),
                model_view.transform_point(&mesh.positions[corners[1] as usize]),
                model_view.transform_point(&mesh.positions[corners[2] as usize]),
            ];

            // Calculate face normal for shading and culling
            let normal = (eye[1] - eye[0]).cross(&(eye[2] - eye[0]));
            let centroid = (eye[0].coords + eye[1].coords + eye[2].coords) / 3.0;
            if normal.dot(&-centroid) <= 0.0 {
                continue;
            }

            // Project vertices to screen space
            let mut screen_coords = [(0.0, 0.0, 0.0); 3];
            let mut clipped = false;
            for (screen, point) in screen_coords.iter_mut().zip(&eye) {
                match project_to_screen(&projection, point, self.width as u32, self.height as u32) {
                    Some(coords) => *screen = coords,
                    None => clipped = true,
                }
            }
            if clipped {
                continue;
            }

            // eye sits at the origin in eye space
            let diffuse = light.diffuse(&centroid, &normal) * surface.tint;
            let specular = light.specular(
                &centroid,
                &normal,
                &Vector3::zeros(),
                surface.shine_damper,
                surface.reflectivity,
            );
            let brightness =
                (AMBIENT + (1.0 - AMBIENT) * (diffuse + specular) * light.luminance())
                    .clamp(0.0, 1.0);

            // Map brightness to character
            let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
            let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
            visible.push((screen_coords, LUMINOSITY_RAMP[char_index]));
        }

        let drawn = visible.len();
        for (coords, character) in visible {
            self.rasterize_triangle(&coords, character);
        }
        Ok(drawn)
    }

    /// The light as set through uniforms, or a white headlight
    fn light(&self) -> PointLight {
        let position = self
            .uniforms
            .vec3s
            .get(uniforms::LIGHT_POSITION)
            .copied()
            .unwrap_or_else(Vector3::zeros);
        let colour = self
            .uniforms
            .vec3s
            .get(uniforms::LIGHT_COLOUR)
            .copied()
            .unwrap_or_else(|| Vector3::repeat(1.0));
        PointLight::new(position, colour)
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl BufferSink for AsciiRenderer {
    type Handle = MeshHandle;
    type Error = UploadError;

    fn upload(&mut self, buffer: &FlatVertexBuffer) -> Result<MeshHandle, UploadError> {
        if buffer.positions.len() % 3 != 0 {
            return Err(UploadError::RaggedPositions(buffer.positions.len()));
        }
        if buffer.indices.len() % 3 != 0 {
            return Err(UploadError::PartialTriangle(buffer.indices.len()));
        }
        let vertex_count = buffer.vertex_count();
        if let Some(&index) = buffer.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(UploadError::IndexOutOfBounds {
                index,
                vertex_count,
            });
        }

        let positions = buffer
            .positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0], p[1], p[2]))
            .collect();
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.meshes.insert(
            handle,
            GpuMesh {
                positions,
                indices: buffer.indices.clone(),
            },
        );
        Ok(handle)
    }

    fn release(&mut self, handle: MeshHandle) {
        self.meshes.remove(&handle);
    }
}

impl UniformSink for AsciiRenderer {
    fn set_matrix4(&mut self, name: &str, value: &Matrix4<f32>) {
        self.uniforms.matrices.insert(name.to_string(), *value);
    }

    fn set_vec3(&mut self, name: &str, value: &Vector3<f32>) {
        self.uniforms.vec3s.insert(name.to_string(), *value);
    }

    fn set_vec4(&mut self, name: &str, value: &Vector4<f32>) {
        self.uniforms.vec4s.insert(name.to_string(), *value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.uniforms.floats.insert(name.to_string(), value);
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.uniforms.ints.insert(name.to_string(), value);
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
