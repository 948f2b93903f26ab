/// Contracts for the renderer that consumes core output.
///
/// The core never talks to a graphics API. Vertex data goes to a [`BufferSink`],
/// matrices and lighting values go to a [`UniformSink`]. A renderer implements
/// both.
use nalgebra::{Matrix4, Vector3, Vector4};
use tracing::{debug, error};

use crate::error::{LabyrinthError, LabyrinthResult};
use crate::lighting::Material;
use crate::transform::ObjectPose;
use crate::vertex_buffer::FlatVertexBuffer;

/// Uniform names shared between the core and shader stages
pub mod uniforms {
    pub const PROJECTION_MATRIX: &str = "projectionMatrix";
    pub const MODEL_VIEW_MATRIX: &str = "modelViewMatrix";
    pub const VIEW_MATRIX: &str = "viewMatrix";
    pub const TRANSFORMATION_MATRIX: &str = "transformationMatrix";

    pub const LIGHT_POSITION: &str = "lightPosition";
    pub const LIGHT_COLOUR: &str = "lightColour";
    pub const SHINE_DAMPER: &str = "shineDamper";
    pub const REFLECTIVITY: &str = "reflectivity";

    pub const COLOUR: &str = "colour";
    pub const USE_COLOUR: &str = "useColour";
    pub const TEXTURE_SAMPLER: &str = "textureSampler";
}

/// Receives flat vertex arrays and owns the uploaded copies
pub trait BufferSink {
    type Handle: Copy;
    type Error: std::fmt::Display;

    fn upload(&mut self, buffer: &FlatVertexBuffer) -> Result<Self::Handle, Self::Error>;

    fn release(&mut self, handle: Self::Handle);
}

/// Receives named shader values. Matrices are column-major.
pub trait UniformSink {
    fn set_matrix4(&mut self, name: &str, value: &Matrix4<f32>);
    fn set_vec3(&mut self, name: &str, value: &Vector3<f32>);
    fn set_vec4(&mut self, name: &str, value: &Vector4<f32>);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_int(&mut self, name: &str, value: i32);

    fn set_bool(&mut self, name: &str, value: bool) {
        self.set_int(name, value as i32);
    }
}

/// A mesh living in a buffer sink, placed in the world
#[derive(Debug, Clone)]
pub struct Model<H> {
    handle: H,
    index_count: usize,
    pub pose: ObjectPose,
    pub material: Material,
}

impl<H: Copy> Model<H> {
    /// Hand the buffer to the sink. A refused upload fails the whole load.
    pub fn upload<S>(sink: &mut S, buffer: &FlatVertexBuffer) -> LabyrinthResult<Self>
    where
        S: BufferSink<Handle = H> + ?Sized,
    {
        let handle = sink.upload(buffer).map_err(|e| {
            error!(error = %e, "buffer upload failed");
            LabyrinthError::Upload(e.to_string())
        })?;
        debug!(
            vertices = buffer.vertex_count(),
            indices = buffer.primitive_count(),
            "uploaded model"
        );
        Ok(Self {
            handle,
            index_count: buffer.primitive_count(),
            pose: ObjectPose::default(),
            material: Material::default(),
        })
    }

    pub fn with_pose(mut self, pose: ObjectPose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn handle(&self) -> H {
        self.handle
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Release the buffers held by the sink
    pub fn destroy<S>(self, sink: &mut S)
    where
        S: BufferSink<Handle = H> + ?Sized,
    {
        sink.release(self.handle);
    }
}
