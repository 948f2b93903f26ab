/// Labyrinth Core Library - mesh loading and transform pipeline
///
/// Parses triangulated OBJ meshes into flat, upload-ready vertex buffers and
/// computes the model, view and projection matrices a renderer binds each frame.
/// The renderer itself is reached only through the traits in [`sink`].

pub mod config;
pub mod error;
pub mod geometry;
pub mod lighting;
pub mod obj;
pub mod projection;
pub mod sink;
pub mod transform;
pub mod vertex_buffer;

// Re-export commonly used types
pub use config::ViewerConfig;
pub use error::{LabyrinthError, LabyrinthResult, ParseError, ParseErrorKind, ViewportError};
pub use geometry::{FaceStatement, RawGeometry, VertexRef};
pub use lighting::{Material, PointLight};
pub use obj::{load_obj, parse_obj, read_obj, ObjParser};
pub use projection::{CameraPose, ViewportParams};
pub use sink::{BufferSink, Model, UniformSink};
pub use transform::{MatrixConvention, ObjectMatrices, ObjectPose, TransformPipeline};
pub use vertex_buffer::{FlatVertexBuffer, VertexStrategy, SENTINEL_UV};

/// Parse OBJ source and flatten it in one step
pub fn load_mesh_from_str(
    source: &str,
    strategy: VertexStrategy,
) -> Result<FlatVertexBuffer, ParseError> {
    let raw = parse_obj(source)?;
    FlatVertexBuffer::build(&raw, strategy)
}

/// Load an OBJ file and flatten it in one step
pub fn load_mesh<P: AsRef<std::path::Path>>(
    path: P,
    strategy: VertexStrategy,
) -> LabyrinthResult<FlatVertexBuffer> {
    let raw = load_obj(path)?;
    Ok(FlatVertexBuffer::build(&raw, strategy)?)
}
