/// Example: Load an OBJ file and report what each vertex strategy produces
///
/// Usage: cargo run --example inspect_obj -- path/to/file.obj
use std::env;

use anyhow::{Context, Result};
use labyrinth_core::{load_obj, FlatVertexBuffer, VertexStrategy};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .context("usage: inspect_obj <obj-file>")?;

    let raw = load_obj(&path).with_context(|| format!("failed to load {path}"))?;
    println!(
        "{path}: {} positions, {} texture coordinates, {} normals, {} faces",
        raw.positions.len(),
        raw.tex_coords.len(),
        raw.normals.len(),
        raw.face_count()
    );

    for strategy in [VertexStrategy::SharedPosition, VertexStrategy::TupleKeyed] {
        let buffer = FlatVertexBuffer::build(&raw, strategy)?;
        println!(
            "  {strategy:?}: {} vertices, {} indices",
            buffer.vertex_count(),
            buffer.primitive_count()
        );
    }
    Ok(())
}
