//! Error types for the Labyrinth core.
//!
//! Mesh loading fails with [`ParseError`], projection with [`ViewportError`].
//! Everything that crosses a crate boundary is wrapped in [`LabyrinthError`].

use std::fmt;

use thiserror::Error;

/// Which per-vertex attribute list a face index points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texture coordinate",
            Attribute::Normal => "normal",
        })
    }
}

/// What went wrong on a mesh source line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    /// A numeric field could not be read as a float.
    #[error("malformed number `{token}`")]
    MalformedNumber { token: String },

    /// The statement has fewer fields than its tag requires.
    #[error("`{tag}` statement expects {expected} fields, found {found}")]
    MissingField {
        tag: &'static str,
        expected: usize,
        found: usize,
    },

    /// A face corner is not of the form `pos/[tex]/normal`.
    #[error("malformed vertex reference `{token}`")]
    MalformedVertexRef { token: String },

    /// Only triangles are accepted.
    #[error("unsupported face arity: expected 3 vertex references, found {found}")]
    UnsupportedFaceArity { found: usize },

    /// A face references an attribute that was never declared.
    #[error("{attribute} index {index} out of range (1..={len})")]
    IndexOutOfRange {
        attribute: Attribute,
        index: u32,
        len: usize,
    },
}

/// A fatal error in a mesh source, with enough context to locate it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind} in `{content}`")]
pub struct ParseError {
    /// 1-based source line.
    pub line: usize,
    /// The offending statement.
    pub content: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, content: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            line,
            content: content.into(),
            kind,
        }
    }
}

/// Degenerate projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ViewportError {
    #[error("viewport dimensions must be positive, got {width}x{height}")]
    Dimensions { width: f32, height: f32 },

    #[error("invalid clip planes: near {near}, far {far}")]
    ClipPlanes { near: f32, far: f32 },

    #[error("field of view must lie in (0, pi) radians, got {fov}")]
    FieldOfView { fov: f32 },
}

/// Unified error type for the Labyrinth crates.
#[derive(Debug, Error)]
pub enum LabyrinthError {
    /// Reading a mesh or config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mesh source is malformed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Projection parameters are degenerate.
    #[error("Viewport error: {0}")]
    Viewport(#[from] ViewportError),

    /// Config file is not valid TOML for [`crate::config::ViewerConfig`].
    #[error("Config error: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    /// Config value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The buffer sink refused the mesh.
    #[error("Buffer upload failed: {0}")]
    Upload(String),
}

/// Convenience alias for `Result<T, LabyrinthError>`.
pub type LabyrinthResult<T> = Result<T, LabyrinthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_names_line_and_kind() {
        let err = ParseError::new(
            7,
            "f 1/1/1 2/2/2 3/3/3 4/4/4",
            ParseErrorKind::UnsupportedFaceArity { found: 4 },
        );
        let message = err.to_string();
        assert!(message.starts_with("line 7:"));
        assert!(message.contains("unsupported face arity"));
        assert!(message.contains("4/4/4"));
    }

    #[test]
    fn test_parse_error_converts_into_crate_error() {
        let err: LabyrinthError = ParseError::new(
            1,
            "f 0//1 1//1 2//1",
            ParseErrorKind::IndexOutOfRange {
                attribute: Attribute::Position,
                index: 0,
                len: 3,
            },
        )
        .into();
        assert!(matches!(err, LabyrinthError::Parse(_)));
        assert!(err.to_string().contains("position index 0 out of range"));
    }
}
