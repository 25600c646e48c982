/// Error types for model loading and the graphics contract
use std::path::PathBuf;

/// Errors produced while loading a geometry file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' contains no faces", path.display())]
    Empty { path: PathBuf },

    #[error("line {line}: vertex index {index} is out of range")]
    VertexIndexOutOfRange { line: usize, index: u32 },
}

/// Errors reported by a [`GraphicsContext`](crate::gfx::GraphicsContext).
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// The context, window or device could not be brought up.
    #[error("failed to initialize graphics context: {0}")]
    Init(String),

    #[error("out of graphics resources: {0}")]
    OutOfResources(String),

    #[error("unknown resource handle {0}")]
    UnknownHandle(u32),

    #[error("invalid vertex layout: {0}")]
    InvalidLayout(String),
}
