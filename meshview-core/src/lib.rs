/// meshview core library - geometry loading, transforms and viewer state
///
/// Nothing in here talks to a terminal or a window: rendering goes through
/// the [`GraphicsContext`] trait, and input arrives as [`ViewerCommand`]s
/// plus a [`HeldKeys`] snapshot per frame.

pub mod controller;
pub mod error;
pub mod geometry;
pub mod gfx;
pub mod obj;
pub mod object;
pub mod projection;
pub mod transform;
pub mod viewer;

// Re-export commonly used types
pub use controller::{AxisKey, HeldKeys, TransformKind, TransformSpeeds, ViewerCommand};
pub use error::{GraphicsError, LoadError};
pub use geometry::Mesh;
pub use gfx::{GraphicsContext, PolygonMode, Uniform};
pub use obj::{load_obj, parse_obj};
pub use object::{GpuMesh, MeshObject};
pub use projection::Camera;
pub use transform::{Transform, TransformState};
pub use viewer::{Notice, ViewerState};
