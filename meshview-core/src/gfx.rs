/// The rendering surface the core draws through
///
/// A backend hands out opaque handles for the buffers and vertex arrays it
/// creates. Handles are deliberately neither `Clone` nor `Copy`: whoever
/// holds one owns the resource and is the only party able to delete it.
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::GraphicsError;

/// Owned handle to a backend buffer.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct BufferId(u32);

/// Owned handle to a backend vertex array (attribute layout + buffers).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct VertexArrayId(u32);

impl BufferId {
    /// Wrap a raw id. Only backends should mint handles.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl VertexArrayId {
    /// Wrap a raw id. Only backends should mint handles.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Data for a new buffer. Uploads are one-shot; buffers are immutable.
#[derive(Debug, Clone, Copy)]
pub enum BufferData<'a> {
    Positions(&'a [Point3<f32>]),
    Normals(&'a [Vector3<f32>]),
    Indices(&'a [u32]),
}

impl BufferData<'_> {
    pub fn len(&self) -> usize {
        match self {
            BufferData::Positions(data) => data.len(),
            BufferData::Normals(data) => data.len(),
            BufferData::Indices(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shader attribute slot for vertex positions.
pub const POSITION_ATTRIBUTE: u32 = 0;
/// Shader attribute slot for vertex normals.
pub const NORMAL_ATTRIBUTE: u32 = 1;

/// Binds a buffer of tightly packed 3 × f32 values to an attribute slot.
#[derive(Debug)]
pub struct VertexAttribute<'a> {
    pub location: u32,
    pub buffer: &'a BufferId,
}

/// Values the shading stage consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Model(Matrix4<f32>),
    View(Matrix4<f32>),
    Projection(Matrix4<f32>),
    Selected(bool),
    LightPosition(Vector3<f32>),
    LightColor(Vector3<f32>),
}

/// Rasterizer fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
}

/// A depth-tested graphics context capable of indexed triangle drawing.
pub trait GraphicsContext {
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferId, GraphicsError>;

    fn create_vertex_array(
        &mut self,
        attributes: &[VertexAttribute<'_>],
        indices: &BufferId,
    ) -> Result<VertexArrayId, GraphicsError>;

    fn delete_buffer(&mut self, buffer: BufferId);

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    fn set_uniform(&mut self, uniform: Uniform);

    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Draw `count` indices from the vertex array as a triangle list.
    fn draw_indexed(&mut self, vertex_array: &VertexArrayId, count: u32)
        -> Result<(), GraphicsError>;
}

#[cfg(test)]
pub(crate) mod recording {
    //! A context that hands out sequential handles and records every call.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        CreateBuffer { id: u32, len: usize },
        CreateVertexArray { id: u32, attributes: Vec<(u32, u32)>, indices: u32 },
        DeleteBuffer(u32),
        DeleteVertexArray(u32),
        SetUniform(Uniform),
        SetPolygonMode(PolygonMode),
        DrawIndexed { vertex_array: u32, count: u32 },
    }

    #[derive(Debug, Default)]
    pub struct RecordingContext {
        pub calls: Vec<Call>,
        next_id: u32,
        /// Creation fails once this many resources exist.
        pub capacity: Option<u32>,
        live: u32,
    }

    impl RecordingContext {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn live_resources(&self) -> u32 {
            self.live
        }

        fn mint(&mut self) -> Result<u32, GraphicsError> {
            if self.capacity.is_some_and(|capacity| self.live >= capacity) {
                return Err(GraphicsError::OutOfResources("recording context full".into()));
            }
            self.next_id += 1;
            self.live += 1;
            Ok(self.next_id)
        }
    }

    impl GraphicsContext for RecordingContext {
        fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferId, GraphicsError> {
            let id = self.mint()?;
            self.calls.push(Call::CreateBuffer { id, len: data.len() });
            Ok(BufferId::from_raw(id))
        }

        fn create_vertex_array(
            &mut self,
            attributes: &[VertexAttribute<'_>],
            indices: &BufferId,
        ) -> Result<VertexArrayId, GraphicsError> {
            let id = self.mint()?;
            self.calls.push(Call::CreateVertexArray {
                id,
                attributes: attributes.iter().map(|a| (a.location, a.buffer.raw())).collect(),
                indices: indices.raw(),
            });
            Ok(VertexArrayId::from_raw(id))
        }

        fn delete_buffer(&mut self, buffer: BufferId) {
            self.live -= 1;
            self.calls.push(Call::DeleteBuffer(buffer.raw()));
        }

        fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
            self.live -= 1;
            self.calls.push(Call::DeleteVertexArray(vertex_array.raw()));
        }

        fn set_uniform(&mut self, uniform: Uniform) {
            self.calls.push(Call::SetUniform(uniform));
        }

        fn set_polygon_mode(&mut self, mode: PolygonMode) {
            self.calls.push(Call::SetPolygonMode(mode));
        }

        fn draw_indexed(
            &mut self,
            vertex_array: &VertexArrayId,
            count: u32,
        ) -> Result<(), GraphicsError> {
            self.calls.push(Call::DrawIndexed {
                vertex_array: vertex_array.raw(),
                count,
            });
            Ok(())
        }
    }
}
