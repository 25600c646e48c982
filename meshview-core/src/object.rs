/// Loaded objects: GPU resources plus transform state
use nalgebra::{Matrix4, Vector3};
use tracing::debug;

use crate::error::GraphicsError;
use crate::geometry::Mesh;
use crate::gfx::{
    BufferData, BufferId, GraphicsContext, PolygonMode, Uniform, VertexArrayId, VertexAttribute,
    NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE,
};
use crate::transform::TransformState;

/// The four resources backing one uploaded mesh.
///
/// Acquired together by [`GpuMesh::upload`] and released together by
/// [`GpuMesh::release`], which consumes the bundle.
#[derive(Debug)]
pub struct GpuMesh {
    vertex_array: VertexArrayId,
    positions: BufferId,
    normals: BufferId,
    indices: BufferId,
    index_count: u32,
}

impl GpuMesh {
    pub fn upload<G: GraphicsContext + ?Sized>(
        gfx: &mut G,
        mesh: &Mesh,
    ) -> Result<Self, GraphicsError> {
        let positions = gfx.create_buffer(BufferData::Positions(mesh.vertices()))?;

        let normals = match gfx.create_buffer(BufferData::Normals(mesh.normals())) {
            Ok(buffer) => buffer,
            Err(e) => {
                gfx.delete_buffer(positions);
                return Err(e);
            }
        };

        let indices = match gfx.create_buffer(BufferData::Indices(mesh.indices())) {
            Ok(buffer) => buffer,
            Err(e) => {
                gfx.delete_buffer(positions);
                gfx.delete_buffer(normals);
                return Err(e);
            }
        };

        let attributes = [
            VertexAttribute {
                location: POSITION_ATTRIBUTE,
                buffer: &positions,
            },
            VertexAttribute {
                location: NORMAL_ATTRIBUTE,
                buffer: &normals,
            },
        ];
        let vertex_array = match gfx.create_vertex_array(&attributes, &indices) {
            Ok(vertex_array) => vertex_array,
            Err(e) => {
                gfx.delete_buffer(positions);
                gfx.delete_buffer(normals);
                gfx.delete_buffer(indices);
                return Err(e);
            }
        };

        Ok(Self {
            vertex_array,
            positions,
            normals,
            indices,
            index_count: mesh.indices().len() as u32,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn draw<G: GraphicsContext + ?Sized>(&self, gfx: &mut G) -> Result<(), GraphicsError> {
        gfx.draw_indexed(&self.vertex_array, self.index_count)
    }

    pub fn release<G: GraphicsContext + ?Sized>(self, gfx: &mut G) {
        gfx.delete_vertex_array(self.vertex_array);
        gfx.delete_buffer(self.positions);
        gfx.delete_buffer(self.normals);
        gfx.delete_buffer(self.indices);
    }
}

/// One entry in the viewer's object list.
#[derive(Debug)]
pub struct MeshObject {
    name: String,
    gpu: GpuMesh,
    pub transform: TransformState,
}

impl MeshObject {
    pub fn new<G: GraphicsContext + ?Sized>(
        gfx: &mut G,
        name: impl Into<String>,
        mesh: &Mesh,
    ) -> Result<Self, GraphicsError> {
        let gpu = GpuMesh::upload(gfx, mesh)?;
        Ok(Self {
            name: name.into(),
            gpu,
            transform: TransformState::identity(),
        })
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.transform.position = position;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gpu(&self) -> &GpuMesh {
        &self.gpu
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.model_matrix()
    }

    /// Draw with this object's model matrix. Wireframe only applies to the
    /// selected object, and only for the duration of this draw call.
    pub fn draw<G: GraphicsContext + ?Sized>(
        &self,
        gfx: &mut G,
        selected: bool,
        wireframe: bool,
    ) -> Result<(), GraphicsError> {
        gfx.set_uniform(Uniform::Model(self.model_matrix()));
        gfx.set_uniform(Uniform::Selected(selected));

        let outline = selected && wireframe;
        if outline {
            gfx.set_polygon_mode(PolygonMode::Line);
        }

        let result = self.gpu.draw(gfx);

        if outline {
            gfx.set_polygon_mode(PolygonMode::Fill);
        }
        result
    }

    pub fn destroy<G: GraphicsContext + ?Sized>(self, gfx: &mut G) {
        debug!("Releasing GPU resources for {}", self.name);
        self.gpu.release(gfx);
    }
}
