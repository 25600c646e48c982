/// Software graphics context: CPU-side buffers, a vertex stage and a
/// Lambert fragment stage rasterizing into a [`Framebuffer`]
use meshview_core::gfx::{
    BufferData, BufferId, GraphicsContext, PolygonMode, Uniform, VertexArrayId, VertexAttribute,
    NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE,
};
use meshview_core::GraphicsError;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::collections::HashMap;
use tracing::trace;

use crate::framebuffer::{ramp_character, Fragment, Framebuffer, ScreenPoint};

const AMBIENT_STRENGTH: f32 = 0.3;
const SELECTED_TINT: Vector3<f32> = Vector3::new(0.9, 0.6, 0.1);
const DEFAULT_TINT: Vector3<f32> = Vector3::new(1.0, 1.0, 1.0);

/// Clip-space `w` below which a vertex counts as behind the camera.
const NEAR_W: f32 = 1e-4;

#[derive(Debug)]
enum Storage {
    Positions(Vec<Point3<f32>>),
    Normals(Vec<Vector3<f32>>),
    Indices(Vec<u32>),
}

#[derive(Debug, Clone, Copy)]
struct VertexArray {
    positions: u32,
    normals: u32,
    indices: u32,
}

#[derive(Debug, Clone, Copy)]
struct Uniforms {
    model: Matrix4<f32>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    selected: bool,
    light_position: Vector3<f32>,
    light_color: Vector3<f32>,
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            selected: false,
            light_position: Vector3::new(5.0, 5.0, 5.0),
            light_color: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Per-corner output of the vertex stage.
#[derive(Debug, Clone, Copy)]
struct Varying {
    screen: ScreenPoint,
    world_position: Vector3<f32>,
    world_normal: Vector3<f32>,
}

pub struct SoftwareDevice {
    framebuffer: Framebuffer,
    buffers: HashMap<u32, Storage>,
    vertex_arrays: HashMap<u32, VertexArray>,
    next_id: u32,
    uniforms: Uniforms,
    polygon_mode: PolygonMode,
}

impl SoftwareDevice {
    pub fn new(width: usize, height: usize) -> Result<Self, GraphicsError> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::Init(format!(
                "viewport {}x{} has no area",
                width, height
            )));
        }

        Ok(Self {
            framebuffer: Framebuffer::new(width, height),
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            next_id: 0,
            uniforms: Uniforms::default(),
            polygon_mode: PolygonMode::Fill,
        })
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.framebuffer.resize(width.max(1), height.max(1));
    }

    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.polygon_mode
    }

    /// Buffers and vertex arrays currently alive.
    pub fn live_resources(&self) -> usize {
        self.buffers.len() + self.vertex_arrays.len()
    }

    fn mint(&mut self) -> Result<u32, GraphicsError> {
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| GraphicsError::OutOfResources("handle space exhausted".into()))?;
        Ok(self.next_id)
    }

    fn positions(&self, id: u32) -> Result<&[Point3<f32>], GraphicsError> {
        match self.buffers.get(&id) {
            Some(Storage::Positions(data)) => Ok(data),
            Some(_) => Err(GraphicsError::InvalidLayout(format!(
                "buffer {} does not hold positions",
                id
            ))),
            None => Err(GraphicsError::UnknownHandle(id)),
        }
    }

    fn normals(&self, id: u32) -> Result<&[Vector3<f32>], GraphicsError> {
        match self.buffers.get(&id) {
            Some(Storage::Normals(data)) => Ok(data),
            Some(_) => Err(GraphicsError::InvalidLayout(format!(
                "buffer {} does not hold normals",
                id
            ))),
            None => Err(GraphicsError::UnknownHandle(id)),
        }
    }

    fn indices(&self, id: u32) -> Result<&[u32], GraphicsError> {
        match self.buffers.get(&id) {
            Some(Storage::Indices(data)) => Ok(data),
            Some(_) => Err(GraphicsError::InvalidLayout(format!(
                "buffer {} does not hold indices",
                id
            ))),
            None => Err(GraphicsError::UnknownHandle(id)),
        }
    }

    fn vertex_stage(
        &self,
        position: &Point3<f32>,
        normal: &Vector3<f32>,
        mvp: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
    ) -> Option<Varying> {
        let clip = mvp * position.to_homogeneous();
        if clip.w < NEAR_W {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        let width = self.framebuffer.width() as f32;
        let height = self.framebuffer.height() as f32;

        Some(Varying {
            screen: ScreenPoint {
                x: (ndc.x + 1.0) * 0.5 * width,
                y: (1.0 - ndc.y) * 0.5 * height,
                depth: ndc.z,
            },
            world_position: self.uniforms.model.transform_point(position).coords,
            world_normal: normal_matrix * normal,
        })
    }
}

impl Uniforms {
    /// Ambient plus diffuse, tinted when the object is selected.
    fn fragment_stage(&self, position: &Vector3<f32>, normal: &Vector3<f32>) -> Fragment {
        let ambient = self.light_color * AMBIENT_STRENGTH;

        let norm = normal.try_normalize(1e-8).unwrap_or_else(Vector3::zeros);
        let light_dir = (self.light_position - position)
            .try_normalize(1e-8)
            .unwrap_or_else(Vector3::zeros);
        let diffuse = self.light_color * norm.dot(&light_dir).max(0.0);

        let tint = if self.selected {
            SELECTED_TINT
        } else {
            DEFAULT_TINT
        };
        shade((ambient + diffuse).component_mul(&tint))
    }

    /// Flat colour for outlines: the lit colour of a surface facing the light.
    fn outline_color(&self) -> [u8; 3] {
        let tint = if self.selected {
            SELECTED_TINT
        } else {
            DEFAULT_TINT
        };
        shade((self.light_color * (1.0 + AMBIENT_STRENGTH)).component_mul(&tint)).rgb
    }
}

fn shade(color: Vector3<f32>) -> Fragment {
    let intensity = color.max().clamp(0.0, 1.0);
    let rgb = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    Fragment {
        character: ramp_character(intensity),
        rgb: [rgb.x, rgb.y, rgb.z],
    }
}

fn interpolate<F>(corners: &[Varying; 3], weights: [f32; 3], attribute: F) -> Vector3<f32>
where
    F: Fn(&Varying) -> Vector3<f32>,
{
    attribute(&corners[0]) * weights[0]
        + attribute(&corners[1]) * weights[1]
        + attribute(&corners[2]) * weights[2]
}

/// Inverse transpose of the model's upper 3x3, for transforming normals.
fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}

impl GraphicsContext for SoftwareDevice {
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferId, GraphicsError> {
        let id = self.mint()?;
        let storage = match data {
            BufferData::Positions(data) => Storage::Positions(data.to_vec()),
            BufferData::Normals(data) => Storage::Normals(data.to_vec()),
            BufferData::Indices(data) => Storage::Indices(data.to_vec()),
        };
        trace!("create buffer {} ({} elements)", id, data.len());
        self.buffers.insert(id, storage);
        Ok(BufferId::from_raw(id))
    }

    fn create_vertex_array(
        &mut self,
        attributes: &[VertexAttribute<'_>],
        indices: &BufferId,
    ) -> Result<VertexArrayId, GraphicsError> {
        let find = |location: u32| {
            attributes
                .iter()
                .find(|attribute| attribute.location == location)
                .map(|attribute| attribute.buffer.raw())
                .ok_or_else(|| {
                    GraphicsError::InvalidLayout(format!("attribute {} is not bound", location))
                })
        };

        let layout = VertexArray {
            positions: find(POSITION_ATTRIBUTE)?,
            normals: find(NORMAL_ATTRIBUTE)?,
            indices: indices.raw(),
        };
        self.positions(layout.positions)?;
        self.normals(layout.normals)?;
        self.indices(layout.indices)?;

        let id = self.mint()?;
        self.vertex_arrays.insert(id, layout);
        Ok(VertexArrayId::from_raw(id))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer.raw());
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array.raw());
    }

    fn set_uniform(&mut self, uniform: Uniform) {
        match uniform {
            Uniform::Model(m) => self.uniforms.model = m,
            Uniform::View(m) => self.uniforms.view = m,
            Uniform::Projection(m) => self.uniforms.projection = m,
            Uniform::Selected(selected) => self.uniforms.selected = selected,
            Uniform::LightPosition(position) => self.uniforms.light_position = position,
            Uniform::LightColor(color) => self.uniforms.light_color = color,
        }
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.polygon_mode = mode;
    }

    fn draw_indexed(
        &mut self,
        vertex_array: &VertexArrayId,
        count: u32,
    ) -> Result<(), GraphicsError> {
        let layout = *self
            .vertex_arrays
            .get(&vertex_array.raw())
            .ok_or(GraphicsError::UnknownHandle(vertex_array.raw()))?;

        let mvp = self.uniforms.projection * self.uniforms.view * self.uniforms.model;
        let normal_transform = normal_matrix(&self.uniforms.model);

        // Run the vertex stage up front so the buffers are not borrowed
        // while the framebuffer is written.
        let triangles: Vec<[Varying; 3]> = {
            let positions = self.positions(layout.positions)?;
            let normals = self.normals(layout.normals)?;
            let indices = self.indices(layout.indices)?;
            let count = (count as usize).min(indices.len());

            let mut triangles = Vec::with_capacity(count / 3);
            for face in indices[..count].chunks_exact(3) {
                let mut corners = Vec::with_capacity(3);
                for &index in face {
                    let index = index as usize;
                    let (Some(position), Some(normal)) = (positions.get(index), normals.get(index))
                    else {
                        return Err(GraphicsError::InvalidLayout(format!(
                            "index {} past the end of the vertex buffers",
                            index
                        )));
                    };
                    match self.vertex_stage(position, normal, &mvp, &normal_transform) {
                        Some(varying) => corners.push(varying),
                        None => break,
                    }
                }
                if let [a, b, c] = corners[..] {
                    triangles.push([a, b, c]);
                }
            }
            triangles
        };

        trace!("draw {} triangles ({:?})", triangles.len(), self.polygon_mode);
        let uniforms = self.uniforms;
        match self.polygon_mode {
            PolygonMode::Fill => {
                for corners in &triangles {
                    self.framebuffer
                        .fill_triangle(corners.map(|corner| corner.screen), |weights| {
                            let position = interpolate(corners, weights, |c| c.world_position);
                            let normal = interpolate(corners, weights, |c| c.world_normal);
                            uniforms.fragment_stage(&position, &normal)
                        });
                }
            }
            PolygonMode::Line => {
                let rgb = uniforms.outline_color();
                for [a, b, c] in &triangles {
                    self.framebuffer.draw_line(a.screen, b.screen, rgb);
                    self.framebuffer.draw_line(b.screen, c.screen, rgb);
                    self.framebuffer.draw_line(c.screen, a.screen, rgb);
                }
            }
        }

        Ok(())
    }
}
