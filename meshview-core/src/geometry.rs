/// De-indexed, GPU-ready mesh data
use nalgebra::{Point3, Vector3};

/// Normal used for face corners that carry no usable normal index.
pub const DEFAULT_NORMAL: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// A flat triangle list: every face corner owns its own vertex and normal,
/// and `indices` is the sequence `0..N`.
///
/// `vertices`, `normals` and `indices` always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(corners: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(corners),
            normals: Vec::with_capacity(corners),
            indices: Vec::with_capacity(corners),
        }
    }

    /// Append one face corner, assigning it the next sequential index.
    pub fn push_corner(&mut self, position: Point3<f32>, normal: Vector3<f32>) {
        let index = self.indices.len() as u32;
        self.vertices.push(position);
        self.normals.push(normal);
        self.indices.push(index);
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_corner_keeps_streams_parallel() {
        let mut mesh = Mesh::new();
        mesh.push_corner(Point3::new(0.0, 0.0, 0.0), DEFAULT_NORMAL);
        mesh.push_corner(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        mesh.push_corner(Point3::new(0.0, 1.0, 0.0), DEFAULT_NORMAL);

        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.normals().len(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.is_empty());
    }
}
