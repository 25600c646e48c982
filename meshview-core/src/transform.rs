/// Per-object transform state and model matrix composition
use nalgebra::{Matrix4, Vector3};

/// Smallest scale allowed on any axis.
pub const MIN_SCALE: f32 = 0.1;

/// Position, Euler rotation (degrees) and non-uniform scale of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub position: Vector3<f32>,
    /// Degrees about X, Y and Z, each kept within `(-360, 360)`.
    pub rotation: Vector3<f32>,
    /// Never below [`MIN_SCALE`] on any axis.
    pub scale: Vector3<f32>,
}

impl TransformState {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position += delta;
    }

    /// Add `delta` degrees, then wrap each angle with a floating-point
    /// remainder so it keeps the sign of the accumulated value.
    pub fn rotate(&mut self, delta: Vector3<f32>) {
        self.rotation += delta;
        self.rotation.apply(|angle| *angle %= 360.0);
    }

    /// Add `delta` to the scale, clamping every axis to [`MIN_SCALE`].
    pub fn rescale(&mut self, delta: Vector3<f32>) {
        self.scale += delta;
        self.scale.apply(|factor| *factor = factor.max(MIN_SCALE));
    }

    /// `T · Rx · Ry · Rz · S`, applied to local coordinates.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(&self.position)
            * Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(&self.scale)
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation from Euler angles in degrees, X applied outermost.
    pub fn rotation_matrix(degrees: &Vector3<f32>) -> Matrix4<f32> {
        let rx = Matrix4::from_axis_angle(&Vector3::x_axis(), degrees.x.to_radians());
        let ry = Matrix4::from_axis_angle(&Vector3::y_axis(), degrees.y.to_radians());
        let rz = Matrix4::from_axis_angle(&Vector3::z_axis(), degrees.z.to_radians());

        rx * ry * rz
    }

    pub fn translation_matrix(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    pub fn scale_matrix(factors: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(factors)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
