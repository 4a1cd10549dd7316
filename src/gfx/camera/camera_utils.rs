use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};

/// Maps OpenGL clip space (z in [-1, 1]) onto wgpu clip space (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Per-draw transforms shared by every mesh program.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct ObjectUniform {
    pub model_view_proj: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    /// Inverse transpose of the model-view matrix, padded to a mat4.
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        let model_view = view * model;
        Self {
            model_view_proj: convert_matrix4_to_array(projection * model_view),
            model_view: convert_matrix4_to_array(model_view),
            normal: convert_matrix4_to_array(normal_matrix(model_view)),
        }
    }
}

impl Default for ObjectUniform {
    fn default() -> Self {
        let identity = convert_matrix4_to_array(Matrix4::identity());
        Self {
            model_view_proj: identity,
            model_view: identity,
            normal: identity,
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

/// Inverse transpose of `model_view`, identity when it is singular.
pub fn normal_matrix(model_view: Matrix4<f32>) -> Matrix4<f32> {
    model_view
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Matrix4::identity)
}

/// Transforms a direction by the rotation part of `view`, keeping unit length.
pub fn transform_direction(view: Matrix4<f32>, direction: Vector3<f32>) -> Vector3<f32> {
    let rotation = Matrix3::from_cols(view.x.truncate(), view.y.truncate(), view.z.truncate());
    let transformed = rotation * direction;
    if transformed.magnitude2() > 0.0 {
        transformed.normalize()
    } else {
        transformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Vector4};

    #[test]
    fn normal_matrix_of_a_rotation_is_the_rotation() {
        let rotation = Matrix4::from_angle_y(Deg(30.0));
        let normal = normal_matrix(rotation);
        for col in 0..4 {
            for row in 0..4 {
                assert!((normal[col][row] - rotation[col][row]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn depth_is_remapped_to_unit_range() {
        let near = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, -1.0, 1.0);
        let far = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert!(near.z.abs() < 1e-6);
        assert!((far.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn directions_ignore_translation() {
        let view = Matrix4::from_translation(Vector3::new(5.0, -2.0, 1.0));
        let dir = transform_direction(view, Vector3::new(0.0, 0.0, -1.0));
        assert!((dir - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);
    }
}
