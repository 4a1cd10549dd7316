//! Light sources and their GPU representation
//!
//! Lights are edited on the CPU by GUI widgets and packed into a
//! [`LightingUniform`] once per frame, transformed to view space.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

use super::camera::camera_utils::{convert_matrix4_to_array, transform_direction, OPENGL_TO_WGPU_MATRIX};

/// Number of point light slots in every lighting uniform.
pub const MAX_POINT_LIGHTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels, world space.
    pub direction: Vector3<f32>,
    pub intensity: [f32; 3],
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vector3::new(-1.0, -1.0, -1.0).normalize(),
            intensity: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: [f32; 3],
    pub intensity: [f32; 3],
    pub range: f32,
    pub attenuation: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            intensity: [1.0; 3],
            range: 10.0,
            attenuation: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("all {capacity} point light slots are in use")]
pub struct PointLightCapacityError {
    pub capacity: usize,
}

/// Fixed pool of point lights with an explicit active count.
///
/// Inactive slots keep their values so that raising the count brings back
/// previously configured lights.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLights {
    slots: [PointLight; MAX_POINT_LIGHTS],
    count: usize,
}

impl Default for PointLights {
    fn default() -> Self {
        Self::new()
    }
}

impl PointLights {
    pub fn new() -> Self {
        Self {
            slots: [PointLight::default(); MAX_POINT_LIGHTS],
            count: 0,
        }
    }

    pub fn from_slots(slots: [PointLight; MAX_POINT_LIGHTS], count: usize) -> Self {
        Self {
            slots,
            count: count.min(MAX_POINT_LIGHTS),
        }
    }

    pub fn push(&mut self, light: PointLight) -> Result<(), PointLightCapacityError> {
        if self.count == MAX_POINT_LIGHTS {
            return Err(PointLightCapacityError {
                capacity: MAX_POINT_LIGHTS,
            });
        }
        self.slots[self.count] = light;
        self.count += 1;
        Ok(())
    }

    /// Clamps to the slot count and returns the value actually applied.
    pub fn set_active_count(&mut self, count: usize) -> usize {
        self.count = count.min(MAX_POINT_LIGHTS);
        self.count
    }

    pub fn active(&self) -> &[PointLight] {
        &self.slots[..self.count]
    }

    pub fn active_mut(&mut self) -> &mut [PointLight] {
        &mut self.slots[..self.count]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub const fn capacity(&self) -> usize {
        MAX_POINT_LIGHTS
    }
}

/// Anything that can fill a [`LightingUniform`].
pub trait LightSource {
    fn directional(&self) -> &DirectionalLight;
    fn point_lights(&self) -> &[PointLight];
}

/// Directional light plus point lights, as edited by the GUI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightingState {
    pub directional: DirectionalLight,
    pub points: PointLights,
}

impl LightSource for LightingState {
    fn directional(&self) -> &DirectionalLight {
        &self.directional
    }

    fn point_lights(&self) -> &[PointLight] {
        self.points.active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub bias: f32,
    pub sample_count: u32,
    pub spread: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            bias: 0.05,
            sample_count: 16,
            spread: 0.0005,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    /// xyz: view-space position, w: range
    pub position_range: [f32; 4],
    /// rgb: intensity, a: attenuation factor
    pub intensity_attenuation: [f32; 4],
}

/// Must match `Lighting` in the forward and shading WGSL files.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    /// View-space direction pointing toward the light.
    pub dir_light_direction: [f32; 4],
    pub dir_light_intensity: [f32; 4],
    /// Maps view-space positions to shadow map clip space.
    pub dir_light_view_proj: [[f32; 4]; 4],
    pub shadow_bias: f32,
    pub shadow_spread: f32,
    pub shadow_sample_count: u32,
    pub point_light_count: u32,
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
}

impl LightingUniform {
    pub fn new(lights: &impl LightSource, view: Matrix4<f32>) -> Self {
        let directional = lights.directional();
        let to_light = transform_direction(view, -directional.direction);

        let mut point_lights = [PointLightUniform::default(); MAX_POINT_LIGHTS];
        let active = lights.point_lights();
        for (slot, light) in point_lights.iter_mut().zip(active) {
            let [x, y, z] = light.position;
            let view_position = view * Vector4::new(x, y, z, 1.0);
            let [r, g, b] = light.intensity;
            *slot = PointLightUniform {
                position_range: [view_position.x, view_position.y, view_position.z, light.range],
                intensity_attenuation: [r, g, b, light.attenuation],
            };
        }

        let [r, g, b] = directional.intensity;
        Self {
            dir_light_direction: [to_light.x, to_light.y, to_light.z, 0.0],
            dir_light_intensity: [r, g, b, 0.0],
            dir_light_view_proj: convert_matrix4_to_array(Matrix4::identity()),
            shadow_bias: 0.0,
            shadow_spread: 0.0,
            shadow_sample_count: 0,
            point_light_count: active.len().min(MAX_POINT_LIGHTS) as u32,
            point_lights,
        }
    }

    pub fn with_shadow(mut self, view_space_to_light: Matrix4<f32>, settings: ShadowSettings) -> Self {
        self.dir_light_view_proj = convert_matrix4_to_array(view_space_to_light);
        self.shadow_bias = settings.bias;
        self.shadow_spread = settings.spread;
        self.shadow_sample_count = settings.sample_count.max(1);
        self
    }
}

/// Unit vector from the scene toward the light for the given angles,
/// `(cos φ sin θ, sin φ sin θ, cos θ)`.
pub fn direction_from_angles(phi: Deg<f32>, theta: Deg<f32>) -> Vector3<f32> {
    let (sin_phi, cos_phi) = cgmath::Rad::from(phi).0.sin_cos();
    let (sin_theta, cos_theta) = cgmath::Rad::from(theta).0.sin_cos();
    Vector3::new(cos_phi * sin_theta, sin_phi * sin_theta, cos_theta)
}

/// Same angles with Y as the polar axis, `(sin φ sin θ, cos θ, cos φ sin θ)`.
pub fn direction_from_angles_y_up(phi: Deg<f32>, theta: Deg<f32>) -> Vector3<f32> {
    let (sin_phi, cos_phi) = cgmath::Rad::from(phi).0.sin_cos();
    let (sin_theta, cos_theta) = cgmath::Rad::from(theta).0.sin_cos();
    Vector3::new(sin_phi * sin_theta, cos_theta, cos_phi * sin_theta)
}

/// Up vector of the shadow-casting light's view.
pub fn light_up_vector(phi: Deg<f32>, theta: Deg<f32>) -> Vector3<f32> {
    let (sin_phi, cos_phi) = cgmath::Rad::from(phi).0.sin_cos();
    let (sin_theta, cos_theta) = cgmath::Rad::from(theta).0.sin_cos();
    -Vector3::new(sin_phi * cos_theta, -sin_theta, cos_phi * cos_theta).normalize()
}

/// View and projection of a directional light covering a bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightCamera {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl LightCamera {
    /// Orthographic light camera placed `radius` away from `center` along `to_light`.
    pub fn fit_sphere(center: Point3<f32>, radius: f32, to_light: Vector3<f32>, up: Vector3<f32>) -> Self {
        let eye = center + to_light * radius;
        let view = Matrix4::look_at_rh(eye, center, up);
        let projection = OPENGL_TO_WGPU_MATRIX
            * cgmath::ortho(-radius, radius, -radius, radius, 0.01 * radius, 2.0 * radius);
        Self { view, projection }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

/// Center of an axis-aligned box.
pub fn box_center(min: [f32; 3], max: [f32; 3]) -> Point3<f32> {
    Point3::from_vec((Vector3::from(min) + Vector3::from(max)) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Transform;

    #[test]
    fn angle_directions_are_unit_length() {
        for phi in (0..360).step_by(5) {
            for theta in (0..360).step_by(5) {
                let (phi, theta) = (Deg(phi as f32), Deg(theta as f32));
                assert!((direction_from_angles(phi, theta).magnitude() - 1.0).abs() < 1e-5);
                assert!((direction_from_angles_y_up(phi, theta).magnitude() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn default_angles_point_upward() {
        let dir = direction_from_angles(Deg(260.0), Deg(260.0));
        assert!(dir.y > 0.9);
        let up = light_up_vector(Deg(260.0), Deg(260.0));
        assert!(dir.cross(up).magnitude() > 0.1, "up must not be parallel to the light");
    }

    #[test]
    fn light_camera_looks_at_the_sphere_center() {
        let center = Point3::new(1.0, 2.0, 3.0);
        let radius = 5.0;
        let to_light = direction_from_angles(Deg(260.0), Deg(260.0));
        let camera = LightCamera::fit_sphere(center, radius, to_light, light_up_vector(Deg(260.0), Deg(260.0)));

        let in_view = camera.view.transform_point(center);
        assert!(in_view.x.abs() < 1e-4 && in_view.y.abs() < 1e-4);
        assert!((in_view.z + radius).abs() < 1e-4);

        let clip = camera.view_projection().transform_point(center);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn point_lights_are_bounded() {
        let mut lights = PointLights::new();
        for _ in 0..MAX_POINT_LIGHTS {
            lights.push(PointLight::default()).unwrap();
        }
        assert_eq!(
            lights.push(PointLight::default()),
            Err(PointLightCapacityError { capacity: MAX_POINT_LIGHTS })
        );
        assert_eq!(lights.set_active_count(2), 2);
        assert_eq!(lights.active().len(), 2);
        assert_eq!(lights.set_active_count(100), MAX_POINT_LIGHTS);
    }

    #[test]
    fn uniform_only_packs_active_lights_in_view_space() {
        let mut state = LightingState::default();
        state
            .points
            .push(PointLight {
                position: [1.0, 0.0, 0.0],
                ..PointLight::default()
            })
            .unwrap();
        let view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -4.0));

        let uniform = LightingUniform::new(&state, view);
        assert_eq!(uniform.point_light_count, 1);
        assert_eq!(uniform.point_lights[0].position_range, [1.0, 0.0, -4.0, 10.0]);
        assert_eq!(uniform.point_lights[1].position_range, [0.0; 4]);

        let toward = Vector3::new(
            uniform.dir_light_direction[0],
            uniform.dir_light_direction[1],
            uniform.dir_light_direction[2],
        );
        assert!((toward + state.directional.direction).magnitude() < 1e-5);
        assert_eq!(Matrix4::<f32>::from(uniform.dir_light_view_proj), Matrix4::identity());
    }
}
