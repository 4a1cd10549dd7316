//! First-person fly camera driven by keyboard and mouse
//!
//! WASD moves in the view plane, Q/E move down/up along world Y, dragging
//! with the left mouse button turns the camera. Movement is integrated in
//! [`ViewController::update`] using the elapsed frame time.

use cgmath::{
    Deg, InnerSpace, Matrix3, Matrix4, Quaternion, Rad, Rotation3, SquareMatrix,
    Vector3, Zero,
};
use winit::{
    event::{ElementState, KeyEvent, MouseButton},
    keyboard::{KeyCode, PhysicalKey},
};

use super::camera_utils::OPENGL_TO_WGPU_MATRIX;

#[derive(Debug, Default, Clone, Copy)]
struct MovementState {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

pub struct ViewController {
    position: Vector3<f32>,
    orientation: Quaternion<f32>,
    speed: f32,
    /// Radians per pixel of mouse motion.
    pub rotation_speed: f32,
    pub fovy: Deg<f32>,
    pub near: f32,
    pub far: f32,
    aspect: f32,
    movement: MovementState,
    is_rotating: bool,
    pending_rotation: (f32, f32),
}

impl ViewController {
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vector3::zero(),
            orientation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            speed: 1.0,
            rotation_speed: 0.005,
            fovy: Deg(70.0),
            near: 0.01,
            far: 100.0,
            aspect,
            movement: MovementState::default(),
            is_rotating: false,
            pending_rotation: (0.0, 0.0),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Places the camera so that its view matrix equals `view`.
    pub fn set_view_matrix(&mut self, view: Matrix4<f32>) {
        let Some(rcp_view) = view.invert() else {
            log::warn!("Ignoring singular view matrix");
            return;
        };
        let rotation = Matrix3::from_cols(
            rcp_view.x.truncate().normalize(),
            rcp_view.y.truncate().normalize(),
            rcp_view.z.truncate().normalize(),
        );
        self.orientation = Quaternion::from(rotation).normalize();
        self.position = rcp_view.w.truncate();
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::from(self.orientation.conjugate()) * Matrix4::from_translation(-self.position)
    }

    /// Camera-to-world transform.
    pub fn rcp_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from(self.orientation)
    }

    /// Perspective projection in wgpu clip space.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.near, self.far)
    }

    /// Returns `true` when the key is one the camera reacts to.
    pub fn process_keyboard(&mut self, event: &KeyEvent) -> bool {
        let PhysicalKey::Code(key) = event.physical_key else {
            return false;
        };
        let pressed = event.state == ElementState::Pressed;
        let flag = match key {
            KeyCode::KeyW | KeyCode::ArrowUp => &mut self.movement.forward,
            KeyCode::KeyS | KeyCode::ArrowDown => &mut self.movement.backward,
            KeyCode::KeyA | KeyCode::ArrowLeft => &mut self.movement.left,
            KeyCode::KeyD | KeyCode::ArrowRight => &mut self.movement.right,
            KeyCode::KeyE | KeyCode::PageUp => &mut self.movement.up,
            KeyCode::KeyQ | KeyCode::PageDown => &mut self.movement.down,
            _ => return false,
        };
        *flag = pressed;
        true
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_rotating = state == ElementState::Pressed;
        }
    }

    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.is_rotating {
            self.pending_rotation.0 += delta.0 as f32;
            self.pending_rotation.1 += delta.1 as f32;
        }
    }

    /// Drops held keys and buttons, e.g. when the GUI takes focus.
    pub fn reset_input(&mut self) {
        self.movement = MovementState::default();
        self.is_rotating = false;
        self.pending_rotation = (0.0, 0.0);
    }

    /// Integrates movement over `elapsed` seconds. Returns whether the view changed.
    pub fn update(&mut self, elapsed: f32) -> bool {
        let (dx, dy) = std::mem::take(&mut self.pending_rotation);
        let mut changed = false;

        if dx != 0.0 || dy != 0.0 {
            let yaw = Quaternion::from_angle_y(Rad(-dx * self.rotation_speed));
            let pitch = Quaternion::from_angle_x(Rad(-dy * self.rotation_speed));
            self.orientation = (yaw * self.orientation * pitch).normalize();
            changed = true;
        }

        let axis = |positive: bool, negative: bool| -> f32 {
            (positive as i32 - negative as i32) as f32
        };
        let local = Vector3::new(
            axis(self.movement.right, self.movement.left),
            0.0,
            axis(self.movement.backward, self.movement.forward),
        );
        let vertical = axis(self.movement.up, self.movement.down);

        let step = self.speed * elapsed;
        if local != Vector3::zero() || vertical != 0.0 {
            self.position += self.orientation * local * step;
            self.position.y += vertical * step;
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    fn assert_matrix_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        for col in 0..4 {
            for row in 0..4 {
                assert!(
                    (a[col][row] - b[col][row]).abs() < 1e-4,
                    "mismatch at [{col}][{row}]: {a:?} vs {b:?}"
                );
            }
        }
    }

    fn press(controller: &mut ViewController, key: KeyCode) {
        controller.movement = MovementState::default();
        match key {
            KeyCode::KeyW => controller.movement.forward = true,
            KeyCode::KeyD => controller.movement.right = true,
            KeyCode::KeyE => controller.movement.up = true,
            _ => unreachable!(),
        }
    }

    #[test]
    fn view_matrix_round_trips() {
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, -3.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let mut controller = ViewController::new(16.0 / 9.0);
        controller.set_view_matrix(view);

        assert_matrix_eq(controller.view_matrix(), view);
        assert_matrix_eq(
            controller.view_matrix() * controller.rcp_view_matrix(),
            Matrix4::identity(),
        );
        assert!((controller.position() - Vector3::new(0.0, 0.0, -3.0)).magnitude() < 1e-5);
    }

    #[test]
    fn forward_moves_along_the_view_direction() {
        let mut controller = ViewController::new(1.0).with_speed(2.0);
        press(&mut controller, KeyCode::KeyW);

        assert!(controller.update(0.5));
        assert!((controller.position() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn strafing_follows_the_camera_orientation() {
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let mut controller = ViewController::new(1.0).with_speed(1.0);
        controller.set_view_matrix(view);
        press(&mut controller, KeyCode::KeyD);
        controller.update(1.0);

        // looking down +X, right is +Z
        assert!((controller.position() - Vector3::new(0.0, 0.0, 1.0)).magnitude() < 1e-5);

        press(&mut controller, KeyCode::KeyE);
        controller.update(1.0);
        assert!((controller.position().y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn mouse_motion_only_rotates_while_dragging() {
        let mut controller = ViewController::new(1.0);
        controller.process_mouse_motion((50.0, 0.0));
        assert!(!controller.update(0.016));

        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_mouse_motion((50.0, 10.0));
        assert!(controller.update(0.016));

        controller.process_mouse_button(MouseButton::Left, ElementState::Released);
        controller.process_mouse_motion((50.0, 0.0));
        assert!(!controller.update(0.016));
    }

    #[test]
    fn idle_controller_reports_no_change() {
        let mut controller = ViewController::new(1.0).with_speed(10.0);
        assert!(!controller.update(1.0));
        controller.set_speed(-1.0);
        assert_eq!(controller.speed(), 0.0);
    }
}
