pub mod camera_utils;
pub mod view_controller;

// Re-export main types
pub use camera_utils::{ObjectUniform, OPENGL_TO_WGPU_MATRIX};
pub use view_controller::ViewController;
