//! Library error type
//!
//! Every failure the demos can hit is fatal; the variants exist so the
//! binaries can print a precise diagnostic before exiting.

use std::path::PathBuf;

use crate::gfx::rendering::framebuffer::FramebufferStatus;

pub type Result<T, E = GlintError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum GlintError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{name}' not found in {dir} and no built-in copy exists")]
    ShaderNotFound { name: String, dir: PathBuf },

    #[error("Invalid Framebuffer '{label}': {status}")]
    InvalidFramebuffer {
        label: String,
        status: FramebufferStatus,
    },

    #[error("usage: {program} <path/to/model.gltf>")]
    MissingModelPath { program: String },

    #[error("unrecognised primitive mode at {location} in {path}")]
    UnsupportedPrimitiveMode { path: PathBuf, location: String },

    #[error("failed to load OBJ scene {path}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to load glTF model {path}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to decode image {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("GPU validation failed while creating {label}: {message}")]
    Gpu { label: String, message: String },

    #[error("no compatible GPU adapter")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire GPU device")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("window system error")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window")]
    Window(#[from] winit::error::OsError),
}
