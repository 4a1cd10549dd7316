//! # Graphics Module
//!
//! Everything the demos share on the GPU side.
//!
//! - [`rendering`]: device and surface, pipelines, framebuffers, the G-buffer
//!   and the deferred frame plan
//! - [`programs`]: one type per shader program with typed uniform setters
//! - [`scene`] and [`gltf_model`]: OBJ scenes and glTF models
//! - [`camera`] and [`lighting`]: view controller and light uniforms

pub mod camera;
pub mod geometry;
pub mod gltf_model;
pub mod lighting;
pub mod programs;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use rendering::render_engine::RenderEngine;
