//! Real-time rendering demos on wgpu
//!
//! Five small applications share one window/GPU/GUI runtime ([`app`]): two
//! triangle demos, a forward renderer, a deferred renderer with shadow
//! mapping and compute gamma correction, and a glTF viewer.

pub mod app;
pub mod apps;
pub mod config;
pub mod error;
pub mod gfx;
pub mod ui;
pub mod wgpu_utils;

pub use app::{run, AppContext, Application};
pub use error::{GlintError, Result};
