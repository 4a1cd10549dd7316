//! Core rendering functionality
//!
//! Device and surface ownership, pipeline creation, render target sets and
//! the deferred renderer's frame plan.

pub mod frame_plan;
pub mod framebuffer;
pub mod gbuffer;
pub mod pipeline_manager;
pub mod render_engine;
pub mod shader_library;

pub use frame_plan::{plan_frame, ColorTarget, DeferredSettings, Pass, ShadowMapState};
pub use framebuffer::{Framebuffer, FramebufferStatus};
pub use gbuffer::{GBuffer, GBufferTextureType};
pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, VertexLayout};
pub use render_engine::RenderEngine;
pub use shader_library::ShaderLibrary;
