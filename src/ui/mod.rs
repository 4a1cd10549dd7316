//! # User Interface
//!
//! Dear ImGui overlay shared by every demo. Each application builds its own
//! widgets through [`Application::build_ui`](crate::app::Application::build_ui);
//! [`UiManager`] owns the context and draws the result.

pub mod manager;

pub use manager::UiManager;
