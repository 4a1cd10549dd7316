use anyhow::Context;
use glint::{
    apps::GltfViewerApp,
    config::{AppConfig, ViewerArgs, WindowConfig},
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // checked before any window exists
    let args = ViewerArgs::parse(std::env::args_os())?;

    let config = AppConfig::from_env("glTF Viewer")
        .with_window(WindowConfig::new("glTF Viewer").with_srgb(true))
        .with_model_path(&args.model_path);
    glint::app::run::<GltfViewerApp>(config)
        .with_context(|| format!("failed to view {}", args.model_path.display()))
}
