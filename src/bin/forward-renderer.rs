use anyhow::Context;
use glint::{apps::ForwardRendererApp, config::AppConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env("Forward Renderer");
    glint::app::run::<ForwardRendererApp>(config).context("forward-renderer failed")
}
