use anyhow::Context;
use glint::{apps::DeferredRendererApp, config::AppConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env("Deferred Renderer");
    glint::app::run::<DeferredRendererApp>(config).context("deferred-renderer failed")
}
