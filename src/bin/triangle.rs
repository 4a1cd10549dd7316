use anyhow::Context;
use glint::{apps::TriangleApp, config::AppConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env("Triangle");
    glint::app::run::<TriangleApp>(config).context("triangle failed")
}
