use anyhow::Context;
use glint::{apps::Triangle2VbosApp, config::AppConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env("Triangle (2 VBOs)");
    glint::app::run::<Triangle2VbosApp>(config).context("triangle-2vbos failed")
}
