use log::{error, info};
use normal_map_renderer::error::RenderError;
use normal_map_renderer::io::config::{SceneConfig, usage};
use normal_map_renderer::pipeline::renderer::Renderer;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .filter_module("tobj", log::LevelFilter::Warn)
        .init();

    let config = match SceneConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprint!("{}", usage());
            return ExitCode::FAILURE;
        }
    };

    match Renderer::render(&config) {
        Ok(path) => {
            info!("Wrote {:?}", path);
            ExitCode::SUCCESS
        }
        Err(RenderError::Config(e)) => {
            eprintln!("{}", e);
            eprint!("{}", usage());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Render failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
