use clap::Parser;
use log::info;

mod app;
mod args;
mod camera;
mod config;
mod editor;
mod err;
mod frame;
mod import;
mod input;
mod light;
mod material;
mod math;
mod mesh;
mod object;
mod renderer;
mod scene;
mod shader;
mod texture;
mod timer;
mod vulkan;

use args::Args;
use config::SceneConfig;
use err::AppError;

fn main() -> Result<(), AppError> {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.scene {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let mut app = app::App::create(&config, &args)?;
    app.import_models(&args.model);

    info!("starting main loop");

    app.run()
}
