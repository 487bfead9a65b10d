pub mod ballpit;
pub mod config;

pub use app;
pub use log;
pub use nalgebra_glm;
pub use physics;
pub use scene;
pub use winit;

pub use self::{ballpit::Ballpit, config::BallpitConfig};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn run() {
    let config = BallpitConfig::default();
    let window = config.window.clone();
    let result = Ballpit::new(config)
        .map_err(|error| error.to_string())
        .and_then(|ballpit| app::app::run(window, ballpit).map_err(|error| error.to_string()));
    if let Err(error) = result {
        log::error!("Failed to start ballpit: {error}");
    }
}
