mod error;
mod logger;
mod vk_bootstrap;
mod vk_debug;
mod vk_engine;
mod vk_init;
mod vk_pipelines;
mod vk_types;
mod window;
#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use vk_engine::VulkanEngine;
use window::{WindowParams, WindowPosition};

fn window_params() -> WindowParams {
    WindowParams {
        title: String::from(vk_engine::WINDOW_TITLE),
        position: WindowPosition::Centered,
        width: vk_engine::WINDOW_WIDTH,
        height: vk_engine::WINDOW_HEIGHT,
        vulkan: true,
    }
}

fn main() -> Result<()> {
    logger::init();
    log::info!(target: logger::GENERAL, "starting tutorial...");

    let window = window::create_window(&window_params()).context("failed to open the main window")?;
    let mut engine = VulkanEngine::init(window)?;
    engine.run();
    //vulkan teardown lives in the engine's drop
    drop(engine);

    log::info!(target: logger::GENERAL, "closing application");
    Ok(())
}
