use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("SDL error: {0}")]
    Sdl(String),
    #[error("could not create window: {0}")]
    Window(#[from] sdl2::video::WindowBuildError),
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),
    #[error("failed to load shader {}: {source}", .path.display())]
    Shader {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to find a suitable GPU")]
    NoSuitableDevice,
    #[error("surface reports no formats")]
    NoSurfaceFormat,
}
