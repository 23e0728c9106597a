use crate::error::{EngineError, EngineResult};
use crate::logger;
use sdl2::{EventPump, Sdl, VideoSubsystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    Undefined,
    Centered,
}

#[derive(Debug, Clone)]
pub struct WindowParams {
    pub title: String,
    pub position: WindowPosition,
    pub width: u32,
    pub height: u32,
    pub vulkan: bool,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            title: String::from("new window"),
            position: WindowPosition::Undefined,
            width: 200,
            height: 200,
            vulkan: false,
        }
    }
}

// field order matters: the SDL window goes before the subsystems it came from
pub struct Window {
    pub window: sdl2::video::Window,
    pub video: VideoSubsystem,
    pub sdl: Sdl,
}

impl Window {
    pub fn event_pump(&self) -> EngineResult<EventPump> {
        self.sdl.event_pump().map_err(EngineError::Sdl)
    }
}

pub fn create_window(params: &WindowParams) -> EngineResult<Window> {
    let sdl = sdl2::init().map_err(|e| {
        log::error!(target: logger::GENERAL, "could not initialize SDL: {e}");
        EngineError::Sdl(e)
    })?;
    let video = sdl.video().map_err(|e| {
        log::error!(target: logger::GENERAL, "could not initialize SDL video: {e}");
        EngineError::Sdl(e)
    })?;

    let mut builder = video.window(&params.title, params.width, params.height);
    match params.position {
        WindowPosition::Undefined => {}
        WindowPosition::Centered => {
            builder.position_centered();
        }
    }
    if params.vulkan {
        builder.vulkan();
    }
    let window = builder.build().map_err(|e| {
        log::error!(target: logger::GENERAL, "could not create window: {e}");
        EngineError::from(e)
    })?;

    Ok(Window { window, video, sdl })
}

pub fn window_dimensions(window: &Window) -> (u32, u32) {
    window.window.size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let params = WindowParams::default();
        assert_eq!(params.title, "new window");
        assert_eq!(params.position, WindowPosition::Undefined);
        assert_eq!((params.width, params.height), (200, 200));
        assert!(!params.vulkan);
    }

    #[test]
    fn override_keeps_rest() {
        let params = WindowParams {
            vulkan: true,
            ..Default::default()
        };
        assert!(params.vulkan);
        assert_eq!(params.width, 200);
    }
}
