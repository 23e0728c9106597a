mod destructors;
pub mod frame_data;

use crate::error::{EngineError, EngineResult};
use crate::logger;
use crate::vk_bootstrap::device::{PhysicalDeviceSelector, SelectedPhysicalDevice};
use crate::vk_bootstrap::{self, BootstrapInstance, InstanceBuilder, SwapchainBuilder};
use crate::vk_init;
use crate::vk_types::{check_vk, AllocatedSwapchain};
use crate::window::{window_dimensions, Window};
use anyhow::{Context, Result};
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain};
use ash::{vk, Entry};
pub use ash::{Device, Instance};
use frame_data::{FrameData, FRAME_OVERLAP};
use sdl2::event::{Event, WindowEvent};
use sdl2::EventPump;
use std::slice;

pub const WINDOW_TITLE: &str = "Vulkan Engine";
pub const WINDOW_WIDTH: u32 = 1700;
pub const WINDOW_HEIGHT: u32 = 900;
const APP_NAME: &str = "Example Vulkan Application";
//one second, in nanoseconds
const FRAME_TIMEOUT_NS: u64 = 1_000_000_000;

pub struct VulkanEngine {
    pub frame_number: u64,
    pub stop_rendering: bool,
    pub resize_requested: bool,
    pub entry: Entry,
    pub instance: Instance,
    pub debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
    pub surface_loader: Surface,
    pub surface: vk::SurfaceKHR,
    pub physical_device: vk::PhysicalDevice,
    pub device: Device,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub swapchain_loader: Swapchain,
    pub swapchain: AllocatedSwapchain,
    pub render_pass: vk::RenderPass,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub frames: [FrameData; FRAME_OVERLAP],
    pub triangle_pipeline: Option<(vk::Pipeline, vk::PipelineLayout)>,
    //window event pump
    pub event_pump: EventPump,
    //dropped after everything above has been destroyed
    pub window: Window,
}

fn instance_builder() -> InstanceBuilder {
    let builder = InstanceBuilder::default()
        .app_name(APP_NAME)
        .require_api_version(1, 1, 0);
    cfg_if::cfg_if! {
        if #[cfg(debug_assertions)] {
            builder.request_validation_layers(true).use_default_debug_messenger()
        } else {
            builder
        }
    }
}

/// Clear color for a frame: black with a blue channel that pulses over ~750 frames.
pub fn clear_color(frame_number: u64) -> vk::ClearValue {
    let flash = (frame_number as f32 / 120f32).sin().abs();
    vk::ClearValue {
        color: vk::ClearColorValue {
            float32: [0f32, 0f32, flash, 1f32],
        },
    }
}

pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0f32,
        y: 0f32,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0f32,
        max_depth: 1f32,
    }
}

// surface, physical device and logical device; the surface is destroyed again if a later step fails
fn init_device(
    window: &Window,
    instance: &Instance,
    surface_loader: &Surface,
) -> Result<(vk::SurfaceKHR, SelectedPhysicalDevice, Device, vk::Queue)> {
    let surface = vk_bootstrap::create_surface(&window.window, instance)?;

    let device = PhysicalDeviceSelector::new(instance, surface_loader)
        .set_minimum_version(1, 1)
        .set_surface(surface)
        .select()
        .context("failed to select a physical device")
        .and_then(|selected| {
            log::info!(target: logger::RENDER, "using GPU {}", selected.name());
            let (device, graphics_queue) = vk_bootstrap::create_device(instance, &selected)?;
            Ok((selected, device, graphics_queue))
        });

    match device {
        Ok((selected, device, graphics_queue)) => Ok((surface, selected, device, graphics_queue)),
        Err(e) => {
            unsafe { surface_loader.destroy_surface(surface, None) };
            Err(e)
        }
    }
}

fn destroy_instance(instance: &Instance, debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>) {
    unsafe {
        if let Some((debug_utils_loader, debug_messenger)) = debug {
            debug_utils_loader.destroy_debug_utils_messenger(debug_messenger, None);
        }
        instance.destroy_instance(None);
    }
}

// Main loop functions
impl VulkanEngine {
    pub fn init(window: Window) -> Result<Self> {
        let event_pump = window.event_pump()?;

        //Vulkan initialization
        let entry = Entry::linked();
        let BootstrapInstance { instance, debug } = instance_builder()
            .build(&entry, &window.window)
            .context("failed to create the Vulkan instance")?;

        //Surface and device initialization
        let surface_loader = Surface::new(&entry, &instance);
        let (surface, selected, device, graphics_queue) =
            match init_device(&window, &instance, &surface_loader) {
                Ok(created) => created,
                Err(e) => {
                    destroy_instance(&instance, debug);
                    return Err(e);
                }
            };
        log::info!(target: logger::RENDER, "vulkan instance created successfully");

        let swapchain_loader = Swapchain::new(&instance, &device);

        //from here on Drop owns cleanup; handles not created yet are null
        let mut engine = VulkanEngine {
            frame_number: 0,
            stop_rendering: false,
            resize_requested: false,
            entry,
            instance,
            debug,
            surface_loader,
            surface,
            physical_device: selected.physical_device,
            device,
            graphics_queue,
            graphics_queue_family: selected.queue_family_index,
            swapchain_loader,
            swapchain: AllocatedSwapchain::default(),
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            frames: Default::default(),
            triangle_pipeline: None,
            event_pump,
            window,
        };
        engine.init_swapchain_objects()?;
        Ok(engine)
    }

    fn init_swapchain_objects(&mut self) -> Result<()> {
        let (width, height) = window_dimensions(&self.window);
        self.swapchain = SwapchainBuilder::new(
            &self.device,
            &self.swapchain_loader,
            self.physical_device,
            &self.surface_loader,
            self.surface,
        )
        .set_desired_present_mode(vk::PresentModeKHR::FIFO)
        .set_desired_extent(width, height)
        .build()
        .context("failed to create the swapchain")?;

        self.render_pass =
            vk_bootstrap::init_render_pass(&self.device, self.swapchain.format.format)?;
        self.framebuffers =
            vk_bootstrap::init_framebuffers(&self.device, self.render_pass, &self.swapchain)?;
        vk_bootstrap::init_frames(&self.device, self.graphics_queue_family, &mut self.frames)?;
        self.triangle_pipeline = self.load_triangle_pipeline();
        Ok(())
    }

    //without shaders we still clear and present
    fn load_triangle_pipeline(&self) -> Option<(vk::Pipeline, vk::PipelineLayout)> {
        match vk_bootstrap::init_triangle_pipeline(&self.device, self.render_pass) {
            Ok(pipeline) => Some(pipeline),
            Err(e) => {
                log::error!(
                    target: logger::RENDER,
                    "triangle pipeline unavailable, clearing only: {e}"
                );
                None
            }
        }
    }

    pub fn run(&mut self) {
        let mut b_quit = false;
        // main loop
        while !b_quit {
            // Handle events on queue
            for event in self.event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => {
                        b_quit = true;
                    }
                    Event::Window { win_event, .. } => {
                        match win_event {
                            WindowEvent::Minimized => self.stop_rendering = true,
                            WindowEvent::Restored => self.stop_rendering = false,
                            WindowEvent::Resized(..) | WindowEvent::SizeChanged(..) => {
                                self.resize_requested = true
                            }
                            _ => {}
                        };
                    }
                    _ => {}
                };
            }
            //do not draw if we are minimized
            if self.stop_rendering {
                std::thread::sleep(std::time::Duration::from_millis(10));
                continue;
            }
            if self.resize_requested {
                if let Err(e) = self.resize_swapchain() {
                    log::error!(target: logger::RENDER, "failed to rebuild the swapchain: {e}");
                    break;
                }
            }
            if let Err(e) = self.draw() {
                log::error!(
                    target: logger::RENDER,
                    "failed to draw frame {}: {e}",
                    self.frame_number
                );
                break;
            }
        }
    }

    pub fn draw(&mut self) -> EngineResult<()> {
        let frame = *self.get_current_frame();

        //wait until the gpu has finished rendering the last frame using this slot
        match unsafe {
            self.device
                .wait_for_fences(slice::from_ref(&frame.render_fence), true, FRAME_TIMEOUT_NS)
        } {
            Ok(()) => {}
            Err(vk::Result::TIMEOUT) => {
                log::warn!(
                    target: logger::RENDER,
                    "timed out waiting for frame {}",
                    self.frame_number
                );
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        //request image from the swapchain
        let swapchain_image_index = match unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain.swapchain,
                FRAME_TIMEOUT_NS,
                frame.swapchain_semaphore,
                vk::Fence::null(),
            )
        } {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.resize_requested = true;
                return Ok(());
            }
            Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => {
                log::warn!(
                    target: logger::RENDER,
                    "no swapchain image available for frame {}",
                    self.frame_number
                );
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        //only reset once we know work will be submitted
        unsafe { self.device.reset_fences(slice::from_ref(&frame.render_fence))? };

        let cmd = frame.main_command_buffer;
        unsafe {
            self.device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())?
        };
        self.record_frame(cmd, swapchain_image_index)?;

        //wait for the image to be acquired, signal render_semaphore once rendering is done
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let submit = vk_init::submit_info(
            slice::from_ref(&cmd),
            slice::from_ref(&frame.swapchain_semaphore),
            &wait_stages,
            slice::from_ref(&frame.render_semaphore),
        );
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, slice::from_ref(&submit), frame.render_fence)?
        };

        let present_info = vk_init::present_info(
            slice::from_ref(&self.swapchain.swapchain),
            slice::from_ref(&frame.render_semaphore),
            slice::from_ref(&swapchain_image_index),
        );
        match unsafe {
            self.swapchain_loader
                .queue_present(self.graphics_queue, &present_info)
        } {
            Ok(false) => {}
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => self.resize_requested = true,
            Err(e) => return Err(e.into()),
        }

        self.frame_number += 1;
        Ok(())
    }

    fn record_frame(&self, cmd: vk::CommandBuffer, swapchain_image_index: u32) -> EngineResult<()> {
        let framebuffer = *self
            .framebuffers
            .get(swapchain_image_index as usize)
            .ok_or(EngineError::Vulkan(vk::Result::ERROR_OUT_OF_DATE_KHR))?;

        let cmd_begin_info =
            vk_init::command_buffer_begin_info(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.device.begin_command_buffer(cmd, &cmd_begin_info)? };

        let clear_values = [clear_color(self.frame_number)];
        let render_pass_info = vk_init::render_pass_begin_info(
            self.render_pass,
            framebuffer,
            self.swapchain.extent,
            &clear_values,
        );
        unsafe {
            self.device
                .cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE)
        };

        if let Some((pipeline, _)) = self.triangle_pipeline {
            let viewport = full_viewport(self.swapchain.extent);
            let scissor = vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.swapchain.extent,
            };
            unsafe {
                self.device
                    .cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline);
                self.device.cmd_set_viewport(cmd, 0, slice::from_ref(&viewport));
                self.device.cmd_set_scissor(cmd, 0, slice::from_ref(&scissor));
                self.device.cmd_draw(cmd, 3, 1, 0, 0);
            }
        }

        unsafe {
            self.device.cmd_end_render_pass(cmd);
            self.device.end_command_buffer(cmd)?;
        }
        Ok(())
    }

    fn resize_swapchain(&mut self) -> EngineResult<()> {
        unsafe { self.device.device_wait_idle()? };

        let (width, height) = window_dimensions(&self.window);
        if width == 0 || height == 0 {
            //try again once the window has a real size
            return Ok(());
        }

        self.destroy_framebuffers();
        //on failure the old swapchain stays in place and is destroyed by Drop
        let swapchain = SwapchainBuilder::new(
            &self.device,
            &self.swapchain_loader,
            self.physical_device,
            &self.surface_loader,
            self.surface,
        )
        .set_desired_present_mode(vk::PresentModeKHR::FIFO)
        .set_desired_extent(width, height)
        .set_old_swapchain(self.swapchain.swapchain)
        .build()?;
        let old_swapchain = std::mem::replace(&mut self.swapchain, swapchain);
        destructors::destroy_swapchain(&self.device, &self.swapchain_loader, &old_swapchain);

        if old_swapchain.format.format != self.swapchain.format.format {
            log::debug!(target: logger::RENDER, "surface format changed, rebuilding render pass");
            self.destroy_pipeline();
            self.destroy_render_pass();
            self.render_pass =
                vk_bootstrap::init_render_pass(&self.device, self.swapchain.format.format)?;
            self.triangle_pipeline = self.load_triangle_pipeline();
        }

        self.framebuffers =
            vk_bootstrap::init_framebuffers(&self.device, self.render_pass, &self.swapchain)?;
        self.resize_requested = false;
        log::debug!(target: logger::RENDER, "swapchain resized to {}x{}", width, height);
        Ok(())
    }
}

impl Drop for VulkanEngine {
    fn drop(&mut self) {
        check_vk(unsafe { self.device.device_wait_idle() });

        self.destroy_pipeline();
        self.destroy_frame_data();
        self.destroy_framebuffers();
        self.destroy_render_pass();
        self.destroy_swapchain();

        unsafe {
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
        };
        destroy_instance(&self.instance, self.debug.take());
    }
}
