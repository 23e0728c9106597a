pub mod device;
pub mod swapchain;

use crate::error::{EngineError, EngineResult};
use crate::logger;
use crate::vk_debug::vulkan_debug_callback;
use crate::vk_engine::frame_data::{FrameData, FRAME_OVERLAP};
use crate::vk_init;
use crate::vk_pipelines::{self, PipelineBuilder};
use crate::vk_types::AllocatedSwapchain;
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain};
use ash::vk::Handle;
use ash::{vk, Device, Entry, Instance};
use device::SelectedPhysicalDevice;
use sdl2::sys::VkInstance;
use sdl2::video::Window;
use std::ffi::{c_char, CStr, CString};
use std::slice;

const VALIDATION_LAYER: &[u8] = b"VK_LAYER_KHRONOS_validation\0";
const SHADER_ENTRY: &[u8] = b"main\0";
const ENGINE_NAME: &[u8] = b"No Engine\0";
pub const TRIANGLE_VERTEX_SHADER: &str = "shaders/colored_triangle.vert.spv";
pub const TRIANGLE_FRAGMENT_SHADER: &str = "shaders/colored_triangle.frag.spv";

//-----------------------------INSTANCE-------------------------------
pub struct BootstrapInstance {
    pub instance: Instance,
    pub debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

pub struct InstanceBuilder {
    app_name: CString,
    api_version: u32,
    request_validation: bool,
    debug_messenger: bool,
}

impl Default for InstanceBuilder {
    fn default() -> Self {
        InstanceBuilder {
            app_name: CString::default(),
            api_version: vk::API_VERSION_1_0,
            request_validation: false,
            debug_messenger: false,
        }
    }
}

impl InstanceBuilder {
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = CString::new(name.replace('\0', "")).unwrap_or_default();
        self
    }

    pub fn request_validation_layers(mut self, enable: bool) -> Self {
        self.request_validation = enable;
        self
    }

    pub fn require_api_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.api_version = vk::make_api_version(0, major, minor, patch);
        self
    }

    pub fn use_default_debug_messenger(mut self) -> Self {
        self.debug_messenger = true;
        self
    }

    pub fn build(self, entry: &Entry, window: &Window) -> EngineResult<BootstrapInstance> {
        let instance_version = entry
            .try_enumerate_instance_version()?
            .unwrap_or(vk::API_VERSION_1_0);
        if instance_version < self.api_version {
            log::error!(
                target: logger::RENDER,
                "Vulkan {}.{} required, loader only supports {}.{}",
                vk::api_version_major(self.api_version),
                vk::api_version_minor(self.api_version),
                vk::api_version_major(instance_version),
                vk::api_version_minor(instance_version)
            );
            return Err(EngineError::Vulkan(vk::Result::ERROR_INCOMPATIBLE_DRIVER));
        }

        let engine_name = unsafe { CStr::from_bytes_with_nul_unchecked(ENGINE_NAME) };
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&self.app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(engine_name)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(self.api_version);

        let window_extensions: Vec<CString> = window
            .vulkan_instance_extensions()
            .map_err(EngineError::Sdl)?
            .into_iter()
            .filter_map(|name| CString::new(name).ok())
            .collect();
        let mut extension_names: Vec<*const c_char> =
            window_extensions.iter().map(|name| name.as_ptr()).collect();
        let mut debug_messenger = self.debug_messenger;
        if debug_messenger {
            let extensions = entry.enumerate_instance_extension_properties(None)?;
            if device::has_extension(&extensions, DebugUtils::name()) {
                extension_names.push(DebugUtils::name().as_ptr());
            } else {
                log::warn!(
                    target: logger::RENDER,
                    "debug messenger requested but VK_EXT_debug_utils is not available"
                );
                debug_messenger = false;
            }
        }

        let mut layer_names: Vec<*const c_char> = Vec::new();
        if self.request_validation {
            let layers = entry.enumerate_instance_layer_properties()?;
            if layer_available(&layers, validation_layer_name()) {
                layer_names.push(validation_layer_name().as_ptr());
            } else {
                log::warn!(target: logger::RENDER, "validation layers requested but not available");
            }
        }

        let instance_create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);
        let instance = unsafe { entry.create_instance(&instance_create_info, None) }.map_err(|e| {
            log::error!(target: logger::RENDER, "Failed to create Vulkan instance. Error: {e}");
            EngineError::from(e)
        })?;

        let debug = if debug_messenger {
            let debug_utils_loader = DebugUtils::new(entry, &instance);
            match create_debug_messenger(&debug_utils_loader) {
                Ok(messenger) => Some((debug_utils_loader, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(BootstrapInstance { instance, debug })
    }
}

fn validation_layer_name() -> &'static CStr {
    unsafe { CStr::from_bytes_with_nul_unchecked(VALIDATION_LAYER) }
}

fn layer_available(layers: &[vk::LayerProperties], name: &CStr) -> bool {
    layers
        .iter()
        .any(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) } == name)
}

//---------------------------------------DEBUG-----------------------------------------
pub fn create_debug_messenger(debug_utils_loader: &DebugUtils) -> EngineResult<vk::DebugUtilsMessengerEXT> {
    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_callback));

    Ok(unsafe { debug_utils_loader.create_debug_utils_messenger(&debug_info, None)? })
}

//---------------------------------------SURFACE-----------------------------------------
pub fn create_surface(window: &Window, instance: &Instance) -> EngineResult<vk::SurfaceKHR> {
    let instance_handle = instance.handle().as_raw();
    let raw_surface = window
        .vulkan_create_surface(instance_handle as VkInstance)
        .map_err(|e| {
            log::error!(target: logger::RENDER, "Failed to create vulkan surface: {e}");
            EngineError::Sdl(e)
        })?;
    Ok(vk::SurfaceKHR::from_raw(raw_surface))
}

//----------------------------DEVICE------------------------------------
pub fn create_device(instance: &Instance, selected: &SelectedPhysicalDevice) -> EngineResult<(Device, vk::Queue)> {
    let priorities = [1.0];
    let queue_info = [vk::DeviceQueueCreateInfo::builder()
        .queue_family_index(selected.queue_family_index)
        .queue_priorities(&priorities)
        .build()];
    let device_extension_names = [Swapchain::name().as_ptr()];

    let device_create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_info)
        .enabled_extension_names(&device_extension_names);
    let device: Device = unsafe {
        instance.create_device(selected.physical_device, &device_create_info, None)?
    };
    let graphics_queue = unsafe { device.get_device_queue(selected.queue_family_index, 0) };

    Ok((device, graphics_queue))
}

//-------------------SWAPCHAIN-----------------------
pub struct SwapchainBuilder<'a> {
    device: &'a Device,
    swapchain_loader: &'a Swapchain,
    physical_device: vk::PhysicalDevice,
    surface_loader: &'a Surface,
    surface: vk::SurfaceKHR,
    desired_present_mode: vk::PresentModeKHR,
    desired_extent: vk::Extent2D,
    old_swapchain: vk::SwapchainKHR,
}

impl<'a> SwapchainBuilder<'a> {
    pub fn new(
        device: &'a Device,
        swapchain_loader: &'a Swapchain,
        physical_device: vk::PhysicalDevice,
        surface_loader: &'a Surface,
        surface: vk::SurfaceKHR,
    ) -> Self {
        SwapchainBuilder {
            device,
            swapchain_loader,
            physical_device,
            surface_loader,
            surface,
            desired_present_mode: vk::PresentModeKHR::FIFO,
            desired_extent: vk::Extent2D { width: 256, height: 256 },
            old_swapchain: vk::SwapchainKHR::null(),
        }
    }

    pub fn set_desired_present_mode(mut self, present_mode: vk::PresentModeKHR) -> Self {
        self.desired_present_mode = present_mode;
        self
    }

    pub fn set_desired_extent(mut self, width: u32, height: u32) -> Self {
        self.desired_extent = vk::Extent2D { width, height };
        self
    }

    pub fn set_old_swapchain(mut self, old_swapchain: vk::SwapchainKHR) -> Self {
        self.old_swapchain = old_swapchain;
        self
    }

    pub fn build(self) -> EngineResult<AllocatedSwapchain> {
        let (capabilities, formats, present_modes) = unsafe {
            (
                self.surface_loader
                    .get_physical_device_surface_capabilities(self.physical_device, self.surface)?,
                self.surface_loader
                    .get_physical_device_surface_formats(self.physical_device, self.surface)?,
                self.surface_loader
                    .get_physical_device_surface_present_modes(self.physical_device, self.surface)?,
            )
        };
        let surface_format = swapchain::choose_surface_format(&formats)?;
        let present_mode = swapchain::choose_present_mode(&present_modes, self.desired_present_mode);
        let extent = swapchain::choose_extent(&capabilities, self.desired_extent);

        let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(self.surface)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .present_mode(present_mode)
            .image_extent(extent)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .min_image_count(swapchain::choose_image_count(&capabilities))
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(swapchain::choose_pre_transform(&capabilities))
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .clipped(true)
            .image_array_layers(1)
            .old_swapchain(self.old_swapchain);
        let swapchain = unsafe { self.swapchain_loader.create_swapchain(&swapchain_create_info, None)? };
        let images = unsafe { self.swapchain_loader.get_swapchain_images(swapchain)? };
        let image_views = images
            .iter()
            .map(|&image| {
                let create_view_info =
                    vk_init::image_view_create_info(surface_format.format, image, vk::ImageAspectFlags::COLOR);
                unsafe { self.device.create_image_view(&create_view_info, None) }
            })
            .collect::<Result<Vec<vk::ImageView>, vk::Result>>()?;

        log::debug!(
            target: logger::RENDER,
            "swapchain created: {} images, {}x{}, {:?}, {:?}",
            images.len(),
            extent.width,
            extent.height,
            surface_format.format,
            present_mode
        );

        Ok(AllocatedSwapchain {
            swapchain,
            format: surface_format,
            extent,
            images,
            image_views,
        })
    }
}

//-------------------RENDER PASS-----------------------
pub fn init_render_pass(device: &Device, color_format: vk::Format) -> EngineResult<vk::RenderPass> {
    let color_attachment = vk::AttachmentDescription::builder()
        .format(color_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        //clear on load, keep the result so it can be presented
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .build();

    let color_attachment_ref = vk::AttachmentReference::builder()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .build();

    let subpass = vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(slice::from_ref(&color_attachment_ref))
        .build();

    //the image is only ours once the presentation engine signals the acquire semaphore
    let dependency = vk::SubpassDependency::builder()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
        .build();

    let render_pass_info = vk::RenderPassCreateInfo::builder()
        .attachments(slice::from_ref(&color_attachment))
        .subpasses(slice::from_ref(&subpass))
        .dependencies(slice::from_ref(&dependency));

    Ok(unsafe { device.create_render_pass(&render_pass_info, None)? })
}

pub fn init_framebuffers(
    device: &Device,
    render_pass: vk::RenderPass,
    swapchain: &AllocatedSwapchain,
) -> EngineResult<Vec<vk::Framebuffer>> {
    let framebuffers = swapchain
        .image_views
        .iter()
        .map(|view| {
            let framebuffer_info =
                vk_init::framebuffer_create_info(render_pass, slice::from_ref(view), swapchain.extent);
            unsafe { device.create_framebuffer(&framebuffer_info, None) }
        })
        .collect::<Result<Vec<vk::Framebuffer>, vk::Result>>()?;
    Ok(framebuffers)
}

//-------------------FRAMES-----------------------
// handles are stored as soon as they exist, so a failure part way leaves nothing unreachable
pub fn init_frames(
    device: &Device,
    graphics_queue_family: u32,
    frames: &mut [FrameData; FRAME_OVERLAP],
) -> EngineResult<()> {
    let command_pool_info = vk_init::command_pool_create_info(
        graphics_queue_family,
        vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
    );
    //signaled so the first wait in draw returns immediately
    let fence_create_info = vk_init::fence_create_info(vk::FenceCreateFlags::SIGNALED);
    let semaphore_create_info = vk_init::semaphore_create_info(vk::SemaphoreCreateFlags::empty());

    for frame in frames.iter_mut() {
        unsafe {
            frame.command_pool = device.create_command_pool(&command_pool_info, None)?;
            let cmd_alloc_info = vk_init::command_buffer_allocate_info(frame.command_pool, 1);
            frame.main_command_buffer = device.allocate_command_buffers(&cmd_alloc_info)?[0];
            frame.render_fence = device.create_fence(&fence_create_info, None)?;
            frame.swapchain_semaphore = device.create_semaphore(&semaphore_create_info, None)?;
            frame.render_semaphore = device.create_semaphore(&semaphore_create_info, None)?;
        }
    }
    Ok(())
}

//-------------------PIPELINES-----------------------
pub fn init_triangle_pipeline(
    device: &Device,
    render_pass: vk::RenderPass,
) -> EngineResult<(vk::Pipeline, vk::PipelineLayout)> {
    let triangle_vertex_shader = vk_pipelines::load_shader_module(TRIANGLE_VERTEX_SHADER, device)?;
    let triangle_frag_shader = match vk_pipelines::load_shader_module(TRIANGLE_FRAGMENT_SHADER, device) {
        Ok(module) => module,
        Err(e) => {
            unsafe { device.destroy_shader_module(triangle_vertex_shader, None) };
            return Err(e);
        }
    };

    let pipeline_layout_info = vk::PipelineLayoutCreateInfo::builder();
    let result = unsafe { device.create_pipeline_layout(&pipeline_layout_info, None) }
        .map_err(EngineError::from)
        .and_then(|triangle_pipeline_layout| {
            let shader_entry_name = unsafe { CStr::from_bytes_with_nul_unchecked(SHADER_ENTRY) };
            let mut pipeline_builder = PipelineBuilder::default();
            pipeline_builder.pipeline_layout = triangle_pipeline_layout;
            pipeline_builder.set_shaders(
                triangle_vertex_shader,
                triangle_frag_shader,
                shader_entry_name,
                shader_entry_name,
            );
            //it will draw triangles
            pipeline_builder.set_input_topology(vk::PrimitiveTopology::TRIANGLE_LIST);
            //filled triangles
            pipeline_builder.set_polygon_mode(vk::PolygonMode::FILL);
            //no backface culling
            pipeline_builder.set_cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE);
            pipeline_builder.set_multisampling_none();
            pipeline_builder.disable_blending();
            pipeline_builder.set_render_pass(render_pass, 0);

            match pipeline_builder.build_pipeline(device) {
                Ok(pipeline) => Ok((pipeline, triangle_pipeline_layout)),
                Err(e) => {
                    unsafe { device.destroy_pipeline_layout(triangle_pipeline_layout, None) };
                    Err(e)
                }
            }
        });

    //shader modules are not needed once the pipeline exists
    unsafe {
        device.destroy_shader_module(triangle_frag_shader, None);
        device.destroy_shader_module(triangle_vertex_shader, None);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &[u8]) -> vk::LayerProperties {
        let mut props = vk::LayerProperties::default();
        for (dst, &src) in props.layer_name.iter_mut().zip(name) {
            *dst = src as c_char;
        }
        props
    }

    #[test]
    fn validation_layer_lookup() {
        let layers = [layer(b"VK_LAYER_MESA_device_select\0"), layer(VALIDATION_LAYER)];
        assert!(layer_available(&layers, validation_layer_name()));
        assert!(!layer_available(&layers[..1], validation_layer_name()));
        assert!(!layer_available(&[], validation_layer_name()));
    }

    #[test]
    fn instance_builder_settings() {
        let builder = InstanceBuilder::default()
            .app_name("Example Vulkan Application")
            .request_validation_layers(true)
            .require_api_version(1, 1, 0)
            .use_default_debug_messenger();
        assert_eq!(builder.app_name.to_str().unwrap(), "Example Vulkan Application");
        assert_eq!(builder.api_version, vk::API_VERSION_1_1);
        assert!(builder.request_validation);
        assert!(builder.debug_messenger);
    }

    #[test]
    fn app_name_drops_interior_nul() {
        let builder = InstanceBuilder::default().app_name("bad\0name");
        assert_eq!(builder.app_name.to_str().unwrap(), "badname");
    }

    #[test]
    fn shader_binaries_ship_at_fixed_paths() {
        for path in [TRIANGLE_VERTEX_SHADER, TRIANGLE_FRAGMENT_SHADER] {
            assert!(std::path::Path::new(path).exists(), "{path} is missing");
            let words = vk_pipelines::read_shader_code(path).unwrap();
            assert_eq!(words[0], 0x0723_0203);
        }
    }

    #[test]
    fn debug_utils_extension_lookup() {
        let mut props = vk::ExtensionProperties::default();
        for (dst, &src) in props.extension_name.iter_mut().zip(DebugUtils::name().to_bytes()) {
            *dst = src as c_char;
        }
        assert!(device::has_extension(&[props], DebugUtils::name()));
        assert!(!device::has_extension(&[], DebugUtils::name()));
    }

    #[test]
    fn shader_paths_are_relative() {
        assert!(std::path::Path::new(TRIANGLE_VERTEX_SHADER).is_relative());
        assert!(std::path::Path::new(TRIANGLE_FRAGMENT_SHADER).is_relative());
    }
}
