use crate::error::{EngineError, EngineResult};
use crate::logger;
use ash::extensions::khr::{Surface, Swapchain};
use ash::prelude::VkResult;
use ash::{vk, Instance};
use std::ffi::CStr;

pub struct SelectedPhysicalDevice {
    pub physical_device: vk::PhysicalDevice,
    pub queue_family_index: u32,
    pub properties: vk::PhysicalDeviceProperties,
}

impl SelectedPhysicalDevice {
    pub fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}

pub struct PhysicalDeviceSelector<'a> {
    instance: &'a Instance,
    surface_loader: &'a Surface,
    minimum_version: u32,
    surface: Option<vk::SurfaceKHR>,
}

impl<'a> PhysicalDeviceSelector<'a> {
    pub fn new(instance: &'a Instance, surface_loader: &'a Surface) -> Self {
        PhysicalDeviceSelector {
            instance,
            surface_loader,
            minimum_version: vk::API_VERSION_1_0,
            surface: None,
        }
    }

    pub fn set_minimum_version(mut self, major: u32, minor: u32) -> Self {
        self.minimum_version = vk::make_api_version(0, major, minor, 0);
        self
    }

    pub fn set_surface(mut self, surface: vk::SurfaceKHR) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn select(self) -> EngineResult<SelectedPhysicalDevice> {
        let physical_devices = unsafe { self.instance.enumerate_physical_devices()? };
        log::debug!(
            target: logger::RENDER,
            "{} devices (GPU) found with vulkan support.",
            physical_devices.len()
        );

        let mut best: Option<(u32, SelectedPhysicalDevice)> = None;
        for &physical_device in physical_devices.iter() {
            let Some(candidate) = self.check_device(physical_device)? else {
                continue;
            };
            let rank = device_type_rank(candidate.properties.device_type);
            if best.as_ref().map_or(true, |(best_rank, _)| rank > *best_rank) {
                best = Some((rank, candidate));
            }
        }
        best.map(|(_, device)| device).ok_or(EngineError::NoSuitableDevice)
    }

    fn check_device(&self, physical_device: vk::PhysicalDevice) -> EngineResult<Option<SelectedPhysicalDevice>> {
        let properties = unsafe { self.instance.get_physical_device_properties(physical_device) };
        if !meets_version(properties.api_version, self.minimum_version) {
            return Ok(None);
        }
        let extensions = unsafe { self.instance.enumerate_device_extension_properties(physical_device)? };
        if !has_extension(&extensions, Swapchain::name()) {
            return Ok(None);
        }

        let families = unsafe {
            self.instance
                .get_physical_device_queue_family_properties(physical_device)
        };
        let queue_family_index = match self.surface {
            Some(surface) => {
                let formats = unsafe {
                    self.surface_loader
                        .get_physical_device_surface_formats(physical_device, surface)?
                };
                let present_modes = unsafe {
                    self.surface_loader
                        .get_physical_device_surface_present_modes(physical_device, surface)?
                };
                if formats.is_empty() || present_modes.is_empty() {
                    return Ok(None);
                }
                find_queue_family(&families, |index| unsafe {
                    self.surface_loader
                        .get_physical_device_surface_support(physical_device, index, surface)
                })?
            }
            None => find_queue_family(&families, |_| Ok(true))?,
        };

        Ok(queue_family_index.map(|queue_family_index| SelectedPhysicalDevice {
            physical_device,
            queue_family_index,
            properties,
        }))
    }
}

fn meets_version(api_version: u32, minimum_version: u32) -> bool {
    (vk::api_version_major(api_version), vk::api_version_minor(api_version))
        >= (vk::api_version_major(minimum_version), vk::api_version_minor(minimum_version))
}

fn device_type_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 4,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 3,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 1,
        _ => 0,
    }
}

pub fn has_extension(extensions: &[vk::ExtensionProperties], name: &CStr) -> bool {
    extensions
        .iter()
        .any(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) } == name)
}

// first family that can do graphics and present
fn find_queue_family(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: impl FnMut(u32) -> VkResult<bool>,
) -> VkResult<Option<u32>> {
    for (index, family) in families.iter().enumerate() {
        let index = index as u32;
        if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && supports_present(index)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}
