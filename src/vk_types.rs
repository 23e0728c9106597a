use crate::logger;
use ash::prelude::VkResult;
use ash::vk;

/// Logs a failed Vulkan call with the caller's location. Returns whether the call succeeded.
#[track_caller]
pub fn check_vk<T>(result: VkResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            let location = std::panic::Location::caller();
            log::error!(
                target: logger::RENDER,
                "Vulkan error {e} ({}:{})",
                location.file(),
                location.line()
            );
            false
        }
    }
}

#[derive(Default)]
pub struct AllocatedSwapchain {
    pub swapchain: vk::SwapchainKHR,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes() {
        assert!(check_vk(Ok(())));
        assert!(check_vk(Ok(3u32)));
    }

    #[test]
    fn empty_swapchain_holds_null_handles() {
        let swapchain = AllocatedSwapchain::default();
        assert_eq!(swapchain.swapchain, vk::SwapchainKHR::null());
        assert!(swapchain.images.is_empty());
        assert!(swapchain.image_views.is_empty());
    }

    #[test]
    fn failure_is_reported() {
        let res: VkResult<()> = Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        assert!(!check_vk(res));
    }
}
