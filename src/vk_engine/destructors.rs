use crate::vk_engine::VulkanEngine;
use crate::vk_types::AllocatedSwapchain;
use ash::extensions::khr::Swapchain;
use ash::Device;

// leaves a null handle behind so a second destroy is a no-op
pub fn take_handle<H: Default>(handle: &mut H) -> H {
    std::mem::take(handle)
}

pub fn destroy_swapchain(
    device: &Device,
    swapchain_loader: &Swapchain,
    swapchain: &AllocatedSwapchain,
) {
    // image views first, the images themselves belong to the swapchain
    for &view in swapchain.image_views.iter() {
        unsafe { device.destroy_image_view(view, None) };
    }
    unsafe { swapchain_loader.destroy_swapchain(swapchain.swapchain, None) };
}

impl VulkanEngine {
    pub fn destroy_pipeline(&mut self) {
        if let Some((pipeline, layout)) = self.triangle_pipeline.take() {
            unsafe {
                self.device.destroy_pipeline(pipeline, None);
                self.device.destroy_pipeline_layout(layout, None);
            }
        }
    }

    pub fn destroy_framebuffers(&mut self) {
        for framebuffer in self.framebuffers.drain(..) {
            unsafe { self.device.destroy_framebuffer(framebuffer, None) };
        }
    }

    pub fn destroy_frame_data(&mut self) {
        for frame in self.frames.iter_mut() {
            let frame_data = take_handle(frame);
            unsafe {
                //destroying the pool frees its command buffer too
                self.device
                    .destroy_command_pool(frame_data.command_pool, None);
                self.device.destroy_fence(frame_data.render_fence, None);
                self.device
                    .destroy_semaphore(frame_data.render_semaphore, None);
                self.device
                    .destroy_semaphore(frame_data.swapchain_semaphore, None);
            };
        }
    }

    pub fn destroy_render_pass(&mut self) {
        let render_pass = take_handle(&mut self.render_pass);
        unsafe { self.device.destroy_render_pass(render_pass, None) };
    }

    pub fn destroy_swapchain(&mut self) {
        let swapchain = take_handle(&mut self.swapchain);
        destroy_swapchain(&self.device, &self.swapchain_loader, &swapchain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vk_engine::frame_data::FrameData;
    use ash::vk::{self, Handle};

    #[test]
    fn render_pass_reads_back_null_after_take() {
        let mut render_pass = vk::RenderPass::from_raw(0x5);
        assert_eq!(take_handle(&mut render_pass), vk::RenderPass::from_raw(0x5));
        assert_eq!(render_pass, vk::RenderPass::null());
        //a second destroy would only see null
        assert_eq!(take_handle(&mut render_pass), vk::RenderPass::null());
    }

    #[test]
    fn frame_data_reads_back_null_after_take() {
        let mut frame = FrameData {
            command_pool: vk::CommandPool::from_raw(1),
            render_fence: vk::Fence::from_raw(2),
            ..Default::default()
        };
        let taken = take_handle(&mut frame);
        assert_eq!(taken.render_fence, vk::Fence::from_raw(2));
        assert_eq!(frame.command_pool, vk::CommandPool::null());
        assert_eq!(frame.render_fence, vk::Fence::null());
    }

    #[test]
    fn swapchain_reads_back_empty_after_take() {
        let mut swapchain = AllocatedSwapchain {
            swapchain: vk::SwapchainKHR::from_raw(7),
            image_views: vec![vk::ImageView::from_raw(8)],
            ..Default::default()
        };
        let taken = take_handle(&mut swapchain);
        assert_eq!(taken.image_views.len(), 1);
        assert_eq!(swapchain.swapchain, vk::SwapchainKHR::null());
        assert!(swapchain.image_views.is_empty());
    }
}
