use ash::vk;
use crate::vk_engine::VulkanEngine;

pub const FRAME_OVERLAP : usize = 2;
#[derive(Default, Debug, Clone, Copy)]
pub struct FrameData {
    pub command_pool : vk::CommandPool,
    pub main_command_buffer : vk::CommandBuffer,
    pub swapchain_semaphore : vk::Semaphore,
    pub render_semaphore : vk::Semaphore,
    pub render_fence : vk::Fence
}

pub fn frame_slot(frame_number : u64) -> usize {
    (frame_number % FRAME_OVERLAP as u64) as usize
}

impl VulkanEngine {
    pub fn get_current_frame(&self) -> &FrameData {
        &self.frames[frame_slot(self.frame_number)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_alternate() {
        let slots: Vec<usize> = (0..5).map(frame_slot).collect();
        assert_eq!(slots, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn slot_in_range_for_huge_counters() {
        assert!(frame_slot(u64::MAX) < FRAME_OVERLAP);
    }

    #[test]
    fn default_handles_are_null() {
        let frame = FrameData::default();
        assert_eq!(frame.render_fence, vk::Fence::null());
        assert_eq!(frame.main_command_buffer, vk::CommandBuffer::null());
    }
}
