#[cfg(test)]
mod tests {
    use ash::vk;
    use crate::window::WindowPosition;

    #[test]
    fn defaults() {
        //the pipeline relies on an empty vertex input state
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();
        assert_eq!(vertex_input.vertex_binding_description_count, 0);
        assert_eq!(vertex_input.vertex_attribute_description_count, 0);

        let blend = vk::PipelineColorBlendAttachmentState::default();
        assert_eq!(blend.blend_enable, vk::FALSE);
    }

    #[test]
    fn app_window() {
        let params = crate::window_params();
        assert!(params.vulkan);
        assert_eq!(params.position, WindowPosition::Centered);
        assert_eq!((params.width, params.height), (1700, 900));
        assert_eq!(params.title, "Vulkan Engine");
    }
}
