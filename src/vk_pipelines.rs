use core::slice;
use std::ffi::CStr;
use std::path::Path;
use std::ptr::null;
use ash::{Device, vk};
use crate::error::{EngineError, EngineResult};

pub fn read_shader_code(file_path: impl AsRef<Path>) -> EngineResult<Vec<u32>> {
    let path = file_path.as_ref();
    let shader_error = |source| EngineError::Shader { path: path.to_path_buf(), source };

    let mut file = std::fs::File::open(path).map_err(shader_error)?;
    //read_spv checks size and alignment, and fixes endianness
    ash::util::read_spv(&mut file).map_err(shader_error)
}

pub fn load_shader_module(file_path: impl AsRef<Path>, device: &Device) -> EngineResult<vk::ShaderModule> {
    let byte_code_aligned = read_shader_code(file_path)?;
    let shader_create_info = vk::ShaderModuleCreateInfo::builder()
        .code(&byte_code_aligned);

    unsafe { Ok(device.create_shader_module(&shader_create_info, None)?) }
}

#[derive(Default)]
pub struct PipelineBuilder {
    pub shader_stages: Vec<vk::PipelineShaderStageCreateInfo>,
    pub input_assembly: vk::PipelineInputAssemblyStateCreateInfo,
    pub rasterizer: vk::PipelineRasterizationStateCreateInfo,
    pub color_blend_attachment: vk::PipelineColorBlendAttachmentState,
    pub multisampling: vk::PipelineMultisampleStateCreateInfo,
    pub pipeline_layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
}


impl PipelineBuilder {
    pub fn build_pipeline(self, device: &Device) -> EngineResult<vk::Pipeline> {
        //viewport and scissor are dynamic, only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(slice::from_ref(&self.color_blend_attachment));

        //vertices are generated in the vertex shader
        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::default();

        let state = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_info = vk::PipelineDynamicStateCreateInfo::builder()
            .dynamic_states(&state);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&self.shader_stages)
            .vertex_input_state(&vertex_input_info)
            .input_assembly_state(&self.input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&self.rasterizer)
            .multisample_state(&self.multisampling)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_info)
            .layout(self.pipeline_layout)
            .render_pass(self.render_pass)
            .subpass(self.subpass)
            .build();

        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), slice::from_ref(&pipeline_info), None)
        }
        .map_err(|(_, e)| e)?;
        Ok(pipelines[0])
    }

    pub fn set_shaders(&mut self, vertex_shader: vk::ShaderModule, fragment_shader: vk::ShaderModule, vertex_entry: &CStr, fragment_entry: &CStr) {
        self.shader_stages.clear();
        self.shader_stages.push(vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_shader)
            .name(vertex_entry)
            .build());
        self.shader_stages.push(vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fragment_shader)
            .name(fragment_entry)
            .build());
    }

    pub fn set_input_topology(&mut self, topology: vk::PrimitiveTopology) {
        self.input_assembly.topology = topology;
        self.input_assembly.primitive_restart_enable = vk::FALSE;
    }

    pub fn set_polygon_mode(&mut self, mode: vk::PolygonMode) {
        self.rasterizer.polygon_mode = mode;
        self.rasterizer.line_width = 1f32;
    }

    pub fn set_cull_mode(&mut self, cull_mode: vk::CullModeFlags, front_face: vk::FrontFace) {
        self.rasterizer.cull_mode = cull_mode;
        self.rasterizer.front_face = front_face;
    }

    pub fn set_multisampling_none(&mut self) {
        self.multisampling.sample_shading_enable = vk::FALSE;
        //defaults to no multisampling
        self.multisampling.rasterization_samples = vk::SampleCountFlags::TYPE_1;
        self.multisampling.min_sample_shading = 1f32;
        self.multisampling.p_sample_mask = null();
        //no alpha to coverage either
        self.multisampling.alpha_to_coverage_enable = vk::FALSE;
        self.multisampling.alpha_to_one_enable = vk::FALSE;
    }

    pub fn disable_blending(&mut self) {
        //default write mask
        self.color_blend_attachment.color_write_mask = vk::ColorComponentFlags::RGBA;
        //no blending
        self.color_blend_attachment.blend_enable = vk::FALSE;
    }

    pub fn set_render_pass(&mut self, render_pass: vk::RenderPass, subpass: u32) {
        self.render_pass = render_pass;
        self.subpass = subpass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_shader(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("hello_triangle_vk_{}_{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn missing_shader_is_an_error() {
        let err = read_shader_code("shaders/does_not_exist.spv").unwrap_err();
        match err {
            EngineError::Shader { path, source } => {
                assert_eq!(path, Path::new("shaders/does_not_exist.spv"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn misaligned_shader_is_an_error() {
        let path = temp_shader("misaligned.spv", &[0x03, 0x02, 0x23]);
        let err = read_shader_code(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, EngineError::Shader { .. }));
    }

    #[test]
    fn spirv_words_are_read() {
        //magic number followed by a version word, little endian
        let bytes = [0x03, 0x02, 0x23, 0x07, 0x00, 0x00, 0x01, 0x00];
        let path = temp_shader("words.spv", &bytes);
        let words = read_shader_code(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(words, vec![0x0723_0203, 0x0001_0000]);
    }

    #[test]
    fn builder_state() {
        let mut builder = PipelineBuilder::default();
        builder.set_input_topology(vk::PrimitiveTopology::TRIANGLE_LIST);
        builder.set_polygon_mode(vk::PolygonMode::FILL);
        builder.set_cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE);
        builder.set_multisampling_none();
        builder.disable_blending();
        builder.set_render_pass(vk::RenderPass::null(), 0);

        assert_eq!(builder.input_assembly.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert_eq!(builder.rasterizer.line_width, 1f32);
        assert_eq!(builder.rasterizer.cull_mode, vk::CullModeFlags::NONE);
        assert_eq!(builder.multisampling.rasterization_samples, vk::SampleCountFlags::TYPE_1);
        assert_eq!(builder.color_blend_attachment.color_write_mask, vk::ColorComponentFlags::RGBA);
        assert_eq!(builder.color_blend_attachment.blend_enable, vk::FALSE);
        assert_eq!(builder.subpass, 0);
    }

    #[test]
    fn set_shaders_replaces_stages() {
        let entry = CStr::from_bytes_with_nul(b"main\0").unwrap();
        let mut builder = PipelineBuilder::default();
        builder.set_shaders(vk::ShaderModule::null(), vk::ShaderModule::null(), entry, entry);
        builder.set_shaders(vk::ShaderModule::null(), vk::ShaderModule::null(), entry, entry);
        assert_eq!(builder.shader_stages.len(), 2);
        assert_eq!(builder.shader_stages[0].stage, vk::ShaderStageFlags::VERTEX);
        assert_eq!(builder.shader_stages[1].stage, vk::ShaderStageFlags::FRAGMENT);
    }
}
