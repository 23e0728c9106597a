use crate::error::{EngineError, EngineResult};
use ash::vk;

const PREFERRED_FORMATS: [vk::Format; 2] = [vk::Format::B8G8R8A8_SRGB, vk::Format::R8G8B8A8_SRGB];

// sRGB 8 bit formats first, otherwise whatever the surface lists first
pub fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> EngineResult<vk::SurfaceFormatKHR> {
    PREFERRED_FORMATS
        .iter()
        .find_map(|&format| {
            available.iter().copied().find(|candidate| {
                candidate.format == format && candidate.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
        })
        .or_else(|| available.first().copied())
        .ok_or(EngineError::NoSurfaceFormat)
}

pub fn choose_present_mode(available: &[vk::PresentModeKHR], desired: vk::PresentModeKHR) -> vk::PresentModeKHR {
    if available.contains(&desired) {
        desired
    } else {
        //FIFO support is mandatory
        vk::PresentModeKHR::FIFO
    }
}

pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window_extent: vk::Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: window_extent.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window_extent.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && desired > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        desired
    }
}

pub fn choose_pre_transform(capabilities: &vk::SurfaceCapabilitiesKHR) -> vk::SurfaceTransformFlagsKHR {
    if capabilities
        .supported_transforms
        .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
    {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    } else {
        capabilities.current_transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    fn capabilities(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 1024, height: 1024 },
            ..Default::default()
        }
    }

    #[test]
    fn prefers_bgra_srgb() {
        let available = [
            format(vk::Format::R8G8B8A8_UNORM),
            format(vk::Format::R8G8B8A8_SRGB),
            format(vk::Format::B8G8R8A8_SRGB),
        ];
        let chosen = choose_surface_format(&available).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn falls_back_to_rgba_srgb_then_first() {
        let available = [format(vk::Format::R8G8B8A8_UNORM), format(vk::Format::R8G8B8A8_SRGB)];
        assert_eq!(choose_surface_format(&available).unwrap().format, vk::Format::R8G8B8A8_SRGB);

        let available = [format(vk::Format::A2B10G10R10_UNORM_PACK32)];
        assert_eq!(
            choose_surface_format(&available).unwrap().format,
            vk::Format::A2B10G10R10_UNORM_PACK32
        );
    }

    #[test]
    fn srgb_format_in_wrong_color_space_is_skipped() {
        let available = [
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
            format(vk::Format::R8G8B8A8_SRGB),
        ];
        assert_eq!(choose_surface_format(&available).unwrap().format, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn no_formats_is_an_error() {
        assert!(matches!(choose_surface_format(&[]), Err(EngineError::NoSurfaceFormat)));
    }

    #[test]
    fn present_mode_fallback() {
        let available = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(
            choose_present_mode(&available, vk::PresentModeKHR::MAILBOX),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(
            choose_present_mode(&available, vk::PresentModeKHR::IMMEDIATE),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn current_extent_wins() {
        let mut caps = capabilities(2, 3);
        caps.current_extent = vk::Extent2D { width: 800, height: 600 };
        let extent = choose_extent(&caps, vk::Extent2D { width: 10, height: 10 });
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn window_extent_is_clamped() {
        let caps = capabilities(2, 3);
        let extent = choose_extent(&caps, vk::Extent2D { width: 1700, height: 0 });
        assert_eq!((extent.width, extent.height), (1024, 1));
    }

    #[test]
    fn image_count() {
        assert_eq!(choose_image_count(&capabilities(2, 0)), 3);
        assert_eq!(choose_image_count(&capabilities(2, 8)), 3);
        assert_eq!(choose_image_count(&capabilities(3, 3)), 3);
    }

    #[test]
    fn identity_transform_preferred() {
        let mut caps = capabilities(2, 3);
        caps.supported_transforms = vk::SurfaceTransformFlagsKHR::IDENTITY | vk::SurfaceTransformFlagsKHR::ROTATE_90;
        caps.current_transform = vk::SurfaceTransformFlagsKHR::ROTATE_90;
        assert_eq!(choose_pre_transform(&caps), vk::SurfaceTransformFlagsKHR::IDENTITY);
        caps.supported_transforms = vk::SurfaceTransformFlagsKHR::ROTATE_90;
        assert_eq!(choose_pre_transform(&caps), vk::SurfaceTransformFlagsKHR::ROTATE_90);
    }
}
