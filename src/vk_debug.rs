use crate::logger;
use ash::vk;
use std::borrow::Cow;
use std::ffi::{c_char, c_void, CStr};

fn severity_level(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> log::Level {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::Level::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::Level::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::Level::Debug
    } else {
        log::Level::Trace
    }
}

unsafe fn ptr_to_string<'a>(p: *const c_char) -> Cow<'a, str> {
    if p.is_null() {
        Cow::from("")
    } else {
        CStr::from_ptr(p).to_string_lossy()
    }
}

pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id_number = callback_data.message_id_number;
    let message_id_name = ptr_to_string(callback_data.p_message_id_name);
    let message = ptr_to_string(callback_data.p_message);

    log::log!(
        target: logger::VULKAN,
        severity_level(message_severity),
        "{message_type:?} [{message_id_name} ({message_id_number})] : {message}"
    );

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_map_to_levels() {
        use vk::DebugUtilsMessageSeverityFlagsEXT as S;
        assert_eq!(severity_level(S::ERROR), log::Level::Error);
        assert_eq!(severity_level(S::WARNING), log::Level::Warn);
        assert_eq!(severity_level(S::INFO), log::Level::Debug);
        assert_eq!(severity_level(S::VERBOSE), log::Level::Trace);
        assert_eq!(severity_level(S::WARNING | S::ERROR), log::Level::Error);
    }

    #[test]
    fn null_callback_data_is_ignored() {
        let ret = unsafe {
            vulkan_debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                std::ptr::null(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(ret, vk::FALSE);
    }

    #[test]
    fn message_is_read() {
        let message = b"validation says hi\0";
        let data = vk::DebugUtilsMessengerCallbackDataEXT {
            p_message: message.as_ptr() as *const c_char,
            ..Default::default()
        };
        let ret = unsafe {
            vulkan_debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                &data,
                std::ptr::null_mut(),
            )
        };
        assert_eq!(ret, vk::FALSE);
    }
}
