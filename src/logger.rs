//! Stdout logger bootstrap. Subsystems log under their own target so
//! `RUST_LOG=render=trace` and friends work as expected.

/// Application level messages (start up, shutdown, window).
pub const GENERAL: &str = "general";
/// Everything the renderer reports.
pub const RENDER: &str = "render";
/// Messages forwarded from the validation layers.
pub const VULKAN: &str = "vulkan";

cfg_if::cfg_if! {
    if #[cfg(debug_assertions)] {
        const DEFAULT_FILTER: &str = "debug";
    } else {
        const DEFAULT_FILTER: &str = "info";
    }
}

fn filter_spec(env_filter: Option<String>) -> String {
    match env_filter {
        Some(filter) if !filter.trim().is_empty() => filter,
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs the colored stdout logger. Calling it again is a no-op.
pub fn init() {
    let filters = filter_spec(std::env::var("RUST_LOG").ok());
    let _ = pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .try_init();
}
