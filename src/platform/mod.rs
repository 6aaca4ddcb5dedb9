//! Platform abstraction layer
//!
//! Handles browser/native differences for logging setup.

/// Install the logger for the current target
///
/// Native uses `env_logger` (respects `RUST_LOG`); wasm routes to the browser
/// console and installs the panic hook. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    if env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .is_ok()
    {
        log::debug!("native logger installed");
    }
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::debug!("console logger installed");
    }
}
