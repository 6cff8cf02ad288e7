//! Logging setup
//!
//! All crates log through the `log` facade; binaries install `env_logger`
//! once at startup. `RUST_LOG` overrides the default `info` level.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Initialize logging for unit tests
#[cfg(test)]
pub(crate) fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Route panics through the logger before the default hook runs
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());

        match panic_info.location() {
            Some(location) => error!(
                "Panic at {}:{}:{}: {}",
                location.file(),
                location.line(),
                location.column(),
                message
            ),
            None => error!("Panic: {}", message),
        }
        default_hook(panic_info);
    }));
}
