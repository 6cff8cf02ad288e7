//! SegMesh bootstrap with a static clear color
//!
//! Opens a 1280x720 window, brings up Vulkan and clears view 0 every frame
//! until the window is closed.

use std::process::ExitCode;

use segmesh_engine::config::BootstrapConfig;
use segmesh_engine::foundation::logging;

fn main() -> ExitCode {
    logging::init();
    logging::install_panic_hook();

    log::info!("Starting SegMesh");
    segmesh_engine::run(&BootstrapConfig::default())
}
