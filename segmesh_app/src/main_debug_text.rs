//! SegMesh bootstrap with an animated clear and the renderer name overlay

use std::process::ExitCode;

use segmesh_engine::config::BootstrapConfig;
use segmesh_engine::foundation::logging;

fn main() -> ExitCode {
    logging::init();
    logging::install_panic_hook();

    log::info!("Starting SegMesh (debug text)");
    segmesh_engine::run(&BootstrapConfig::animated_with_debug_text())
}
