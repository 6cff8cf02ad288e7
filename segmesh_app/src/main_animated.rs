//! SegMesh bootstrap with a clear color that cycles over time

use std::process::ExitCode;

use segmesh_engine::config::BootstrapConfig;
use segmesh_engine::foundation::logging;

fn main() -> ExitCode {
    logging::init();
    logging::install_panic_hook();

    log::info!("Starting SegMesh (animated clear)");
    segmesh_engine::run(&BootstrapConfig::animated())
}
