use engine::{LoopConfig, Scene, WorldConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay;

pub(crate) type SceneFactory = fn(&WorldConfig) -> Box<dyn Scene>;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) build_scene: SceneFactory,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Mahou Startup ===");

    AppWiring {
        config: LoopConfig::default(),
        build_scene: gameplay::build_scene,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
