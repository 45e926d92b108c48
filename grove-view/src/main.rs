//! Application entry point for the particle growth viewer.
//!
//! Sets up logging, loads the configuration and hands everything else to
//! [`Viewer`].

mod style;
mod viewer;

use grove_core::Config;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Read when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "grove.toml";

/// Loads the configuration from `path`, falling back to defaults when the
/// file is missing or unusable.
fn load_config(path: &Path) -> Config {
    if !path.exists() {
        info!(path = %path.display(), "no config file, using defaults");
        return Config::default();
    }
    match Config::from_toml_file(path) {
        Ok(cfg) => {
            info!(path = %path.display(), "loaded config");
            cfg
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "bad config file, using defaults");
            Config::default()
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let cfg = load_config(Path::new(&path));

    eframe::run_native(
        "Grove",
        eframe::NativeOptions::default(),
        Box::new(|_cc| Ok(Box::new(Viewer::new(cfg)?))),
    )
}
