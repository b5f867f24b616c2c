//! emotion-nn
//!
//! Serves the facial emotion classifier over HTTP.
//!
//! Run with:
//!   cargo run --release                      (same as `serve`)
//!   cargo run --release -- init-model [PATH]
//!
//! `serve` reads its settings from `EMOTION_*` environment variables (see
//! `ServerConfig::from_vars`). `init-model` writes a freshly initialized,
//! untrained network of the right shape, useful for wiring checks before a
//! trained model is available.

use std::path::PathBuf;

use emotion_nn::config::DEFAULT_MODEL_PATH;
use emotion_nn::logging::init_stdout_logger;
use emotion_nn::classify::untrained_network;
use emotion_nn::{Classifier, ServerConfig, Service};

const USAGE: &str = "usage: emotion-nn [serve | init-model [PATH]]";

fn main() {
    init_stdout_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        None | Some("serve") => serve(),
        Some("init-model") => init_model(args.get(1).map(PathBuf::from)),
        Some("-h" | "--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => Err(format!("unknown command {:?}\n{}", other, USAGE).into()),
    };

    if let Err(e) = outcome {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let classifier = Classifier::load(config.model_path())?;
    let service = Service::bind(config, classifier)?;
    service.run();
    Ok(())
}

fn init_model(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    untrained_network().save_json(&path)?;
    log::info!("Wrote untrained model to {}", path.display());
    Ok(())
}
