pub mod error;
pub mod config;
pub mod logging;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod preprocess;
pub mod classify;
pub mod server;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{InputType, ModelMetadata, Network};
pub use preprocess::{decode_frame, preprocess_frame, Tensor};
pub use classify::{Classifier, Emotion, Prediction};
pub use config::ServerConfig;
pub use error::{EmotionError, Result};
pub use server::Service;
