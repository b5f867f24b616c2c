use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};
use crate::error::{EmotionError, Result};
use crate::network::metadata::ModelMetadata;

/// A feed-forward stack of dense layers plus optional metadata.
///
/// This is the on-disk model format: weights and biases only, no optimizer
/// or training state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a freshly initialized network from (size, input_size, activation) tuples.
    pub fn new(layer_specs: Vec<(usize, usize, ActivationFunction)>) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation))
            .collect();
        Network { layers, metadata: None }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Network {
        self.metadata = Some(metadata);
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Forward pass. Read-only: no activations are cached.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        if self.layers.is_empty() {
            return Err(EmotionError::Model("network has no layers".into()));
        }
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.infer(&current)?;
        }
        Ok(current)
    }

    /// Checks every layer and that consecutive layers chain.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(EmotionError::Model("network has no layers".into()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.validate()
                .map_err(|e| EmotionError::Model(format!("layer {i}: {e}")))?;
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[1].input_size() != pair[0].size {
                return Err(EmotionError::Model(format!(
                    "layer {} expects {} inputs but layer {} emits {}",
                    i + 1, pair[1].input_size(), i, pair[0].size
                )));
            }
        }
        Ok(())
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        std::io::Write::flush(&mut writer)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let network: Network = serde_json::from_reader(reader)?;
        network.validate()?;
        Ok(network)
    }
}
