use serde::{Deserialize, Serialize};

use crate::{activation::activation::ActivationFunction, math::matrix::Matrix};
use crate::error::{EmotionError, Result};

/// A fully connected layer: `a = f(x·W + b)`.
///
/// `weights` is input_size × size and `biases` is 1 × size. The layer keeps
/// no per-call state, so a loaded network can be shared across threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

impl Layer {
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU
            | ActivationFunction::LeakyReLU { .. }
            | ActivationFunction::Elu { .. }
            | ActivationFunction::Gelu
            | ActivationFunction::Swish => Matrix::he(input_size, size),
            _ => Matrix::xavier(input_size, size),
        };

        Layer {
            size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Runs one input row through the layer.
    pub fn infer(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_size() {
            return Err(EmotionError::Shape { expected: self.input_size(), actual: input.len() });
        }
        let z = Matrix::row(input.to_vec()).dot(&self.weights)?.add(&self.biases)?;
        Ok(self.activator.apply(&z.data[0]))
    }

    /// Structural check for layers that came from disk.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.biases.validate()?;
        if self.weights.cols != self.size || self.biases.rows != 1 || self.biases.cols != self.size {
            return Err(EmotionError::Model(format!(
                "layer of size {} has weights {}x{} and biases {}x{}",
                self.size, self.weights.rows, self.weights.cols, self.biases.rows, self.biases.cols
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_layer(activator: ActivationFunction) -> Layer {
        Layer {
            size: 2,
            weights: Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.0]]),
            biases: Matrix::from_data(vec![vec![0.5, 0.0]]),
            activator,
        }
    }

    #[test]
    fn infer_applies_weights_bias_and_activation() {
        let out = fixed_layer(ActivationFunction::ReLU).infer(&[1.0, 1.0]).unwrap();
        assert_eq!(out, vec![3.5, 0.0]);
    }

    #[test]
    fn infer_rejects_wrong_input_length() {
        let err = fixed_layer(ActivationFunction::Identity).infer(&[1.0]).unwrap_err();
        assert!(matches!(err, EmotionError::Shape { expected: 2, actual: 1 }));
    }

    #[test]
    fn new_layer_validates() {
        let layer = Layer::new(7, 32, ActivationFunction::Softmax);
        assert_eq!(layer.input_size(), 32);
        assert!(layer.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bias_width_mismatch() {
        let mut layer = fixed_layer(ActivationFunction::Identity);
        layer.biases = Matrix::zeros(1, 3);
        assert!(layer.validate().is_err());
    }
}
