use std::fmt;
use std::path::Path;

use image::RgbImage;
use serde::Serialize;

use crate::activation::activation::ActivationFunction;
use crate::error::{EmotionError, Result};
use crate::network::{InputType, ModelMetadata, Network};
use crate::preprocess::{self, Tensor, INPUT_HEIGHT, INPUT_WIDTH, TENSOR_LEN};

/// The seven categories, in the classifier's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn from_index(index: usize) -> Option<Emotion> {
        Emotion::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Top category and its probability in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub emotion: Emotion,
    pub confidence: f64,
}

/// Index of the largest value; the first one wins on ties. `None` when
/// empty or when any value is NaN.
pub fn argmax(values: &[f64]) -> Option<usize> {
    if values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if v <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// A randomly initialized network with the classifier's shape and metadata:
/// 4096 → 128 (ReLU) → 64 (ReLU) → 7 (softmax). Not trained; it exists so the
/// service can be wired up before real weights are available.
pub fn untrained_network() -> Network {
    Network::new(vec![
        (128, TENSOR_LEN, ActivationFunction::ReLU),
        (64, 128, ActivationFunction::ReLU),
        (Emotion::ALL.len(), 64, ActivationFunction::Softmax),
    ])
    .with_metadata(ModelMetadata {
        description: Some("Untrained emotion classifier (random initialization)".into()),
        input_type: Some(InputType::ImageGrayscale { width: INPUT_WIDTH, height: INPUT_HEIGHT }),
        output_labels: Some(Emotion::ALL.iter().map(|e| e.label().to_string()).collect()),
    })
}

/// The loaded model. Loaded once, then only read, so one instance can be
/// shared by every request thread.
#[derive(Debug)]
pub struct Classifier {
    network: Network,
}

impl Classifier {
    /// Loads the model file and checks it fits the 64×64 → 7 contract.
    pub fn load(path: impl AsRef<Path>) -> Result<Classifier> {
        let path = path.as_ref();
        let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        log::info!("Loading model from: {}", shown.display());

        let network = Network::load_json(path)?;
        let classifier = Classifier::from_network(network)?;
        log::info!(
            "Model ready: {} layers, {} inputs, {} outputs",
            classifier.network.layers.len(),
            classifier.network.input_size(),
            classifier.network.output_size()
        );
        Ok(classifier)
    }

    pub fn from_network(network: Network) -> Result<Classifier> {
        network.validate()?;

        if network.input_size() != TENSOR_LEN {
            return Err(EmotionError::Model(format!(
                "model takes {} inputs, expected {} ({}x{} grayscale)",
                network.input_size(), TENSOR_LEN, INPUT_WIDTH, INPUT_HEIGHT
            )));
        }
        if network.output_size() != Emotion::ALL.len() {
            return Err(EmotionError::Model(format!(
                "model emits {} outputs, expected {}",
                network.output_size(), Emotion::ALL.len()
            )));
        }

        if let Some(metadata) = &network.metadata {
            match &metadata.input_type {
                Some(InputType::ImageGrayscale { width, height })
                    if *width == INPUT_WIDTH && *height == INPUT_HEIGHT => {}
                None => {}
                Some(other) => {
                    return Err(EmotionError::Model(format!(
                        "model declares input {:?}, expected {}x{} grayscale",
                        other, INPUT_WIDTH, INPUT_HEIGHT
                    )));
                }
            }
            if let Some(labels) = &metadata.output_labels {
                let fixed: Vec<&str> = Emotion::ALL.iter().map(|e| e.label()).collect();
                if labels.iter().map(String::as_str).ne(fixed.iter().copied()) {
                    log::warn!("Model output labels {:?} differ from {:?}; using the fixed order", labels, fixed);
                }
            }
        }

        Ok(Classifier { network })
    }

    /// Full probability distribution over `Emotion::ALL`.
    pub fn probabilities(&self, tensor: &Tensor) -> Result<Vec<f64>> {
        if tensor.len() != TENSOR_LEN {
            return Err(EmotionError::Shape { expected: TENSOR_LEN, actual: tensor.len() });
        }
        let output = self.network.predict(&tensor.data)?;
        if output.iter().any(|v| !v.is_finite()) {
            return Err(EmotionError::Model("classifier produced a non-finite output".into()));
        }
        Ok(output)
    }

    pub fn predict(&self, tensor: &Tensor) -> Result<Prediction> {
        let probs = self.probabilities(tensor)?;
        let index = argmax(&probs)
            .ok_or_else(|| EmotionError::Model("classifier produced no output".into()))?;
        let emotion = Emotion::from_index(index)
            .ok_or_else(|| EmotionError::Model(format!("output index {index} has no category")))?;
        Ok(Prediction { emotion, confidence: probs[index].clamp(0.0, 1.0) })
    }

    pub fn predict_frame(&self, frame: &RgbImage) -> Result<Prediction> {
        let tensor = preprocess::preprocess_frame(frame)?;
        self.predict(&tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use image::Rgb;
    use std::path::PathBuf;

    /// A per-process scratch file, removed on drop.
    struct TempModel(PathBuf);

    impl TempModel {
        fn new(name: &str) -> TempModel {
            let file = format!("emotion-nn-{}-{}.json", std::process::id(), name);
            TempModel(std::env::temp_dir().join(file))
        }
    }

    impl Drop for TempModel {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    /// A single softmax layer with zero weights, so the biases alone decide.
    fn biased_network(biases: [f64; 7]) -> Network {
        let mut net = Network::new(vec![(7, TENSOR_LEN, ActivationFunction::Softmax)]);
        net.layers[0].weights = Matrix::zeros(TENSOR_LEN, 7);
        net.layers[0].biases = Matrix::row(biases.to_vec());
        net
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[0.2, f64::NAN]), None);
    }

    #[test]
    fn emotion_indices_follow_fixed_order() {
        assert_eq!(Emotion::from_index(0), Some(Emotion::Angry));
        assert_eq!(Emotion::from_index(6), Some(Emotion::Neutral));
        assert_eq!(Emotion::from_index(7), None);
        assert_eq!(Emotion::Surprise.to_string(), "Surprise");
    }

    #[test]
    fn predict_picks_highest_probability() {
        let clf = Classifier::from_network(biased_network([0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 1.0])).unwrap();
        let frame = RgbImage::from_pixel(64, 64, Rgb([90, 90, 90]));
        let p = clf.predict_frame(&frame).unwrap();
        assert_eq!(p.emotion, Emotion::Happy);
        assert!(p.confidence > 0.5 && p.confidence <= 1.0);
    }

    #[test]
    fn uniform_output_resolves_to_first_category() {
        let clf = Classifier::from_network(biased_network([0.0; 7])).unwrap();
        let frame = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let p = clf.predict_frame(&frame).unwrap();
        assert_eq!(p.emotion, Emotion::Angry);
        assert!((p.confidence - 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn random_model_always_answers_in_range() {
        let net = Network::new(vec![
            (16, TENSOR_LEN, ActivationFunction::ReLU),
            (7, 16, ActivationFunction::Softmax),
        ]);
        let clf = Classifier::from_network(net).unwrap();
        for shade in [0u8, 40, 128, 255] {
            let frame = RgbImage::from_pixel(48, 32, Rgb([shade, 255 - shade, shade / 2]));
            let p = clf.predict_frame(&frame).unwrap();
            assert!(Emotion::ALL.contains(&p.emotion));
            assert!((0.0..=1.0).contains(&p.confidence));
        }
    }

    #[test]
    fn wrong_model_shapes_are_rejected() {
        let wrong_in = Network::new(vec![(7, 28 * 28, ActivationFunction::Softmax)]);
        assert!(matches!(Classifier::from_network(wrong_in), Err(EmotionError::Model(_))));
        let wrong_out = Network::new(vec![(10, TENSOR_LEN, ActivationFunction::Softmax)]);
        assert!(matches!(Classifier::from_network(wrong_out), Err(EmotionError::Model(_))));
    }

    #[test]
    fn rgb_input_metadata_is_rejected() {
        let net = biased_network([0.0; 7]).with_metadata(ModelMetadata {
            input_type: Some(InputType::ImageRgb { width: 64, height: 64 }),
            ..Default::default()
        });
        assert!(Classifier::from_network(net).is_err());
    }

    #[test]
    fn short_tensor_is_a_shape_error() {
        let clf = Classifier::from_network(biased_network([0.0; 7])).unwrap();
        let tensor = Tensor { shape: [1, 2, 2, 1], data: vec![0.0; 4] };
        assert!(matches!(clf.predict(&tensor), Err(EmotionError::Shape { expected: 4096, actual: 4 })));
    }

    #[test]
    fn non_finite_output_is_a_model_error() {
        let mut net = biased_network([0.0; 7]);
        net.layers[0].activator = ActivationFunction::Identity;
        net.layers[0].biases = Matrix::row(vec![f64::NAN; 7]);
        let clf = Classifier::from_network(net).unwrap();
        let frame = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        assert!(matches!(clf.predict_frame(&frame), Err(EmotionError::Model(_))));
    }

    #[test]
    fn load_reads_a_saved_model() {
        let file = TempModel::new("saved");
        biased_network([0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0]).save_json(&file.0).unwrap();

        let clf = Classifier::load(&file.0).unwrap();
        let frame = RgbImage::from_pixel(64, 64, Rgb([200, 10, 10]));
        assert_eq!(clf.predict_frame(&frame).unwrap().emotion, Emotion::Sad);
    }

    #[test]
    fn load_reports_missing_file_as_io() {
        let file = TempModel::new("missing");
        assert!(matches!(Classifier::load(&file.0), Err(EmotionError::Io(_))));
    }

    #[test]
    fn load_reports_truncated_json() {
        let file = TempModel::new("truncated");
        std::fs::write(&file.0, br#"{"layers": ["#).unwrap();
        assert!(matches!(Classifier::load(&file.0), Err(EmotionError::Json(_))));
    }

    #[test]
    fn load_rejects_wrong_shape_on_disk() {
        let file = TempModel::new("wrong-shape");
        Network::new(vec![(10, 28 * 28, ActivationFunction::Softmax)]).save_json(&file.0).unwrap();
        assert!(matches!(Classifier::load(&file.0), Err(EmotionError::Model(_))));
    }

    #[test]
    fn untrained_network_survives_save_and_load() {
        let file = TempModel::new("untrained");
        untrained_network().save_json(&file.0).unwrap();

        let clf = Classifier::load(&file.0).unwrap();
        let metadata = clf.network.metadata.as_ref().unwrap();
        assert_eq!(metadata.input_type, Some(InputType::ImageGrayscale { width: 64, height: 64 }));
        assert_eq!(metadata.output_labels.as_ref().map(Vec::len), Some(7));

        let frame = RgbImage::from_pixel(320, 240, Rgb([30, 60, 90]));
        let p = clf.predict_frame(&frame).unwrap();
        assert!((0.0..=1.0).contains(&p.confidence));
    }

    #[test]
    fn mismatched_labels_still_use_fixed_order() {
        let mut labels: Vec<String> = Emotion::ALL.iter().map(|e| e.label().to_string()).collect();
        labels.reverse();
        let net = biased_network([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0]).with_metadata(ModelMetadata {
            output_labels: Some(labels),
            ..Default::default()
        });

        let file = TempModel::new("reversed-labels");
        net.save_json(&file.0).unwrap();
        let clf = Classifier::load(&file.0).unwrap();
        let frame = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));
        assert_eq!(clf.predict_frame(&frame).unwrap().emotion, Emotion::Neutral);
    }
}
