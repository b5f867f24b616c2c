use serde::Serialize;
use serde_json::Value;

use crate::classify::{Classifier, Emotion, Prediction};
use crate::error::{EmotionError, Result};
use crate::preprocess::decode_frame;
use crate::server::routes::Reply;
use crate::server::state::AppState;
use crate::server::util::data_url;

/// Success body: `{"emotion": "Happy", "confidence": 87.42}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub emotion: Emotion,
    /// Percentage in [0, 100], two decimals.
    pub confidence: f64,
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        PredictResponse { emotion: p.emotion, confidence: to_percent(p.confidence) }
    }
}

/// Failure body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Probability in [0, 1] → percentage rounded to two decimals.
pub fn to_percent(confidence: f64) -> f64 {
    (confidence * 100.0 * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

pub fn handle(body: &[u8], state: &AppState) -> Reply {
    match predict_body(body, &state.classifier) {
        Ok(prediction) => {
            log::debug!("Predicted {} ({:.4})", prediction.emotion, prediction.confidence);
            Reply::json(200, &PredictResponse::from(prediction))
        }
        Err(e) => failure(state, &e),
    }
}

/// Every error on this route ends up here as one `{"error": ...}` reply.
pub fn failure(state: &AppState, err: &EmotionError) -> Reply {
    log::warn!("Prediction failed: {}", err);
    let status = state.error_status(err.is_client_error());
    Reply::json(status, &ErrorResponse { error: err.to_string() })
}

/// JSON body → data URL → bytes → frame → prediction.
pub fn predict_body(body: &[u8], classifier: &Classifier) -> Result<Prediction> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| EmotionError::Request(format!("body is not valid JSON: {e}")))?;

    let image = match value.get("image") {
        Some(Value::String(s)) => s.as_str(),
        None | Some(Value::Null) => return Err(EmotionError::Request("missing \"image\" field".into())),
        Some(_) => return Err(EmotionError::Request("\"image\" must be a string".into())),
    };

    let bytes = data_url::decode(image)?;
    let frame = decode_frame(&bytes)?;
    classifier.predict_frame(&frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::config::ServerConfig;
    use crate::math::matrix::Matrix;
    use crate::network::Network;
    use crate::preprocess::TENSOR_LEN;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn neutral_state(config: ServerConfig) -> AppState {
        let mut net = Network::new(vec![(7, TENSOR_LEN, ActivationFunction::Softmax)]);
        net.layers[0].weights = Matrix::zeros(TENSOR_LEN, 7);
        net.layers[0].biases = Matrix::row(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
        AppState::new(Classifier::from_network(net).unwrap(), config)
    }

    fn png_data_url(color: [u8; 3]) -> String {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb(color)))
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .unwrap();
        data_url::encode("image/png", bytes.get_ref())
    }

    fn body_json(reply: &Reply) -> Value {
        serde_json::from_slice(&reply.body).unwrap()
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(to_percent(0.123456), 12.35);
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(0.0), 0.0);
    }

    #[test]
    fn valid_image_yields_emotion_and_confidence() {
        let state = neutral_state(ServerConfig::default());
        let body = serde_json::to_vec(&serde_json::json!({ "image": png_data_url([120, 60, 30]) })).unwrap();
        let reply = handle(&body, &state);
        assert_eq!(reply.status, 200);

        let json = body_json(&reply);
        assert_eq!(json["emotion"], "Neutral");
        let pct = json["confidence"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&pct));
    }

    #[test]
    fn malformed_base64_is_an_error_with_200() {
        let state = neutral_state(ServerConfig::default());
        let reply = handle(br#"{"image": "data:image/jpeg;base64,%%%"}"#, &state);
        assert_eq!(reply.status, 200);
        assert!(body_json(&reply)["error"].is_string());
    }

    #[test]
    fn every_bad_body_becomes_an_error_reply() {
        let state = neutral_state(ServerConfig::default());
        let cases: [&[u8]; 5] = [
            b"not json",
            br#"{}"#,
            br#"{"image": 42}"#,
            br#"{"image": "no-comma-here"}"#,
            br#"{"image": "data:image/png;base64,aGVsbG8="}"#,
        ];
        for body in cases {
            let json = body_json(&handle(body, &state));
            assert!(json.get("error").is_some(), "no error for {:?}", String::from_utf8_lossy(body));
            assert!(json.get("emotion").is_none());
        }
    }

    #[test]
    fn strict_mode_maps_bad_input_to_400() {
        let state = neutral_state(ServerConfig::default().with_strict_status(true));
        let reply = handle(br#"{"image": "data:image/jpeg;base64,%%%"}"#, &state);
        assert_eq!(reply.status, 400);
    }
}
