use serde_json::Value;

/// What one round trip to `/predict` produced.
#[derive(Debug)]
pub enum Outcome {
    /// The server answered; status and parsed JSON body.
    Reply { status: u16, body: Value },
    /// The request never completed.
    Transport(String),
}

/// Text shown for one frame. Never fails: anything unexpected becomes
/// an error label and the loop carries on.
pub fn label_for(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Reply { status: 200, body } if body.get("error").is_none() => {
            let emotion = body.get("emotion").and_then(Value::as_str).unwrap_or("Unknown");
            let confidence = body.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
            format!("{} ({:.1}%)", emotion, confidence)
        }
        Outcome::Reply { .. } => "Error".to_string(),
        Outcome::Transport(msg) => format!("Error: {}", msg),
    }
}

/// Confidence percentage for the bar, 0 when there is none.
pub fn confidence_of(outcome: &Outcome) -> f64 {
    match outcome {
        Outcome::Reply { status: 200, body } => {
            body.get("confidence").and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Draws a filled rectangle into an HWC RGB buffer, clipped to bounds.
pub fn fill_rect(buf: &mut [u8], width: usize, height: usize, x: usize, y: usize, w: usize, h: usize, color: [u8; 3]) {
    for row in y..(y + h).min(height) {
        for col in x..(x + w).min(width) {
            let idx = (row * width + col) * 3;
            buf[idx..idx + 3].copy_from_slice(&color);
        }
    }
}

/// Confidence bar at the top-left of the frame: a dark track with a green
/// fill proportional to the percentage, or a red block on error.
pub fn draw_confidence_bar(buf: &mut [u8], width: usize, height: usize, outcome: &Outcome) {
    const X: usize = 20;
    const Y: usize = 30;
    const TRACK: usize = 200;
    const THICK: usize = 16;

    fill_rect(buf, width, height, X, Y, TRACK, THICK, [40, 40, 40]);
    match outcome {
        Outcome::Reply { status: 200, body } if body.get("error").is_none() => {
            let filled = (confidence_of(outcome) / 100.0 * TRACK as f64).round() as usize;
            fill_rect(buf, width, height, X, Y, filled, THICK, [0, 255, 0]);
        }
        _ => fill_rect(buf, width, height, X, Y, THICK, THICK, [255, 0, 0]),
    }
}

/// Convert HWC RGB buffer to packed ARGB u32 for minifb.
pub fn rgb_to_argb(buf: &[u8]) -> Vec<u32> {
    buf.chunks_exact(3)
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_label_has_one_decimal() {
        let outcome = Outcome::Reply { status: 200, body: json!({"emotion": "Happy", "confidence": 87.456}) };
        assert_eq!(label_for(&outcome), "Happy (87.5%)");
    }

    #[test]
    fn failures_become_error_labels() {
        let non_200 = Outcome::Reply { status: 500, body: json!({}) };
        assert_eq!(label_for(&non_200), "Error");
        let error_body = Outcome::Reply { status: 200, body: json!({"error": "bad"}) };
        assert_eq!(label_for(&error_body), "Error");
        let transport = Outcome::Transport("connection refused".into());
        assert_eq!(label_for(&transport), "Error: connection refused");
    }

    #[test]
    fn bar_is_clipped_to_the_frame() {
        let (w, h) = (50, 40);
        let mut buf = vec![0u8; w * h * 3];
        let outcome = Outcome::Reply { status: 200, body: json!({"emotion": "Sad", "confidence": 100.0}) };
        draw_confidence_bar(&mut buf, w, h, &outcome);
        let idx = (35 * w + 49) * 3;
        assert_eq!(&buf[idx..idx + 3], &[0, 255, 0]);
    }

    #[test]
    fn argb_packs_channels() {
        assert_eq!(rgb_to_argb(&[1, 2, 3, 255, 0, 0]), vec![0x010203, 0xff0000]);
    }
}
