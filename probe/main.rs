//! camera-probe
//!
//! Manual test driver for the emotion API. Captures webcam frames, posts each
//! one to `/predict`, and shows the frame with the result on screen.
//!
//! Run with:
//!   cargo run --features probe --bin camera-probe -- [URL] [DEVICE]
//! Defaults: http://127.0.0.1:5000/predict, /dev/video0. Press q or Esc to quit.

mod camera;
mod overlay;

use std::ops::ControlFlow;

use minifb::{Key, Window, WindowOptions};
use serde_json::{json, Value};

use emotion_nn::logging::init_stdout_logger;
use emotion_nn::server::util::data_url;

use camera::CameraConfig;
use overlay::Outcome;

const DEFAULT_URL: &str = "http://127.0.0.1:5000/predict";
const TITLE: &str = "Real-Time Emotion Detection";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_stdout_logger();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| DEFAULT_URL.to_string());
    let config = match args.next() {
        Some(device) => CameraConfig::default().with_device(device),
        None => CameraConfig::default(),
    };

    log::info!("Starting real-time emotion detection against {} (press q to quit)", url);

    let client = reqwest::blocking::Client::new();
    let mut window = Window::new(
        TITLE,
        config.width() as usize,
        config.height() as usize,
        WindowOptions::default(),
    )?;

    let mut failure: Option<Box<dyn std::error::Error>> = None;
    camera::capture(&config, |jpeg| {
        if !window.is_open() || window.is_key_down(Key::Q) || window.is_key_down(Key::Escape) {
            return ControlFlow::Break(());
        }

        let outcome = post_frame(&client, &url, jpeg);
        let label = overlay::label_for(&outcome);
        log::debug!("{}", label);

        let frame = match image::load_from_memory(jpeg) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                log::warn!("Failed to decode camera frame: {}", e);
                return ControlFlow::Continue(());
            }
        };
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let mut rgb = frame.into_raw();
        overlay::draw_confidence_bar(&mut rgb, w, h, &outcome);

        window.set_title(&format!("{} - {}", TITLE, label));
        if let Err(e) = window.update_with_buffer(&overlay::rgb_to_argb(&rgb), w, h) {
            failure = Some(e.into());
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// One POST to the endpoint. No retries; every failure is just an outcome.
fn post_frame(client: &reqwest::blocking::Client, url: &str, jpeg: &[u8]) -> Outcome {
    let body = json!({ "image": data_url::encode("image/jpeg", jpeg) });
    let resp = match client.post(url).json(&body).send() {
        Ok(resp) => resp,
        Err(e) => return Outcome::Transport(e.to_string()),
    };
    let status = resp.status().as_u16();
    match resp.json::<Value>() {
        Ok(body) => Outcome::Reply { status, body },
        Err(_) if status != 200 => Outcome::Reply { status, body: Value::Null },
        Err(e) => Outcome::Transport(e.to_string()),
    }
}
