use std::ops::ControlFlow;

use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

/// Configuration for camera capture.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    device: String,
    width: u32,
    height: u32,
    buffer_count: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            buffer_count: 4,
        }
    }
}

impl CameraConfig {
    /// Set the device path (e.g., "/dev/video0").
    pub fn with_device(mut self, device: String) -> Self {
        self.device = device;
        self
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Opens the device in MJPEG mode and hands every captured JPEG frame to
/// `on_frame` until it returns `Break`.
pub fn capture<F>(config: &CameraConfig, mut on_frame: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnMut(&[u8]) -> ControlFlow<()>,
{
    let device = Device::with_path(config.device())?;

    let format = Format::new(config.width(), config.height(), FourCC::new(b"MJPG"));
    let format = Capture::set_format(&device, &format)?;
    if format.fourcc != FourCC::new(b"MJPG") {
        return Err(format!("{} does not support MJPEG capture", config.device()).into());
    }
    log::info!("Camera {} opened at {}x{}", config.device(), format.width, format.height);

    let mut stream = MmapStream::with_buffers(&device, Type::VideoCapture, config.buffer_count)?;
    loop {
        let (jpeg, _meta) = CaptureStream::next(&mut stream)?;
        if on_frame(jpeg).is_break() {
            return Ok(());
        }
    }
}
