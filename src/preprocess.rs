//! Frame decoding and the fixed preprocessing transform.
//!
//! Every frame goes through the same steps before classification: BT.601
//! grayscale, two-tap bilinear resize to 64×64 (OpenCV INTER_LINEAR
//! sampling), scale to [0, 1], reshape to
//! `[1, 64, 64, 1]` (batch, height, width, channel).

use image::{GrayImage, Luma, RgbImage};

use crate::error::{EmotionError, Result};

pub const INPUT_WIDTH: u32 = 64;
pub const INPUT_HEIGHT: u32 = 64;
pub const TENSOR_SHAPE: [usize; 4] = [1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 1];
pub const TENSOR_LEN: usize = (INPUT_WIDTH * INPUT_HEIGHT) as usize;

// Fixed-point BT.601 luma weights (scaled by 2^14), the same table OpenCV
// uses for its 8-bit color → gray conversion.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// The classifier input: row-major values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub shape: [usize; 4],
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decodes PNG/JPEG/BMP/GIF bytes into a 3-channel color frame.
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(EmotionError::EmptyFrame);
    }
    let frame = image::load_from_memory(bytes)?.to_rgb8();
    if frame.width() == 0 || frame.height() == 0 {
        return Err(EmotionError::EmptyFrame);
    }
    Ok(frame)
}

/// Luma of one RGB pixel, rounded the same way as the fixed-point table.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT;
    ((y + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

pub fn to_grayscale(frame: &RgbImage) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let [r, g, b] = frame.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}

/// Source taps for one destination axis: `(lower, upper, weight of upper)`.
///
/// Pixel centres map as `src = (dst + 0.5) * scale - 0.5`, clamped to the
/// edges, and only the two neighbouring samples contribute (no widening of
/// the kernel when shrinking), matching OpenCV's INTER_LINEAR.
fn linear_taps(src_len: u32, dst_len: u32) -> Vec<(u32, u32, f64)> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len.saturating_sub(1);
    (0..dst_len)
        .map(|d| {
            let pos = (d as f64 + 0.5) * scale - 0.5;
            let floor = pos.floor();
            if floor < 0.0 {
                (0, 0, 0.0)
            } else if floor >= last as f64 {
                (last, last, 0.0)
            } else {
                let i = floor as u32;
                (i, i + 1, pos - floor)
            }
        })
        .collect()
}

/// Bilinear resize of a grayscale image.
fn resize_linear(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let xs = linear_taps(src.width(), width);
    let ys = linear_taps(src.height(), height);
    let at = |x: u32, y: u32| src.get_pixel(x, y).0[0] as f64;

    GrayImage::from_fn(width, height, |x, y| {
        let (x0, x1, fx) = xs[x as usize];
        let (y0, y1, fy) = ys[y as usize];
        let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
        let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
        let value = top * (1.0 - fy) + bottom * fy;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Frame → classifier tensor.
pub fn preprocess_frame(frame: &RgbImage) -> Result<Tensor> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(EmotionError::EmptyFrame);
    }

    let gray = to_grayscale(frame);
    let face = resize_linear(&gray, INPUT_WIDTH, INPUT_HEIGHT);
    let data: Vec<f64> = face.pixels().map(|p| p.0[0] as f64 / 255.0).collect();

    if data.len() != TENSOR_LEN {
        return Err(EmotionError::Shape { expected: TENSOR_LEN, actual: data.len() });
    }
    Ok(Tensor { shape: TENSOR_SHAPE, data })
}
