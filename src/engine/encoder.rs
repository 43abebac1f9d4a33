// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg) and PNG (image crate, default settings)

use crate::engine::common::run_with_panic_policy;
use crate::engine::MAX_DIMENSION;
use crate::error::PosterError;
use crate::ops::OutputFormat;
use image::{ImageFormat, RgbImage};
use mozjpeg::{ColorSpace, Compress};
use std::io::Cursor;

type EncoderResult<T> = std::result::Result<T, PosterError>;

/// Encode a composed canvas in the requested output format.
pub fn encode(img: &RgbImage, format: OutputFormat) -> EncoderResult<Vec<u8>> {
    match format {
        OutputFormat::Jpeg { quality } => encode_jpeg(img, quality),
        OutputFormat::Png => encode_png(img),
    }
}

/// Encode to baseline JPEG using mozjpeg.
///
/// # Arguments
/// * `img` - Image to encode
/// * `quality` - Quality (0-100), values above 100 are clamped
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let quality = quality.min(100);
        let (w, h) = img.dimensions();
        let pixels: &[u8] = img.as_raw();

        if w == 0 || h == 0 {
            return Err(PosterError::encode_failed(
                "jpeg",
                "image width or height is zero",
            ));
        }

        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(PosterError::dimension_exceeds_limit(
                w.max(h),
                MAX_DIMENSION,
            ));
        }

        let expected_len = (w as usize) * (h as usize) * 3;
        if pixels.len() != expected_len {
            return Err(PosterError::corrupted_image());
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(quality as f32);
        comp.set_optimize_coding(true);

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);

        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                PosterError::encode_failed(
                    "jpeg",
                    format!("mozjpeg: failed to start compress: {e:?}"),
                )
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    PosterError::encode_failed(
                        "jpeg",
                        format!("mozjpeg: failed to write scanlines: {e:?}"),
                    )
                })?;
            }

            writer.finish().map_err(|e| {
                PosterError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
            })?;
        }

        Ok(output)
    })
}

/// Encode to PNG using the image crate with its default compression.
pub fn encode_png(img: &RgbImage) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| PosterError::encode_failed("png", format!("PNG encode failed: {e}")))?;
        Ok(buf)
    })
}
