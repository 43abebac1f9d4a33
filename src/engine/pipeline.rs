// src/engine/pipeline.rs
//
// Pixel stages of a composition: resize, blur, darken, canvas and paste.
// Everything works on 8-bit RGB; alpha is dropped when the source is normalized.

use crate::config::validate_darken_factor;
use crate::error::PosterError;
use fast_image_resize::{self as fir, ImageBufferError, PixelType, ResizeOptions};
use image::{imageops, imageops::FilterType, DynamicImage, Rgb, RgbImage};
use tracing::debug;

type PipelineResult<T> = std::result::Result<T, PosterError>;

/// Canvas background before any layer is pasted.
pub const CANVAS_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug)]
pub struct ResizeError {
    pub source_dims: (u32, u32),
    pub target_dims: (u32, u32),
    pub reason: String,
}

impl ResizeError {
    pub fn new(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source_dims,
            target_dims,
            reason: reason.into(),
        }
    }

    pub fn into_poster_error(self) -> PosterError {
        PosterError::resize_failed(self.source_dims, self.target_dims, self.reason)
    }
}

impl From<ResizeError> for PosterError {
    fn from(err: ResizeError) -> Self {
        err.into_poster_error()
    }
}

/// Normalize any decoded image to opaque RGB8.
///
/// Zero-copy when the image is already RGB8.
pub fn to_rgb8(img: DynamicImage) -> RgbImage {
    match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

fn default_resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// Lanczos3 resize of an owned RGB image.
///
/// Returns the input untouched when the target matches its size.
pub fn resize_rgb(
    img: RgbImage,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<RgbImage, ResizeError> {
    let (src_width, src_height) = img.dimensions();

    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(ResizeError::new(
            (src_width, src_height),
            (dst_width, dst_height),
            "invalid dimensions for resize",
        ));
    }

    if (src_width, src_height) == (dst_width, dst_height) {
        return Ok(img);
    }

    debug!(src_width, src_height, dst_width, dst_height, "resize (lanczos3)");

    // Ownership transfer, no copy
    let src_pixels = img.into_raw();
    resize_rgb_pixels(src_width, src_height, src_pixels, dst_width, dst_height)
        .map_err(|reason| ResizeError::new((src_width, src_height), (dst_width, dst_height), reason))
}

fn resize_rgb_pixels(
    src_width: u32,
    src_height: u32,
    mut src_pixels: Vec<u8>,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<RgbImage, String> {
    let pixel_type = PixelType::U8x3;
    let required_bytes = (src_width as usize)
        .checked_mul(src_height as usize)
        .and_then(|count| count.checked_mul(pixel_type.size()))
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;

    if src_pixels.len() < required_bytes {
        return Err(format!(
            "fir source image invalid buffer size. expected {required_bytes} bytes, got {} bytes",
            src_pixels.len()
        ));
    }

    let primary_result = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => resize_with_source_image(src_image, dst_width, dst_height),
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let aligned = copy_pixels_to_aligned_image(
                src_width,
                src_height,
                &src_pixels,
                required_bytes,
            )?;
            resize_with_source_image(aligned, dst_width, dst_height)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match primary_result {
        Ok(img) => Ok(img),
        Err(err) => {
            debug!(%err, "fir resize failed, falling back to image crate");
            resize_with_image_crate_fallback(src_pixels, src_width, src_height, dst_width, dst_height)
                .map_err(|fallback_err| {
                    format!("{err}; image crate fallback failed: {fallback_err}")
                })
        }
    }
}

fn copy_pixels_to_aligned_image(
    width: u32,
    height: u32,
    src_pixels: &[u8],
    required_bytes: usize,
) -> std::result::Result<fir::images::Image<'static>, String> {
    let mut aligned_image = fir::images::Image::new(width, height, PixelType::U8x3);
    let aligned_buffer = aligned_image.buffer_mut();
    if aligned_buffer.len() != required_bytes {
        return Err(format!(
            "fir alignment fallback buffer mismatch. expected {required_bytes} bytes, got {} bytes",
            aligned_buffer.len()
        ));
    }
    aligned_buffer.copy_from_slice(&src_pixels[..required_bytes]);
    Ok(aligned_image)
}

fn resize_with_source_image(
    src_image: fir::images::Image<'_>,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<RgbImage, String> {
    // RGB has no alpha, so no premultiply/unpremultiply pass
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, PixelType::U8x3);

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &default_resize_options())
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    RgbImage::from_raw(dst_width, dst_height, dst_image.into_vec())
        .ok_or_else(|| "failed to create rgb image from resized data".to_string())
}

fn resize_with_image_crate_fallback(
    src_pixels: Vec<u8>,
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<RgbImage, String> {
    let rgb = RgbImage::from_raw(src_width, src_height, src_pixels)
        .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
    Ok(imageops::resize(
        &rgb,
        dst_width,
        dst_height,
        FilterType::Lanczos3,
    ))
}

/// Copy of the `width` x `height` region at the origin, clamped to the image.
pub fn crop_top_left(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::crop_imm(img, 0, 0, width.min(img.width()), height.min(img.height())).to_image()
}

/// Gaussian blur with standard deviation `radius`. A radius of 0 is a passthrough.
pub fn gaussian_blur(img: RgbImage, radius: f32) -> RgbImage {
    if radius <= 0.0 {
        return img;
    }
    debug!(
        width = img.width(),
        height = img.height(),
        radius,
        "gaussian blur"
    );
    imageops::blur(&img, radius)
}

/// Scale every channel by `factor` in place.
///
/// `1.0` leaves the image untouched, `0.0` turns it black. Factors outside
/// `[0, 1]` are rejected before any pixel is modified.
pub fn darken(img: &mut RgbImage, factor: f32) -> PipelineResult<()> {
    validate_darken_factor(factor)?;
    if factor >= 1.0 {
        return Ok(());
    }
    debug!(width = img.width(), height = img.height(), factor, "darken");
    for channel in img.iter_mut() {
        *channel = (*channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
    }
    Ok(())
}

/// Fresh opaque canvas filled with [`CANVAS_BACKGROUND`].
pub fn white_canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, CANVAS_BACKGROUND)
}

/// Paste `layer` onto `canvas` at `(x, y)` with a fully opaque mask.
///
/// Layer pixels replace canvas pixels; whatever falls outside the canvas is
/// clipped, so an overflowing fill background is fine.
pub fn paste_opaque(canvas: &mut RgbImage, layer: &RgbImage, x: u32, y: u32) {
    imageops::replace(canvas, layer, i64::from(x), i64::from(y));
}
