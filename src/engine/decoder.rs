// src/engine/decoder.rs
//
// Decoder operations: JPEG (mozjpeg) and PNG (zune-png).

use crate::engine::common::run_with_panic_policy;
use crate::error::PosterError;
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, ImageReader, RgbImage, RgbaImage,
};
use mozjpeg::Decompress;
use std::io::Cursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};

type DecoderResult<T> = std::result::Result<T, PosterError>;

/// Decode JPEG using mozjpeg (backed by libjpeg-turbo)
pub fn decode_jpeg_mozjpeg(data: &[u8]) -> DecoderResult<DynamicImage> {
    run_with_panic_policy("decode:mozjpeg", || {
        if !data.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
            return Err(PosterError::decode_failed(
                "mozjpeg: missing JPEG EOI marker",
            ));
        }

        let decompress = Decompress::new_mem(data).map_err(|e| {
            PosterError::decode_failed(format!("mozjpeg decompress init failed: {e:?}"))
        })?;

        let mut decompress = decompress.rgb().map_err(|e| {
            PosterError::decode_failed(format!("mozjpeg rgb conversion failed: {e:?}"))
        })?;

        let width = decompress.width();
        let height = decompress.height();
        if width > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
            return Err(PosterError::dimension_exceeds_limit(
                width.max(height) as u32,
                MAX_DIMENSION,
            ));
        }
        let width_u32 = width as u32;
        let height_u32 = height as u32;
        check_dimensions(width_u32, height_u32)?;

        let pixels: Vec<[u8; 3]> = decompress.read_scanlines().map_err(|e| {
            PosterError::decode_failed(format!("mozjpeg: failed to read scanlines: {e:?}"))
        })?;

        let flat_pixels: Vec<u8> = pixels.into_iter().flatten().collect();

        let rgb_image =
            RgbImage::from_raw(width_u32, height_u32, flat_pixels).ok_or_else(|| {
                PosterError::decode_failed("mozjpeg: failed to create image from raw data")
            })?;

        Ok(DynamicImage::ImageRgb8(rgb_image))
    })
}

/// Decode PNG using zune-png. 16-bit input is stripped to 8-bit.
pub fn decode_png_zune(data: &[u8]) -> DecoderResult<DynamicImage> {
    run_with_panic_policy("decode:png", || {
        let options = DecoderOptions::default().png_set_strip_to_8bit(true);
        let mut decoder = PngDecoder::new_with_options(zune_core::bytestream::ZCursor::new(data), options);
        let pixels = decoder
            .decode()
            .map_err(|e| PosterError::decode_failed(format!("png: decode failed: {e}")))?;

        let info = decoder
            .info()
            .ok_or_else(|| PosterError::decode_failed("png: missing header info"))?;

        let width = info.width as u32;
        let height = info.height as u32;
        check_dimensions(width, height)?;

        let buf = match pixels {
            zune_core::result::DecodingResult::U8(v) => v,
            _ => {
                return Err(PosterError::decode_failed(
                    "png: unexpected non-U8 pixel buffer",
                ))
            }
        };

        let colorspace = decoder
            .colorspace()
            .ok_or_else(|| PosterError::decode_failed("png: missing colorspace"))?;

        let img = match colorspace {
            ColorSpace::RGB => RgbImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| PosterError::decode_failed("png: failed to build RGB image"))?,
            ColorSpace::RGBA => RgbaImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| PosterError::decode_failed("png: failed to build RGBA image"))?,
            ColorSpace::Luma => GrayImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| PosterError::decode_failed("png: failed to build Luma image"))?,
            ColorSpace::LumaA => GrayAlphaImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageLumaA8)
                .ok_or_else(|| PosterError::decode_failed("png: failed to build LumaA image"))?,
            other => {
                return Err(PosterError::decode_failed(format!(
                    "png: unsupported colorspace {:?}",
                    other
                )))
            }
        };

        Ok(img)
    })
}

/// Detect input format using magic bytes. Returns None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Unified decode entrypoint.
///
/// The format comes from the magic bytes, never the file name, so a PNG saved
/// as `.jpg` still decodes. Header dimensions are checked before any pixel
/// buffer is allocated.
pub fn decode_image(bytes: &[u8]) -> DecoderResult<(DynamicImage, ImageFormat)> {
    if bytes.is_empty() {
        return Err(PosterError::decode_failed("empty input"));
    }
    let detected = detect_format(bytes)
        .ok_or_else(|| PosterError::decode_failed("unrecognized image data"))?;
    ensure_dimensions_safe(bytes)?;

    let img = match detected {
        ImageFormat::Jpeg => decode_jpeg_mozjpeg(bytes)?,
        ImageFormat::Png => decode_png_zune(bytes)?,
        other => {
            return Err(PosterError::unsupported_format(
                format!("{other:?}").to_lowercase(),
            ))
        }
    };
    Ok((img, detected))
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> DecoderResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(PosterError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(PosterError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Inspect encoded bytes and ensure the image dimensions are safe before decoding.
pub fn ensure_dimensions_safe(bytes: &[u8]) -> DecoderResult<()> {
    let cursor = Cursor::new(bytes);
    if let Ok(reader) = ImageReader::new(cursor).with_guessed_format() {
        if let Ok((width, height)) = reader.into_dimensions() {
            return check_dimensions(width, height);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, Rgba};

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |_, _| Rgb([0, 0, 0]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([9, 8, 7])))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[test]
    fn test_ensure_dimensions_safe_allows_small_image() {
        let data = encode_png(64, 64);
        assert!(ensure_dimensions_safe(&data).is_ok());
    }

    #[test]
    fn test_ensure_dimensions_safe_rejects_large_image() {
        let width = MAX_DIMENSION + 1;
        let data = encode_png(width, 1);
        let err = ensure_dimensions_safe(&data).unwrap_err();
        assert!(matches!(err, PosterError::DimensionExceedsLimit { .. }));
    }

    #[test]
    fn test_check_dimensions_limits() {
        assert!(check_dimensions(1, 1).is_ok());
        assert!(check_dimensions(MAX_DIMENSION, 1).is_ok());
        assert!(matches!(
            check_dimensions(MAX_DIMENSION + 1, 1),
            Err(PosterError::DimensionExceedsLimit { .. })
        ));
        assert!(matches!(
            check_dimensions(20_000, 20_000),
            Err(PosterError::PixelCountExceedsLimit { .. })
        ));
    }

    #[test]
    fn test_detect_format_jpeg_and_png() {
        assert_eq!(detect_format(&encode_png(2, 2)), Some(ImageFormat::Png));
        assert_eq!(detect_format(&encode_jpeg(2, 2)), Some(ImageFormat::Jpeg));
        assert_eq!(detect_format(b"not an image"), None);
    }

    #[test]
    fn test_decode_image_routes_png_to_zune() {
        let png = encode_png(3, 1);
        let (img, fmt) = decode_image(&png).unwrap();
        assert_eq!(fmt, ImageFormat::Png);
        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_decode_png_with_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 128]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        let (decoded, _) = decode_image(&buf).unwrap();
        assert_eq!(decoded.to_rgba8().get_pixel(1, 1).0, [1, 2, 3, 128]);
    }

    #[test]
    fn test_decode_image_routes_jpeg_to_mozjpeg() {
        let (img, fmt) = decode_image(&encode_jpeg(2, 2)).unwrap();
        assert_eq!(fmt, ImageFormat::Jpeg);
        assert_eq!(img.dimensions(), (2, 2));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PosterError::DecodeFailed { .. }));
        let err = decode_image(&[]).unwrap_err();
        assert!(matches!(err, PosterError::DecodeFailed { .. }));
    }

    #[test]
    fn test_decode_truncated_jpeg_fails() {
        let jpeg = encode_jpeg(16, 16);
        let truncated = &jpeg[..jpeg.len() / 2];
        assert!(decode_image(truncated).is_err());
    }
}
