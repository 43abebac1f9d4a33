// src/engine/compositor.rs
//
// Poster composition: blurred fill background + centered contain foreground.

use crate::config::{validate_blur_radius, validate_darken_factor, ProcessingParams};
use crate::engine::layout::CompositionPlan;
use crate::engine::pipeline::{
    crop_top_left, darken, gaussian_blur, paste_opaque, resize_rgb, to_rgb8, white_canvas,
};
use crate::error::Result;
use crate::ops::CanvasSize;
use image::{DynamicImage, RgbImage};
use tracing::debug;

/// Compose `source` onto a canvas of `canvas_size`.
///
/// 1. Resolve the effective canvas (source size in `Original` mode)
/// 2. Background: fill resize of the visible window only, blur by
///    `blur_radius`, darken by `darken_factor`
/// 3. Paste the background at the origin, clipped to the canvas
/// 4. Foreground: contain resize, pasted centered with an opaque mask
///
/// Arguments are validated before any pixel work, so an invalid darken factor
/// never allocates a canvas.
pub fn compose(
    source: &DynamicImage,
    canvas_size: CanvasSize,
    blur_radius: f32,
    darken_factor: f32,
) -> Result<RgbImage> {
    canvas_size.validate()?;
    validate_blur_radius(blur_radius)?;
    validate_darken_factor(darken_factor)?;

    let plan = CompositionPlan::new(source.width(), source.height(), canvas_size)?;
    debug!(
        src_width = source.width(),
        src_height = source.height(),
        canvas_width = plan.canvas.0,
        canvas_height = plan.canvas.1,
        "compose"
    );

    // Alpha is dropped here: the output is always opaque
    let rgb = to_rgb8(source.clone());
    compose_planned(rgb, &plan, blur_radius, darken_factor)
}

/// [`compose`] with parameters that were already validated.
pub fn compose_with(source: &DynamicImage, params: &ProcessingParams) -> Result<RgbImage> {
    compose(
        source,
        params.canvas_size(),
        params.blur_radius(),
        params.darken_factor(),
    )
}

fn compose_planned(
    rgb: RgbImage,
    plan: &CompositionPlan,
    blur_radius: f32,
    darken_factor: f32,
) -> Result<RgbImage> {
    let window = plan.background_window(blur_radius)?;
    let (canvas_w, canvas_h) = plan.canvas;
    let mut canvas = white_canvas(canvas_w, canvas_h);

    let background_source = if window.source == plan.source {
        rgb.clone()
    } else {
        debug!(
            crop_width = window.source.0,
            crop_height = window.source.1,
            "cropping source to visible background"
        );
        crop_top_left(&rgb, window.source.0, window.source.1)
    };
    let background = resize_rgb(background_source, window.target.0, window.target.1)?;
    let mut background = gaussian_blur(background, blur_radius);
    darken(&mut background, darken_factor)?;
    paste_opaque(&mut canvas, &background, 0, 0);
    drop(background);

    let foreground = resize_rgb(rgb, plan.foreground.0, plan.foreground.1)?;
    let (fg_x, fg_y) = plan.foreground_offset;
    paste_opaque(&mut canvas, &foreground, fg_x, fg_y);

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PosterError;
    use image::{Rgb, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_output_has_fixed_canvas_size() {
        let img = create_test_image(200, 100);
        let out = compose(&img, CanvasSize::fixed(108, 108), 1.0, 0.5).unwrap();
        assert_eq!(out.dimensions(), (108, 108));
    }

    #[test]
    fn test_landscape_foreground_is_centered_vertically() {
        // Solid red source so foreground pixels are recognisable; background is
        // darkened to black so the band boundaries are sharp.
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([255, 0, 0])));
        let out = compose(&img, CanvasSize::fixed(100, 100), 0.0, 0.0).unwrap();

        let is_red = |p: &Rgb<u8>| p[0] >= 250 && p[1] <= 5 && p[2] <= 5;

        // Foreground 100x50 at (0, 25)
        assert_eq!(out.get_pixel(50, 10).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(50, 24).0, [0, 0, 0]);
        assert!(is_red(out.get_pixel(50, 25)));
        assert!(is_red(out.get_pixel(50, 74)));
        assert_eq!(out.get_pixel(50, 75).0, [0, 0, 0]);
    }

    #[test]
    fn test_original_size_reproduces_source() {
        let img = create_test_image(80, 60);
        let out = compose(&img, CanvasSize::Original, 3.0, 0.2).unwrap();
        assert_eq!(out.dimensions(), (80, 60));
        // Foreground covers the whole canvas untouched
        assert_eq!(out, img.to_rgb8());
    }

    #[test]
    fn test_background_fully_overwrites_canvas() {
        // Matching aspect ratio leaves no uncovered area, so no white survives
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([10, 20, 30])));
        let out = compose(&img, CanvasSize::fixed(30, 30), 0.0, 1.0).unwrap();
        assert!(out.pixels().all(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn test_transparent_source_is_flattened() {
        let rgba = RgbaImage::from_pixel(10, 10, image::Rgba([5, 6, 7, 0]));
        let out = compose(
            &DynamicImage::ImageRgba8(rgba),
            CanvasSize::Original,
            0.0,
            1.0,
        )
        .unwrap();
        assert!(out.pixels().all(|p| p.0 == [5, 6, 7]));
    }

    #[test]
    fn test_rejects_invalid_arguments() {
        let img = create_test_image(10, 10);
        for (canvas, blur, factor) in [
            (CanvasSize::fixed(10, 10), 1.0, -0.1),
            (CanvasSize::fixed(10, 10), 1.0, 1.1),
            (CanvasSize::fixed(10, 10), -1.0, 1.0),
            (CanvasSize::fixed(0, 10), 1.0, 1.0),
        ] {
            let err = compose(&img, canvas, blur, factor).unwrap_err();
            assert!(
                matches!(err, PosterError::InvalidArgument { .. }),
                "{canvas:?} {blur} {factor}: {err:?}"
            );
        }
    }

    #[test]
    fn test_extreme_aspect_sources_compose_without_full_background() {
        // Full fill backgrounds here would be over a million pixels wide or tall
        for (w, h) in [(20_000, 2), (2, 20_000)] {
            let img = create_test_image(w, h);
            let out = compose(&img, CanvasSize::fixed(108, 108), 10.0, 0.5).unwrap();
            assert_eq!(out.dimensions(), (108, 108));
            // The background still covers every canvas pixel
            assert!(out.pixels().all(|p| p.0 != [255, 255, 255]));
        }
    }

    #[test]
    fn test_cropped_window_matches_full_background_near_origin() {
        // Small enough to also build the full background for comparison
        let img = create_test_image(400, 20);
        let plan = CompositionPlan::new(400, 20, CanvasSize::fixed(30, 30)).unwrap();
        let window = plan.background_window(0.0).unwrap();
        assert!(window.source.0 < 400);

        let out = compose(&img, CanvasSize::fixed(30, 30), 0.0, 1.0).unwrap();
        let full = resize_rgb(img.to_rgb8(), plan.background.0, plan.background.1).unwrap();
        // Top-left corner is background in both
        let a = out.get_pixel(0, 0).0;
        let b = full.get_pixel(0, 0).0;
        for (x, y) in a.iter().zip(b) {
            assert!(x.abs_diff(y) <= 2, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_compose_with_params() {
        let img = create_test_image(30, 60);
        let params = ProcessingParams::new(CanvasSize::fixed(40, 20), 0.0, 1.0).unwrap();
        let out = compose_with(&img, &params).unwrap();
        assert_eq!(out.dimensions(), (40, 20));
    }
}
