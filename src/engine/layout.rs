// src/engine/layout.rs
//
// Layout calculations: fill/contain resize dimensions and centering.
// Pure functions, no pixels involved.

use crate::engine::MAX_PIXELS;
use crate::error::{PosterError, Result};
use crate::ops::{CanvasSize, FitPolicy};

/// Source pixels Lanczos3 reads on either side of a sample when upscaling.
const LANCZOS3_SUPPORT: f64 = 3.0;

/// Resize dimensions for a source scaled against a canvas under `policy`.
///
/// Both policies keep the source aspect ratio: the axis that decides the fit is
/// set to the canvas exactly, the other is derived from the ratio and rounded.
/// Zero inputs are clamped to 1 so the function stays total; use
/// [`checked_resize_dimensions`] to reject them instead.
pub fn compute_resize_dimensions(
    source_width: u32,
    source_height: u32,
    canvas_width: u32,
    canvas_height: u32,
    policy: FitPolicy,
) -> (u32, u32) {
    let src_w = source_width.max(1);
    let src_h = source_height.max(1);
    let canvas_w = canvas_width.max(1);
    let canvas_h = canvas_height.max(1);

    let img_ratio = src_w as f64 / src_h as f64;
    let canvas_ratio = canvas_w as f64 / canvas_h as f64;

    // Fill pins the axis along which the image is relatively shorter,
    // contain pins the one along which it is relatively longer.
    let pin_height = match policy {
        FitPolicy::Fill => img_ratio > canvas_ratio,
        FitPolicy::Contain => img_ratio <= canvas_ratio,
    };

    if pin_height {
        let new_w = (canvas_h as f64 * img_ratio).round() as u32;
        (new_w.max(1), canvas_h)
    } else {
        let new_h = (canvas_w as f64 / img_ratio).round() as u32;
        (canvas_w, new_h.max(1))
    }
}

/// Same as [`compute_resize_dimensions`], but zero-sized inputs are an error.
pub fn checked_resize_dimensions(
    source: (u32, u32),
    canvas: (u32, u32),
    policy: FitPolicy,
) -> Result<(u32, u32)> {
    if source.0 == 0 || source.1 == 0 {
        return Err(PosterError::invalid_resize_dimensions(source.0, source.1));
    }
    if canvas.0 == 0 || canvas.1 == 0 {
        return Err(PosterError::invalid_resize_dimensions(canvas.0, canvas.1));
    }
    Ok(compute_resize_dimensions(
        source.0, source.1, canvas.0, canvas.1, policy,
    ))
}

/// Top-left offset that centers an `inner` rectangle in an `outer` one.
/// Odd leftovers go to the right/bottom edge.
pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let x = outer_w.saturating_sub(inner_w) / 2;
    let y = outer_h.saturating_sub(inner_h) / 2;
    (x, y)
}

/// Geometry of a single composition, resolved once per source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositionPlan {
    /// Source dimensions the plan was computed for
    pub source: (u32, u32),
    /// Effective canvas dimensions
    pub canvas: (u32, u32),
    /// Logical background size (fill); may exceed the canvas on one axis.
    /// Only [`background_window`](Self::background_window) is ever allocated.
    pub background: (u32, u32),
    /// Foreground size (contain); never exceeds the canvas
    pub foreground: (u32, u32),
    /// Where the foreground's top-left corner lands on the canvas
    pub foreground_offset: (u32, u32),
}

impl CompositionPlan {
    pub fn new(source_width: u32, source_height: u32, canvas_size: CanvasSize) -> Result<Self> {
        canvas_size.validate()?;
        let canvas = canvas_size.resolve(source_width, source_height);
        let source = (source_width, source_height);

        let background = checked_resize_dimensions(source, canvas, FitPolicy::Fill)?;
        let foreground = checked_resize_dimensions(source, canvas, FitPolicy::Contain)?;
        let foreground_offset = center_offset(foreground.0, foreground.1, canvas.0, canvas.1);

        Ok(Self {
            source,
            canvas,
            background,
            foreground,
            foreground_offset,
        })
    }

    /// Part of the fill background that can reach the canvas.
    ///
    /// The background is pasted at the origin and clipped, so only its top-left
    /// `canvas + blur margin` region is ever visible. The window keeps the fill
    /// scale but crops the source first, which bounds the allocation for
    /// extreme aspect ratios (a 32768x1 source would otherwise need a
    /// 35389440x1080 background).
    pub fn background_window(&self, blur_radius: f32) -> Result<BackgroundWindow> {
        let margin = blur_margin(blur_radius);
        let (src_w, tgt_w) = window_axis(self.source.0, self.background.0, self.canvas.0, margin);
        let (src_h, tgt_h) = window_axis(self.source.1, self.background.1, self.canvas.1, margin);

        let pixels = tgt_w as u64 * tgt_h as u64;
        if pixels > MAX_PIXELS {
            return Err(PosterError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
        }

        Ok(BackgroundWindow {
            source: (src_w, src_h),
            target: (tgt_w, tgt_h),
        })
    }
}

/// Top-left source crop and the size it is resized to for the background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackgroundWindow {
    pub source: (u32, u32),
    pub target: (u32, u32),
}

/// Canvas pixels past the visible edge that still feed the gaussian kernel.
fn blur_margin(radius: f32) -> u32 {
    if radius <= 0.0 {
        return 0;
    }
    (3.0 * radius as f64).ceil() as u32 + 1
}

/// (source span, resized span) along one axis.
fn window_axis(source: u32, background: u32, canvas: u32, margin: u32) -> (u32, u32) {
    let needed = canvas as u64 + margin as u64;
    if background as u64 <= needed {
        return (source, background);
    }

    let scale = background as f64 / source as f64;
    // Downscaling widens the filter footprint in source pixels
    let support = (LANCZOS3_SUPPORT * (1.0 / scale).max(1.0)).ceil();
    let span = (needed as f64 / scale).ceil() + support;
    if span >= source as f64 {
        return (source, background);
    }

    let span = span as u32;
    let target = ((span as f64 * scale).round() as u32).clamp(1, background);
    (span, target)
}
