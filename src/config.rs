// src/config.rs
//
// Processing parameters, validated once at the boundary before any image is touched.

use crate::error::{PosterError, Result};
use crate::ops::CanvasSize;

pub const DEFAULT_BLUR_RADIUS: f32 = 10.0;
pub const DEFAULT_DARKEN_FACTOR: f32 = 1.0;

/// Parameters shared by every image in a batch.
///
/// Construct through [`ProcessingParams::new`]; the fields are private so a
/// value of this type is always valid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessingParams {
    canvas_size: CanvasSize,
    blur_radius: f32,
    darken_factor: f32,
}

impl ProcessingParams {
    /// * `blur_radius` - Gaussian sigma for the background, `0` disables blurring
    /// * `darken_factor` - background brightness multiplier, `1.0` unchanged, `0.0` black
    pub fn new(canvas_size: CanvasSize, blur_radius: f32, darken_factor: f32) -> Result<Self> {
        canvas_size.validate()?;
        validate_blur_radius(blur_radius)?;
        validate_darken_factor(darken_factor)?;
        Ok(Self {
            canvas_size,
            blur_radius,
            darken_factor,
        })
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas_size
    }

    pub fn blur_radius(&self) -> f32 {
        self.blur_radius
    }

    pub fn darken_factor(&self) -> f32 {
        self.darken_factor
    }
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            canvas_size: CanvasSize::default(),
            blur_radius: DEFAULT_BLUR_RADIUS,
            darken_factor: DEFAULT_DARKEN_FACTOR,
        }
    }
}

pub(crate) fn validate_blur_radius(radius: f32) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(PosterError::invalid_argument(
            "blur_radius",
            radius.to_string(),
            "blur radius must be a finite, non-negative number",
        ));
    }
    Ok(())
}

pub(crate) fn validate_darken_factor(factor: f32) -> Result<()> {
    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&factor) {
        return Err(PosterError::invalid_argument(
            "darken_factor",
            factor.to_string(),
            "darken factor must be within [0, 1] (1 = unchanged, 0 = black)",
        ));
    }
    Ok(())
}
