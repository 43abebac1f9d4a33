// src/ops.rs
//
// Composition vocabulary: fit policies, canvas sizes and output formats.
// All of these are small Copy values; the pixel work happens in engine/.

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::PosterError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// JPEG quality used for every JPEG output.
pub const JPEG_QUALITY: u8 = 95;

/// How a source image is scaled against the canvas. Both keep the aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FitPolicy {
    /// Cover the whole canvas; one axis may overflow (object-fit: cover).
    Fill,
    /// Fit entirely inside the canvas; one axis may underflow (object-fit: contain).
    Contain,
}

/// Target canvas dimensions for a composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasSize {
    Fixed { width: u32, height: u32 },
    /// Use the source image's own dimensions.
    Original,
}

impl CanvasSize {
    pub fn fixed(width: u32, height: u32) -> Self {
        Self::Fixed { width, height }
    }

    /// Square preset: 1080x1080
    /// Use case: feed posts
    pub fn square() -> Self {
        Self::fixed(1080, 1080)
    }

    /// Landscape preset: 1350x1080
    pub fn landscape() -> Self {
        Self::fixed(1350, 1080)
    }

    /// Get the built-in preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "square" => Some(Self::square()),
            "landscape" => Some(Self::landscape()),
            "original" => Some(Self::Original),
            _ => None,
        }
    }

    /// Effective canvas dimensions for a source of `src_width` x `src_height`.
    pub fn resolve(&self, src_width: u32, src_height: u32) -> (u32, u32) {
        match *self {
            Self::Fixed { width, height } => (width, height),
            Self::Original => (src_width, src_height),
        }
    }

    /// Rejects fixed sizes with a zero side or beyond the decoder's size limits.
    pub fn validate(&self) -> crate::error::Result<()> {
        let Self::Fixed { width, height } = *self else {
            return Ok(());
        };
        let reason = if width == 0 || height == 0 {
            "canvas dimensions must be positive".to_string()
        } else if width > MAX_DIMENSION || height > MAX_DIMENSION {
            format!("canvas sides must not exceed {MAX_DIMENSION}")
        } else if width as u64 * height as u64 > MAX_PIXELS {
            format!("canvas must not exceed {MAX_PIXELS} pixels")
        } else {
            return Ok(());
        };
        Err(PosterError::invalid_argument(
            "canvas",
            format!("{width}x{height}"),
            reason,
        ))
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::square()
    }
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { width, height } => write!(f, "{width}x{height}"),
            Self::Original => f.write_str("original"),
        }
    }
}

/// Accepts a preset name (`square`, `landscape`, `original`) or `WIDTHxHEIGHT`.
impl FromStr for CanvasSize {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(preset) = Self::preset(trimmed) {
            return Ok(preset);
        }

        let invalid = || {
            PosterError::invalid_argument(
                "canvas",
                trimmed.to_string(),
                "expected WIDTHxHEIGHT, square, landscape or original",
            )
        };

        let (w, h) = trimmed
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;

        let size = Self::fixed(width, height);
        size.validate()?;
        Ok(size)
    }
}

/// Output format for encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    /// Maps a source extension to its output codec: jpg/jpeg (any case) are
    /// re-encoded as JPEG, everything else becomes PNG.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg {
                quality: JPEG_QUALITY,
            },
            _ => Self::Png,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Png)
    }

    /// Lowercase extension written after `.processed.`
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpeg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PosterError;

    mod canvas_size_tests {
        use super::*;

        #[test]
        fn test_presets() {
            assert_eq!(CanvasSize::preset("square"), Some(CanvasSize::fixed(1080, 1080)));
            assert_eq!(
                CanvasSize::preset("LANDSCAPE"),
                Some(CanvasSize::fixed(1350, 1080))
            );
            assert_eq!(CanvasSize::preset("original"), Some(CanvasSize::Original));
            assert_eq!(CanvasSize::preset("banner"), None);
        }

        #[test]
        fn test_resolve_fixed_ignores_source() {
            assert_eq!(CanvasSize::fixed(1080, 1080).resolve(800, 600), (1080, 1080));
        }

        #[test]
        fn test_resolve_original_uses_source() {
            assert_eq!(CanvasSize::Original.resolve(800, 600), (800, 600));
        }

        #[test]
        fn test_parse_dimensions() {
            assert_eq!(
                "1350x1080".parse::<CanvasSize>().unwrap(),
                CanvasSize::fixed(1350, 1080)
            );
            assert_eq!(
                " 640X480 ".parse::<CanvasSize>().unwrap(),
                CanvasSize::fixed(640, 480)
            );
            assert_eq!(
                "original".parse::<CanvasSize>().unwrap(),
                CanvasSize::Original
            );
        }

        #[test]
        fn test_parse_rejects_zero_and_garbage() {
            for input in ["0x1080", "1080x0", "1080", "widexhigh", "-1x5", ""] {
                let err = input.parse::<CanvasSize>().unwrap_err();
                assert!(
                    matches!(err, PosterError::InvalidArgument { .. }),
                    "{input}: {err:?}"
                );
            }
        }

        #[test]
        fn test_rejects_canvas_beyond_limits() {
            assert!(CanvasSize::fixed(MAX_DIMENSION, 1).validate().is_ok());
            assert!(CanvasSize::fixed(10_000, 10_000).validate().is_ok());
            for size in [
                CanvasSize::fixed(MAX_DIMENSION + 1, 10),
                CanvasSize::fixed(10, 40_000),
                CanvasSize::fixed(10_001, 10_000),
            ] {
                let err = size.validate().unwrap_err();
                assert!(matches!(err, PosterError::InvalidArgument { .. }), "{size}");
            }
            assert!("100000x100000".parse::<CanvasSize>().is_err());
        }

        #[test]
        fn test_display_round_trips_through_parse() {
            let size = CanvasSize::fixed(1350, 1080);
            assert_eq!(size.to_string().parse::<CanvasSize>().unwrap(), size);
            assert_eq!(CanvasSize::Original.to_string(), "original");
        }
    }

    mod output_format_tests {
        use super::*;

        #[test]
        fn test_jpeg_extensions_any_case() {
            for ext in ["jpg", "JPG", "jpeg", "JpEg"] {
                assert_eq!(
                    OutputFormat::from_extension(ext),
                    OutputFormat::Jpeg { quality: 95 }
                );
            }
        }

        #[test]
        fn test_everything_else_is_png() {
            assert_eq!(OutputFormat::from_extension("png"), OutputFormat::Png);
            assert_eq!(OutputFormat::from_extension("webp"), OutputFormat::Png);
            assert_eq!(
                OutputFormat::from_path(Path::new("no_extension")),
                OutputFormat::Png
            );
        }

        #[test]
        fn test_from_path() {
            let fmt = OutputFormat::from_path(Path::new("/tmp/photo.JPG"));
            assert_eq!(fmt.extension(), "jpeg");
            let fmt = OutputFormat::from_path(Path::new("/tmp/art.png"));
            assert_eq!(fmt.extension(), "png");
        }
    }
}
