// src/engine.rs
//
// The core of poster-canvas. Each source image goes through:
// 1. Decode (format chosen by content, dimensions checked before allocating)
// 2. Compose: blurred fill background + centered contain foreground on a white canvas
// 3. Encode in the source's family (JPEG stays JPEG, everything else PNG)
// 4. Atomic write to <folder>/processed/<stem>.processed.<ext>
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 300MB as packed RGB. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod batch;
mod common;
mod compositor;
mod decoder;
mod encoder;
mod io;
mod layout;
mod pipeline;
mod tasks;

pub use batch::{process_folder, BatchResult, BatchSummary, BatchTask};
pub use compositor::{compose, compose_with};
pub use decoder::{check_dimensions, decode_image, detect_format};
pub use encoder::{encode, encode_jpeg, encode_png};
pub use io::{
    collect_inputs, is_supported_input, output_path_for, prepare_output_dir, write_atomic,
    OUTPUT_DIR_NAME, SUPPORTED_EXTENSIONS,
};
pub use layout::{
    center_offset, checked_resize_dimensions, compute_resize_dimensions, BackgroundWindow,
    CompositionPlan,
};
pub use pipeline::{
    crop_top_left, darken, gaussian_blur, paste_opaque, resize_rgb, white_canvas, ResizeError,
};
pub use tasks::{process_file, ProcessTask, ProcessedImage};
