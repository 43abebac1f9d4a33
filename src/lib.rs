// lib.rs
//
// poster-canvas: batch poster compositor
//
// Every image in a folder is placed on a fixed-size canvas: a blurred (and
// optionally darkened) copy fills the background, and the whole image sits
// centered on top. Results land in <folder>/processed/.

pub mod config;
pub mod engine;
pub mod error;
pub mod ops;

pub use config::ProcessingParams;
pub use engine::{
    compose, compose_with, compute_resize_dimensions, process_file, process_folder, BatchResult,
    BatchSummary, BatchTask, ProcessedImage,
};
pub use error::{ErrorCategory, PosterError, Result};
pub use ops::{CanvasSize, FitPolicy, OutputFormat, JPEG_QUALITY};
