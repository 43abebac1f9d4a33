// src/engine/tasks.rs
//
// Per-file processing: read -> decode -> compose -> encode -> atomic write.

use crate::config::ProcessingParams;
use crate::engine::compositor::compose_with;
use crate::engine::decoder::decode_image;
use crate::engine::encoder::encode;
use crate::engine::io::{output_path_for, read_source, write_atomic};
use crate::error::{PosterError, Result};
use crate::ops::OutputFormat;
use image::GenericImageView;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Summary of one successfully written output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub bytes_written: u64,
}

/// One unit of work: a source file plus the parameters shared by the batch.
#[derive(Debug, Clone)]
pub struct ProcessTask {
    pub source: PathBuf,
    pub params: ProcessingParams,
}

impl ProcessTask {
    pub fn new(source: impl Into<PathBuf>, params: ProcessingParams) -> Self {
        Self {
            source: source.into(),
            params,
        }
    }

    /// Output format follows the source extension: jpg/jpeg stay JPEG, everything else is PNG.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_path(&self.source)
    }

    /// Where the composed image will be written.
    pub fn output_path(&self) -> Result<PathBuf> {
        output_path_for(&self.source, self.output_format())
    }

    /// Decode, compose and encode, returning the encoded bytes and canvas size.
    ///
    /// Nothing is written to disk, so a failure here never leaves a partial output.
    pub(crate) fn process_and_encode(&self, data: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
        let start = Instant::now();

        let (img, detected) = decode_image(data)?;
        let (src_w, src_h) = img.dimensions();
        debug!(
            source = %self.source.display(),
            ?detected,
            src_w,
            src_h,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "decoded"
        );

        let canvas = compose_with(&img, &self.params)?;
        drop(img);
        let (width, height) = canvas.dimensions();
        debug!(
            width,
            height,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "composed"
        );

        let encoded = encode(&canvas, self.output_format())?;
        debug!(
            bytes = encoded.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "encoded"
        );

        Ok((encoded, width, height))
    }

    /// Run the whole per-file pipeline.
    ///
    /// The output directory must already exist (see
    /// [`prepare_output_dir`](crate::engine::io::prepare_output_dir)). An
    /// existing output is overwritten.
    pub fn run(&self) -> Result<ProcessedImage> {
        let format = self.output_format();
        let output = self.output_path()?;

        let data = read_source(&self.source)?;
        let (encoded, width, height) = self.process_and_encode(&data)?;
        drop(data);

        let bytes_written = write_atomic(&output, &encoded)?;
        info!(
            source = %self.source.display(),
            output = %output.display(),
            width,
            height,
            %format,
            bytes_written,
            "saved"
        );

        Ok(ProcessedImage {
            source: self.source.clone(),
            output,
            width,
            height,
            format,
            bytes_written,
        })
    }
}

/// Process a single source file with `params`.
pub fn process_file(source: &Path, params: &ProcessingParams) -> Result<ProcessedImage> {
    ProcessTask::new(source, *params).run()
}

/// Fail fast on a path that can never produce an output.
pub fn ensure_processable(source: &Path) -> Result<()> {
    if source.is_dir() {
        return Err(PosterError::invalid_argument(
            "path",
            source.to_string_lossy().into_owned(),
            "expected an image file, found a directory",
        ));
    }
    Ok(())
}
