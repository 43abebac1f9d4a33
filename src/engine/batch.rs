// src/engine/batch.rs
//
// Folder batch: every supported file in a folder, processed sequentially.
// A failing file is recorded and skipped; it never aborts the batch.

use crate::config::ProcessingParams;
use crate::engine::io::{collect_inputs, prepare_output_dir};
use crate::engine::tasks::{ensure_processable, ProcessTask, ProcessedImage};
use crate::error::{ErrorCategory, PosterError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome for a single input of a batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub source: PathBuf,
    pub outcome: std::result::Result<ProcessedImage, PosterError>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(|img| img.output.as_path())
    }

    pub fn error(&self) -> Option<&PosterError> {
        self.outcome.as_ref().err()
    }

    pub fn error_category(&self) -> Option<ErrorCategory> {
        self.error().map(PosterError::category)
    }
}

/// Aggregate counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

pub struct BatchTask {
    pub inputs: Vec<PathBuf>,
    pub params: ProcessingParams,
}

impl BatchTask {
    /// Batch over explicit paths. They need not be pre-filtered: directories
    /// and unreadable entries become per-input failures instead of aborting.
    pub fn new(inputs: Vec<PathBuf>, params: ProcessingParams) -> Self {
        Self { inputs, params }
    }

    /// Discover the inputs of `folder` and make sure `<folder>/processed` exists.
    pub fn from_folder(folder: &Path, params: ProcessingParams) -> Result<Self> {
        let inputs = collect_inputs(folder)?;
        let output_dir = prepare_output_dir(folder)?;
        info!(
            folder = %folder.display(),
            output_dir = %output_dir.display(),
            inputs = inputs.len(),
            "batch prepared"
        );
        Ok(Self::new(inputs, params))
    }

    /// Process every input in order. One result per input, in input order.
    pub fn run(&self) -> Vec<BatchResult> {
        let mut results = Vec::with_capacity(self.inputs.len());
        self.run_with(|result| results.push(result.clone()));
        results
    }

    /// Like [`run`](Self::run), invoking `on_result` as each input finishes.
    pub fn run_with<F>(&self, mut on_result: F) -> BatchSummary
    where
        F: FnMut(&BatchResult),
    {
        let mut summary = BatchSummary {
            total: self.inputs.len(),
            ..BatchSummary::default()
        };
        for input in &self.inputs {
            let result = self.process_one(input);
            if result.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            on_result(&result);
        }

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch finished"
        );
        summary
    }

    fn process_one(&self, input: &Path) -> BatchResult {
        let outcome =
            ensure_processable(input).and_then(|_| ProcessTask::new(input, self.params).run());
        if let Err(err) = &outcome {
            warn!(
                source = %input.display(),
                category = err.category().as_str(),
                error = %err,
                "failed to process image"
            );
        }
        BatchResult {
            source: input.to_path_buf(),
            outcome,
        }
    }
}

/// Process every supported image in `folder` with `params`.
pub fn process_folder(folder: &Path, params: ProcessingParams) -> Result<Vec<BatchResult>> {
    Ok(BatchTask::from_folder(folder, params)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::CanvasSize;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn write_image(path: &Path, format: ImageFormat) {
        let img = RgbImage::from_pixel(12, 8, Rgb([200, 100, 50]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        std::fs::write(path, buf).unwrap();
    }

    fn params() -> ProcessingParams {
        ProcessingParams::new(CanvasSize::fixed(16, 16), 0.5, 0.8).unwrap()
    }

    #[test]
    fn batch_continues_past_failures() {
        let dir = tempdir().unwrap();
        write_image(&dir.path().join("a.png"), ImageFormat::Png);
        std::fs::write(dir.path().join("b.jpg"), b"not a jpeg").unwrap();
        write_image(&dir.path().join("c.jpeg"), ImageFormat::Jpeg);

        let results = process_folder(dir.path(), params()).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert_eq!(results[1].error_category(), Some(ErrorCategory::CodecError));
        assert!(results[2].is_success());

        let summary = BatchSummary::from_results(&results);
        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                succeeded: 2,
                failed: 1
            }
        );
        assert!(!summary.all_succeeded());

        let processed = dir.path().join("processed");
        assert!(processed.join("a.processed.png").is_file());
        assert!(processed.join("c.processed.jpeg").is_file());
        assert!(!processed.join("b.processed.jpeg").exists());
    }

    #[test]
    fn empty_folder_yields_no_results() {
        let dir = tempdir().unwrap();
        let results = process_folder(dir.path(), params()).unwrap();
        assert!(results.is_empty());
        assert!(dir.path().join("processed").is_dir());
    }

    #[test]
    fn processed_outputs_are_not_picked_up_again() {
        let dir = tempdir().unwrap();
        write_image(&dir.path().join("a.png"), ImageFormat::Png);
        process_folder(dir.path(), params()).unwrap();
        let second = process_folder(dir.path(), params()).unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn run_with_reports_each_result() {
        let dir = tempdir().unwrap();
        write_image(&dir.path().join("one.png"), ImageFormat::Png);
        write_image(&dir.path().join("two.png"), ImageFormat::Png);

        let task = BatchTask::from_folder(dir.path(), params()).unwrap();
        let mut seen = Vec::new();
        let summary = task.run_with(|result| seen.push(result.output_path().map(Path::to_path_buf)));
        assert_eq!(summary.succeeded, 2);
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(Option::is_some));
    }

    #[test]
    fn explicit_directory_input_is_a_per_input_failure() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("ok.png");
        write_image(&image, ImageFormat::Png);
        let nested = dir.path().join("nested.png");
        std::fs::create_dir(&nested).unwrap();
        prepare_output_dir(dir.path()).unwrap();

        let results = BatchTask::new(vec![nested, image], params()).run();
        assert!(matches!(
            results[0].error(),
            Some(PosterError::InvalidArgument { .. })
        ));
        assert!(results[1].is_success());
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = tempdir().unwrap();
        let err = process_folder(&dir.path().join("nope"), params()).unwrap_err();
        assert!(matches!(err, PosterError::FileNotFound { .. }));
    }
}
