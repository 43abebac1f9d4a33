use clap::Parser;
use poster_canvas::config::{DEFAULT_BLUR_RADIUS, DEFAULT_DARKEN_FACTOR};
use poster_canvas::{BatchTask, CanvasSize, ProcessingParams};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "poster-canvas")]
#[command(
    version,
    about = "Place every image of a folder on a blurred-background canvas",
    long_about = None
)]
struct Cli {
    /// Folder containing the source images (png, jpg, jpeg)
    #[arg(value_name = "FOLDER")]
    folder: PathBuf,

    /// Canvas size: square, landscape, original or WIDTHxHEIGHT
    #[arg(short, long, value_name = "SIZE", default_value = "square")]
    canvas: CanvasSize,

    /// Background blur radius (0 disables blurring)
    #[arg(short, long, value_name = "FLOAT", default_value_t = DEFAULT_BLUR_RADIUS)]
    blur: f32,

    /// Background brightness multiplier (1.0 = unchanged, 0.0 = black)
    #[arg(short, long, value_name = "FLOAT", default_value_t = DEFAULT_DARKEN_FACTOR)]
    darken: f32,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let params = match ProcessingParams::new(cli.canvas, cli.blur, cli.darken) {
        Ok(params) => params,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let task = match BatchTask::from_folder(&cli.folder, params) {
        Ok(task) => task,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if task.inputs.is_empty() {
        log::warn!("no png/jpg/jpeg files found in {}", cli.folder.display());
    }

    let summary = task.run_with(|result| match &result.outcome {
        Ok(processed) => println!("Processed image saved to: {}", processed.output.display()),
        Err(err) => eprintln!("Failed to process {}: {err}", result.source.display()),
    });

    println!(
        "Done: {} processed, {} failed, {} total",
        summary.succeeded, summary.failed, summary.total
    );

    if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
