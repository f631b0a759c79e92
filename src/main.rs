use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use winmeasure::core::analysis::analyze_request;
use winmeasure::core::db::{ReferenceSpecRepository, RequestDb};
use winmeasure::{EstimationPipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "winmeasure")]
#[command(about = "Estimate window dimensions from photos with a reference object")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file with pipeline settings
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Per-stage time budget in milliseconds (0 disables it)
    #[arg(long, value_name = "MS", global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Measure a single photo
    Analyze {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Part of the window to measure (frame, sash)
        #[arg(short, long, default_value = "frame")]
        location: String,

        /// Reference object in the photo (A4, CREDIT_CARD)
        #[arg(short, long, default_value = "A4")]
        reference: String,

        /// Save an overlay of the detections to this directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Measure every photo of a stored request and record the results
    Request {
        /// Request store directory
        #[arg(long, value_name = "DIR")]
        store: PathBuf,

        /// Request id
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = (ms > 0).then_some(ms);
    }

    match args.command {
        Command::Analyze {
            image_path,
            location,
            reference,
            debug_out,
            json,
        } => {
            let mut pipeline = EstimationPipeline::new(config);
            if let Some(debug_dir) = debug_out {
                pipeline = pipeline.with_debug(debug_dir)?;
            }

            let analysis = pipeline.analyze(&image_path, &location, &reference).await?;
            let estimate = &analysis.estimate;

            if json {
                let report = serde_json::json!({
                    "image": image_path,
                    "estimate": estimate,
                    "reference": analysis.reference,
                    "target": analysis.target,
                    "calibration": analysis.calibration,
                    "warning": analysis.warning.map(|w| w.to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n=== Window Measurement ===");
                println!(
                    "W: {:.0}{unit}, H: {:.0}{unit} (confidence: {:.2})",
                    estimate.width,
                    estimate.height,
                    estimate.confidence,
                    unit = estimate.unit
                );
                if let Some(warning) = &analysis.warning {
                    println!("Warning: {} - manual review recommended", warning);
                }
            }
        }
        Command::Request { store, id } => {
            let db = RequestDb::open(&store).await?;
            let references = db.get_reference_table().await?;
            let pipeline = Arc::new(EstimationPipeline::new(config).with_references(references));

            let result = analyze_request(&db, pipeline, id).await?;

            println!("\n=== Request {} ({}) ===", result.request.id, result.request.status);
            for outcome in &result.outcomes {
                match &outcome.result {
                    Ok(analysis) => println!(
                        "  image {}: W {:.0}{unit} x H {:.0}{unit} - confidence: {:.2}{}",
                        outcome.image_id,
                        analysis.estimate.width,
                        analysis.estimate.height,
                        analysis.estimate.confidence,
                        if analysis.warning.is_some() { " (review)" } else { "" },
                        unit = analysis.estimate.unit
                    ),
                    Err(e) => println!("  image {}: failed - {}", outcome.image_id, e),
                }
            }
            db.close().await;
        }
    }

    Ok(())
}
