use clap::{Parser, Subcommand};
use cli::{output_path, FrameSource};
use color_eyre::eyre::Result;
use detect::{config::MAX_FILTERS, render, DetectionMode, Detector, DetectorConfig};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured filter over a sequence of frames
    Sensing {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Frame images, or directories of frames
        #[arg(required = true)]
        frames: Vec<PathBuf>,
        /// Write one GeoJSON report per frame into this directory
        #[arg(long)]
        geojson_dir: Option<PathBuf>,
        /// Write each frame with its detections drawn into this directory
        #[arg(long)]
        annotate_dir: Option<PathBuf>,
    },
    /// Run one filter over a frame and save the intermediate images
    Debug {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Filter id to inspect
        #[arg(short, long, default_value = "0")]
        filter: usize,
        /// Frame image
        frame: PathBuf,
        /// Directory for thresholded.png, edges.png and min_rect.png
        #[arg(short, long)]
        output_dir: PathBuf,
    },
    /// Print the JSON schema of the configuration file
    Schema,
    /// Write a default configuration file
    InitConfig {
        /// Output path (.toml or .json)
        #[arg(short, long)]
        output: PathBuf,
        /// Number of full-range filters to include
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(0..=MAX_FILTERS as i64))]
        filters: u8,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Sensing { config, frames, geojson_dir, annotate_dir } => {
            run_sensing(config, frames, geojson_dir.as_deref(), annotate_dir.as_deref())?;
        }
        Commands::Debug { config, filter, frame, output_dir } => {
            run_debug(config, *filter, frame, output_dir)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&DetectorConfig::schema())?);
        }
        Commands::InitConfig { output, filters } => {
            let config = DetectorConfig::with_filter_count(*filters as usize)?;
            config.to_file(output)?;
            info!("Wrote configuration with {} filters to {:?}", filters, output);
        }
    }

    Ok(())
}

fn run_sensing(
    config_path: &Path,
    inputs: &[PathBuf],
    geojson_dir: Option<&Path>,
    annotate_dir: Option<&Path>,
) -> Result<()> {
    let config = DetectorConfig::from_file(config_path)?;
    let detector = Detector::new(config, DetectionMode::Sensing)?;
    let source = FrameSource::from_paths(inputs)?;
    info!("Processing {} frames with {} filters", source.len(), detector.config().filters.len());

    for dir in geojson_dir.iter().chain(annotate_dir.iter()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut failed = 0usize;
    for (frame_index, path, frame) in source.frames() {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Skipping frame {:?}: {}", path, err);
                failed += 1;
                continue;
            }
        };

        let report = detector.detect_frame(frame_index, &frame)?;
        for filter in &report.filters {
            for tracked in &filter.tracked {
                info!(
                    frame = frame_index,
                    filter = filter.filter_id,
                    x = tracked.center[0],
                    y = tracked.center[1],
                    "object"
                );
            }
        }
        println!("{}", serde_json::to_string(&report)?);

        if let Some(dir) = geojson_dir {
            report.save_geojson(output_path(dir, path, "geojson"))?;
        }
        if let Some(dir) = annotate_dir {
            let prepared = detector.prepare_frame(&frame);
            render::annotate_frame(&prepared, &report).save(output_path(dir, path, "png"))?;
        }
    }

    if failed > 0 {
        error!("{} of {} frames could not be read", failed, source.len());
    }
    info!("Sensing completed");
    Ok(())
}

fn run_debug(config_path: &Path, filter_id: usize, frame_path: &Path, output_dir: &Path) -> Result<()> {
    let config = DetectorConfig::from_file(config_path)?;
    let detector = Detector::new(config, DetectionMode::Debug)?;
    let frame = cli::load_frame(frame_path)?;

    let frame_debug = detector.debug_frame(&frame, filter_id)?;
    std::fs::create_dir_all(output_dir)?;
    frame_debug.thresholded.save(output_dir.join("thresholded.png"))?;
    frame_debug.edges.save(output_dir.join("edges.png"))?;
    frame_debug.min_rect.save(output_dir.join("min_rect.png"))?;

    info!(
        "Filter {} found {} contours, {} objects",
        filter_id,
        frame_debug.contour_rects.len(),
        frame_debug.objects.len()
    );
    for object in &frame_debug.objects {
        match &object.oriented_rect {
            Some(rect) => info!(
                "center ({:.1}, {:.1}) size {:.1}x{:.1} angle {:.1}",
                rect.center[0], rect.center[1], rect.size[0], rect.size[1], rect.angle
            ),
            None => info!("center ({:.1}, {:.1})", object.center[0], object.center[1]),
        }
    }
    info!("Debug images written to {:?}", output_dir);
    Ok(())
}
