//! UI Element Detection Example
//!
//! Finds candidate UI regions in screenshots. OCR output, when supplied as a
//! JSON file of `{ "polygon": [[x, y], ...], "confidence": c }` entries, is
//! used to keep text from producing regions.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example detect_elements --features visualization -- [OPTIONS] <IMAGES>...
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example detect_elements --features visualization -- \
//!     --ocr screen.ocr.json --mode contours \
//!     -o output/ --vis \
//!     screen.png
//! ```

use clap::{Parser, ValueEnum};
use oar_region::pipeline::{DetectorConfig, ElementDetector};
use oar_region::prelude::StaticTextDetector;
use oar_region::utils::visualization::{VisualizationConfig, visualize_boxes, visualize_contours};
use oar_region::utils::{init_tracing, load_image};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Connected-component boxes
    Boxes,
    /// Scored external contours
    Contours,
}

/// Command-line arguments for the element detection example
#[derive(Parser)]
#[command(name = "detect_elements")]
#[command(about = "UI Element Detection Example - finds candidate regions in screenshots")]
struct Args {
    /// Paths to input screenshots
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// OCR detections for the images, as a JSON array
    #[arg(long)]
    ocr: Option<PathBuf>,

    /// Detection path to run
    #[arg(long, value_enum, default_value_t = Mode::Boxes)]
    mode: Mode,

    /// Detector configuration as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to save output results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Save visualizations to the output directory
    #[arg(long)]
    vis: bool,

    /// Draw alignment guides on box visualizations
    #[arg(long)]
    alignment: bool,

    /// Dump detected regions as JSON to stdout
    #[arg(long)]
    dump_json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading detector configuration: {}", path.display());
            DetectorConfig::from_json_file(path)?
        }
        None => DetectorConfig::default(),
    };

    let mut detector = ElementDetector::new(config)?;
    if let Some(ocr_path) = &args.ocr {
        let ocr = StaticTextDetector::from_json_file(ocr_path)?;
        info!(
            "Loaded {} text detections ({} skipped) from {}",
            ocr.detections().len(),
            ocr.skipped(),
            ocr_path.display()
        );
        detector = detector.with_text_detector(ocr);
    } else {
        warn!("No OCR input given, text will not be masked");
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }

    let vis_config = VisualizationConfig {
        show_alignment: args.alignment,
        ..VisualizationConfig::default()
    };

    for image_path in &args.images {
        let start = Instant::now();
        let image = match load_image(image_path) {
            Ok(image) => image,
            Err(e) => {
                error!("Failed to load {}: {}", image_path.display(), e);
                continue;
            }
        };

        let output = args
            .output_dir
            .as_deref()
            .filter(|_| args.vis)
            .map(|dir| output_path(dir, image_path, args.mode));

        match args.mode {
            Mode::Boxes => {
                let result = match detector.detect_boxes(&image) {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Detection failed for {}: {}", image_path.display(), e);
                        continue;
                    }
                };
                let guides = detector.alignment_lines(&result.boxes);
                info!(
                    "{}: {} boxes, organization score {:.1}, {:.2}ms",
                    image_path.display(),
                    result.boxes.len(),
                    detector.organization_score(&result.boxes),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                info!("{}", result.stats);

                if args.dump_json {
                    let dump = json!({
                        "image": image_path.display().to_string(),
                        "boxes": result.boxes,
                        "alignment": guides,
                    });
                    println!("{}", serde_json::to_string_pretty(&dump)?);
                }
                if let Some(path) = &output {
                    visualize_boxes(&image, &result, &guides, &vis_config, path)?;
                }
            }
            Mode::Contours => {
                let result = match detector.detect_contours(&image) {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Detection failed for {}: {}", image_path.display(), e);
                        continue;
                    }
                };
                info!(
                    "{}: {} regions, {:.2}ms",
                    image_path.display(),
                    result.regions.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                for (i, region) in result.regions.iter().enumerate() {
                    info!(
                        "  [{}] score {:.1} area {:.0} compactness {:.2} at {:?}",
                        i,
                        region.score,
                        region.area,
                        region.compactness(),
                        region.bounding_box
                    );
                }
                info!("{}", result.stats);

                if args.dump_json {
                    let regions: Vec<_> = result
                        .regions
                        .iter()
                        .map(|r| {
                            json!({
                                "score": r.score,
                                "area": r.area,
                                "perimeter": r.perimeter,
                                "bounding_box": r.bounding_box,
                            })
                        })
                        .collect();
                    let dump = json!({
                        "image": image_path.display().to_string(),
                        "regions": regions,
                    });
                    println!("{}", serde_json::to_string_pretty(&dump)?);
                }
                if let Some(path) = &output {
                    visualize_contours(&image, &result, &vis_config, path)?;
                }
            }
        }
    }

    Ok(())
}

fn output_path(dir: &Path, image_path: &Path, mode: Mode) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let suffix = match mode {
        Mode::Boxes => "boxes",
        Mode::Contours => "contours",
    };
    dir.join(format!("{stem}_{suffix}.png"))
}
