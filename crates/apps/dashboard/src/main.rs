use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use client::{
    load_results, Backend, ClassifiedResults, Dashboard, DashboardConfig, HttpBackend,
    PollOutcome,
};
use compute::ClassifierConfig;
use formats::{Aoi, ComparisonSummary, DemVolumeResult, DetectionLayer};
use foundation::{fixed, grouped};
use geojson::GeoJson;
use layers::{format_measure, MapScene, VolumeBox};
use report::{compile, write_pdf, ReportInputs, DEFAULT_FILE_NAME};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mining activity AOI dashboard")]
struct Args {
    /// Backend base URL (default: MINEWATCH_BACKEND_URL or http://127.0.0.1:5000)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Poll attempts after a submission
    #[arg(long, global = true)]
    poll_max_attempts: Option<u32>,

    /// Delay between poll attempts, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Share of a detection that must overlap one AOI polygon to count as legal
    #[arg(long, global = true)]
    overlap_threshold: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and submit an AOI, then poll for results
    Submit {
        /// GeoJSON Feature or FeatureCollection
        aoi: PathBuf,

        /// Write the styled map scene as GeoJSON
        #[arg(long)]
        scene: Option<PathBuf>,
    },

    /// Load the current AOI, detections and summary once
    Status {
        #[arg(long)]
        scene: Option<PathBuf>,
    },

    /// Classify detection results against the reference AOI
    Classify {
        /// Local results FeatureCollection (requires --aoi)
        #[arg(long, requires = "aoi")]
        results: Option<PathBuf>,

        /// Local reference AOI (requires --results)
        #[arg(long, requires = "results")]
        aoi: Option<PathBuf>,

        /// Write classified, styled GeoJSON
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Upload a DEM GeoTIFF and print the volume analysis
    UploadDem { file: PathBuf },

    /// Compile the PDF report from the current results
    Report {
        /// DEM GeoTIFF to upload first
        #[arg(long)]
        dem: Option<PathBuf>,

        #[arg(long, default_value = DEFAULT_FILE_NAME)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DashboardConfig::from_env();
    if let Some(url) = args.backend_url {
        config.backend_url = url;
    }
    if let Some(n) = args.poll_max_attempts {
        config.poll.max_attempts = n;
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll.interval = std::time::Duration::from_millis(ms);
    }
    if let Some(t) = args.overlap_threshold {
        config.overlap_threshold = t;
    }
    config.validate()?;

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_config(&config)?);
    let dashboard = Dashboard::new(backend.clone(), config.poll);
    info!(backend = %config.base_url(), "dashboard ready");

    match args.command {
        Command::Submit { aoi, scene } => {
            let text = tokio::fs::read_to_string(&aoi).await?;
            let id = dashboard.submit_aoi_text(&text).await?;
            println!("Submitted AOI {} ({id})", aoi.display());
            match dashboard.wait_for_results().await {
                Some(PollOutcome::Completed { attempts, summary }) => {
                    println!("Results ready after {attempts} attempt(s)");
                    print_summary(&summary);
                }
                Some(PollOutcome::Exhausted { attempts }) => {
                    println!("No results after {attempts} attempt(s)");
                }
                Some(PollOutcome::Superseded { .. }) | None => {}
            }
            if let Some(path) = scene {
                export_scene(&dashboard.scene(), &path).await?;
            }
        }
        Command::Status { scene } => {
            dashboard.load_initial().await;
            let snapshot = dashboard.snapshot();
            match &snapshot.aoi {
                Some(aoi) => println!("AOI: {} feature(s)", aoi.feature_count()),
                None => println!("AOI: none"),
            }
            println!(
                "Detected inside: {}",
                snapshot.detected.as_ref().map_or(0, DetectionLayer::len)
            );
            println!(
                "Detected outside: {}",
                snapshot.outside.as_ref().map_or(0, DetectionLayer::len)
            );
            match &snapshot.summary {
                Some(summary) => print_summary(summary),
                None => println!("Summary: not available"),
            }
            if let Some(path) = scene {
                export_scene(&dashboard.scene(), &path).await?;
            }
        }
        Command::Classify { results, aoi, out } => {
            let classifier = ClassifierConfig {
                overlap_threshold: config.overlap_threshold,
            };
            let classified = match (results, aoi) {
                (Some(results), Some(aoi)) => {
                    let results = read_layer(&results).await?;
                    let aoi = Aoi::parse(&tokio::fs::read_to_string(&aoi).await?)?;
                    ClassifiedResults::classify(results, Some(aoi), classifier)
                }
                _ => load_results(backend.as_ref(), classifier).await?,
            };
            print_classified(&classified);
            if let Some(path) = out {
                export_scene(&classified.scene(), &path).await?;
            }
        }
        Command::UploadDem { file } => {
            let result = dashboard.upload_dem(&file).await?;
            print_dem(&result);
        }
        Command::Report { dem, out } => {
            dashboard.load_initial().await;
            if let Some(path) = dem {
                let result = dashboard.upload_dem(&path).await?;
                print_dem(&result);
            }
            let snapshot = dashboard.snapshot();
            let inputs = ReportInputs {
                summary: snapshot.summary,
                dem: snapshot.dem,
                generated_at: chrono::Local::now()
                    .format("%-m/%-d/%Y, %-I:%M:%S %p")
                    .to_string(),
            };
            write_pdf(&compile(&inputs), &out)?;
            println!("Report written to {}", out.display());
        }
    }

    Ok(())
}

fn print_summary(summary: &ComparisonSummary) {
    println!(
        "Detected area: {} km²",
        fixed(summary.detected_area_m2 / 1e6, 2)
    );
    println!(
        "Outside AOI: {} km²",
        fixed(summary.outside_area_m2 / 1e6, 2)
    );
    println!("Percent outside AOI: {} %", summary.pct_outside);
    let (inside, outside) = summary.area_shares();
    println!(
        "Area shares: {}% detected / {}% outside",
        fixed(inside, 1),
        fixed(outside, 1)
    );
    if let Some((start, end)) = summary.time_range() {
        println!("Time range: {start} to {end}");
    }
}

fn print_dem(result: &DemVolumeResult) {
    println!("Volume: {}", format_measure(result.volume_m3, "m³"));
    println!("Max difference: {}", format_measure(result.max_diff, "m"));
    println!("Min difference: {}", format_measure(result.min_diff, "m"));
    println!("Mean difference: {}", format_measure(result.mean_diff, "m"));
    if let Some(url) = &result.heightmap_url {
        println!("Heightmap: {url}");
    }
    if let Some(b) = VolumeBox::from_result(result) {
        println!(
            "Volume box: {} x {} x {} {}",
            grouped(b.width, 2),
            grouped(b.depth, 2),
            grouped(b.height, 2),
            b.color
        );
    }
}

fn print_classified(classified: &ClassifiedResults) {
    for (i, popup) in classified.popups().iter().enumerate() {
        println!("[{}] {}", i + 1, popup.to_text().replace('\n', "\n    "));
    }
    let counts = classified.counts;
    println!(
        "Legal: {}  Illegal: {}  Unknown: {}",
        counts.legal, counts.illegal, counts.unknown
    );
    match classified.aggregate() {
        Ok(aggregate) => print_summary(&aggregate.summary),
        Err(e) => eprintln!("warning: area statistics unavailable: {e}"),
    }
}

async fn read_layer(path: &Path) -> Result<DetectionLayer, Box<dyn std::error::Error>> {
    let text = tokio::fs::read_to_string(path).await?;
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(DetectionLayer::from_collection(fc)),
        _ => Err(format!("{}: expected a FeatureCollection", path.display()).into()),
    }
}

async fn export_scene(scene: &MapScene, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&scene.to_geojson())?;
    tokio::fs::write(path, json).await?;
    println!("Scene written to {}", path.display());
    Ok(())
}
