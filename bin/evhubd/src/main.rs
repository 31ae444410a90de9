//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Binary entrypoint for the Solar EV Hub daemon."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use evhub_common::config::AppConfig;
use evhub_common::logging::init_tracing;
use evhub_common::metrics::JitterSummary;
use evhub_core::{
    geolocation_from_config, map_from_config, resolve_location, DashboardRuntime,
    JsonLinesSurface, LocationResolution, LogSurface, MapMarker, MapView, RenderSurface,
    RuntimeReport, WatchSurface,
};
use evhub_fleet::{default_directory, sort_listings, AvailabilityStatus, SortKey, StationListing};
use evhub_sim::{default_feed_stations, SensorFeedGenerator};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    version = concat!("Solar EV Hub ", env!("CARGO_PKG_VERSION")),
    about = "Solar EV Hub daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Override simulation.random_seed")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Log,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the dashboard and chart refresh timers")]
    Run {
        /// Stop after this many seconds instead of waiting for ctrl-c
        #[arg(long)]
        duration_secs: Option<u64>,

        /// How frames are rendered
        #[arg(long, value_enum, default_value_t = OutputFormat::Log)]
        output: OutputFormat,

        /// Write per-timer tick jitter to this file on shutdown
        #[arg(long, value_name = "FILE")]
        jitter_report: Option<PathBuf>,
    },
    #[command(about = "Print one dashboard frame as JSON")]
    Snapshot,
    #[command(about = "Print the 24 hour chart history as JSON")]
    Chart,
    #[command(about = "Resolve the user location and list nearby stations")]
    Finder {
        /// distance, availability or price
        #[arg(long, default_value = "distance")]
        sort: SortKey,
    },
    #[command(about = "Emit simulated station sensor readings as JSON lines")]
    SensorFeed {
        /// Rounds of readings to emit
        #[arg(long, default_value_t = 10)]
        samples: u64,

        /// Only emit readings for this station id
        #[arg(long)]
        station: Option<String>,

        /// Pause between rounds in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let candidates = [PathBuf::from("configs/evhubd.toml")];
    let loaded = AppConfig::load_explicit_or(cli.config.as_deref(), &candidates)?;
    let mut config = loaded.config;
    if let Some(seed) = cli.seed {
        config.simulation.random_seed = Some(seed);
    }
    let _log_guards = init_tracing("evhubd", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; using defaults"),
    }

    match cli.command.unwrap_or(Commands::Run {
        duration_secs: None,
        output: OutputFormat::Log,
        jitter_report: None,
    }) {
        Commands::Run {
            duration_secs,
            output,
            jitter_report,
        } => {
            let duration = duration_secs.map(Duration::from_secs);
            let report = run_dashboard(&config, duration, output).await?;
            if let Some(path) = jitter_report {
                write_jitter_report(&path, &report)?;
                info!(path = %path.display(), "jitter report written");
            }
        }
        Commands::Snapshot => {
            let runtime = DashboardRuntime::from_config(&config, Arc::new(WatchSurface::new()))?;
            print_json(&runtime.current_frame())?;
        }
        Commands::Chart => {
            let runtime = DashboardRuntime::from_config(&config, Arc::new(WatchSurface::new()))?;
            print_json(&runtime.chart_history())?;
        }
        Commands::Finder { sort } => run_finder(&config, sort).await?,
        Commands::SensorFeed {
            samples,
            station,
            interval_ms,
        } => run_sensor_feed(&config, samples, station.as_deref(), interval_ms).await?,
    }

    Ok(())
}

async fn run_dashboard(
    config: &AppConfig,
    duration: Option<Duration>,
    output: OutputFormat,
) -> Result<RuntimeReport> {
    let surface: Arc<dyn RenderSurface> = match output {
        OutputFormat::Log => Arc::new(LogSurface),
        OutputFormat::Json => Arc::new(JsonLinesSurface::stdout()),
    };
    let mut runtime = DashboardRuntime::from_config(config, surface)?;
    runtime.start()?;

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    info!(seconds = duration.as_secs(), "run duration elapsed");
                }
                _ = signal::ctrl_c() => info!("ctrl-c received, shutting down"),
            }
        }
        None => {
            signal::ctrl_c().await?;
            info!("ctrl-c received, shutting down");
        }
    }

    Ok(runtime.stop().await)
}

#[derive(Serialize)]
struct TimerJitter<'a> {
    timer: &'a str,
    ticks: u64,
    jitter: Option<JitterSummary>,
}

fn write_jitter_report(path: &Path, report: &RuntimeReport) -> Result<()> {
    let timers: Vec<TimerJitter<'_>> = [&report.dashboard, &report.chart]
        .into_iter()
        .flatten()
        .map(|timer| TimerJitter {
            timer: &timer.label,
            ticks: timer.ticks,
            jitter: timer.jitter,
        })
        .collect();
    let file = File::create(path)
        .with_context(|| format!("failed to create jitter report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &timers)?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapDescriptor {
    provider: &'static str,
    tile_url: String,
    attribution: &'static str,
    initial_view: MapView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinderEntry {
    #[serde(flatten)]
    listing: StationListing,
    availability: AvailabilityStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinderOutput {
    location: LocationResolution,
    sort: SortKey,
    map: MapDescriptor,
    stations: Vec<FinderEntry>,
    markers: Vec<MapMarker>,
}

async fn run_finder(config: &AppConfig, sort: SortKey) -> Result<()> {
    let geolocation = geolocation_from_config(&config.location);
    let location = resolve_location(geolocation.as_deref()).await;
    if location.is_fallback() {
        warn!(title = location.notice.title, "{}", location.notice.description);
    }

    let map = map_from_config(&config.map)?;
    let listings = sort_listings(&default_directory(), sort);
    let output = FinderOutput {
        markers: map.markers(&listings),
        map: MapDescriptor {
            provider: map.name(),
            tile_url: map.tile_url_template(),
            attribution: map.attribution(),
            initial_view: map.initial_view(),
        },
        stations: listings
            .into_iter()
            .map(|listing| FinderEntry {
                availability: listing.availability(),
                listing,
            })
            .collect(),
        location,
        sort,
    };
    print_json(&output)
}

async fn run_sensor_feed(
    config: &AppConfig,
    samples: u64,
    station: Option<&str>,
    interval_ms: u64,
) -> Result<()> {
    let stations: Vec<_> = default_feed_stations()
        .into_iter()
        .filter(|feed| station.map_or(true, |id| feed.id == id))
        .collect();
    if stations.is_empty() {
        return Err(anyhow!("unknown station '{}'", station.unwrap_or_default()));
    }

    let generator = SensorFeedGenerator::new(config.simulation.utc_offset()?);
    let mut rng = match config.simulation.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    for round in 0..samples {
        if round > 0 && interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
        let now = Utc::now();
        let mut out = io::stdout().lock();
        for feed in &stations {
            let reading = generator.reading(&mut rng, &feed.id, now);
            serde_json::to_writer(&mut out, &reading)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
    }
    info!(samples, stations = stations.len(), "sensor feed complete");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}
