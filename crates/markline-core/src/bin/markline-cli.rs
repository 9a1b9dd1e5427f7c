use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use markline_core::{
    DetectionSettings, MarklineConfig, MonotonicClock, NullOutput, Session, SessionSettings,
    SymphoniaDecoder, fixtures::demo_source, init_from_config, scan_audio_files,
};
use serde::Serialize;
use tracing::{info, warn};

const REFRESH_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Parser)]
#[command(name = "markline-cli")]
#[command(about = "Headless waveform, marker detection and playback tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Place markers automatically and print the timestamp and name blocks.
    Detect {
        file: PathBuf,

        #[arg(long)]
        threshold: Option<f32>,

        #[arg(long)]
        min_distance: Option<f64>,

        #[arg(long)]
        json: bool,
    },
    /// Print the rendered min/max columns as JSON.
    Waveform {
        file: PathBuf,

        #[arg(long)]
        width: Option<usize>,

        #[arg(long)]
        height: Option<usize>,
    },
    /// Report detected marker counts for every audio file under a directory.
    Scan { directory: PathBuf },
    /// Play silently in real time and log each marker the playhead crosses.
    Play {
        file: PathBuf,

        #[arg(long)]
        auto_markers: bool,

        #[arg(long)]
        max_seconds: Option<f64>,
    },
    /// Run detection over the built-in click pattern.
    Demo,
}

#[derive(Debug, Serialize)]
struct DetectReport<'a> {
    file: String,
    duration_seconds: f64,
    markers: &'a [markline_core::Marker],
}

#[derive(Debug, Serialize)]
struct ScanEntry {
    file: String,
    markers: Option<usize>,
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = MarklineConfig::load_or_default(cli.config.as_deref())
        .context("failed to load markline config")?;
    let _telemetry = init_from_config(&config, cli.log_dir.as_deref())?;
    let mut settings = SessionSettings::from_config(&config)?;

    match cli.command {
        Commands::Detect {
            file,
            threshold,
            min_distance,
            json,
        } => {
            settings.detection = DetectionSettings::new(
                threshold.unwrap_or(settings.detection.threshold()),
                min_distance.unwrap_or(settings.detection.min_distance_seconds()),
            )?;
            let mut session = open_session(settings, &file)?;
            session.auto_place_markers()?;
            if json {
                let report = DetectReport {
                    file: file.display().to_string(),
                    duration_seconds: session.duration(),
                    markers: session.markers().markers(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let (timestamps, names) = session.text_blocks();
                println!("{timestamps}\n\n{names}");
            }
        }
        Commands::Waveform {
            file,
            width,
            height,
        } => {
            settings.waveform_width = width.unwrap_or(settings.waveform_width);
            settings.waveform_height = height.unwrap_or(settings.waveform_height);
            let session = open_session(settings, &file)?;
            let waveform = session
                .waveform()
                .context("waveform missing after import")?;
            println!("{}", serde_json::to_string_pretty(waveform)?);
        }
        Commands::Scan { directory } => {
            let entries: Vec<ScanEntry> = scan_audio_files(&directory)
                .into_iter()
                .map(|path| {
                    let file = path.display().to_string();
                    match open_session(settings, &path)
                        .and_then(|mut session| Ok(session.auto_place_markers()?))
                    {
                        Ok(count) => ScanEntry {
                            file,
                            markers: Some(count),
                            error: None,
                        },
                        Err(error) => {
                            warn!(%file, ?error, "skipping file");
                            ScanEntry {
                                file,
                                markers: None,
                                error: Some(format!("{error:#}")),
                            }
                        }
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Play {
            file,
            auto_markers,
            max_seconds,
        } => {
            let mut session = open_session(settings, &file)?;
            if auto_markers {
                session.auto_place_markers()?;
            }
            run_playback(&mut session, max_seconds);
        }
        Commands::Demo => {
            let mut session = Session::new(
                settings,
                MonotonicClock::default(),
                NullOutput::default(),
            );
            session.import_source(demo_source());
            let added = session.auto_place_markers()?;
            info!(added, "demo detection complete");
            let (timestamps, names) = session.text_blocks();
            println!("{timestamps}\n\n{names}");
        }
    }

    Ok(())
}

fn open_session(settings: SessionSettings, file: &Path) -> anyhow::Result<Session> {
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut session = Session::new(settings, MonotonicClock::default(), NullOutput::default());
    let hint = file.extension().and_then(|value| value.to_str());
    session
        .import_bytes(&SymphoniaDecoder, &bytes, hint)
        .with_context(|| format!("failed to import {}", file.display()))?;
    Ok(session)
}

fn run_playback(session: &mut Session, max_seconds: Option<f64>) {
    let limit = max_seconds.unwrap_or(f64::INFINITY);
    let mut previous = f64::NEG_INFINITY;

    session.play();
    while session.clock().needs_refresh() {
        let tick = session.tick();
        for marker in session.markers().markers_between(previous, tick.position) {
            info!(time = marker.time, name = %marker.name, "marker reached");
        }
        previous = tick.position;
        if tick.completed {
            break;
        }
        if tick.position >= limit {
            session.stop();
            break;
        }
        thread::sleep(REFRESH_INTERVAL);
    }
    info!(position = previous, "playback finished");
}
