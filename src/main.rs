mod app;
mod audio;
mod cli;
mod error;
mod export;
mod playback;
mod session;
mod tasks;
mod tui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::app::Settings;
use crate::audio::{AudioDecoder, SampleBuffer};
use crate::cli::{Args, Command};
use crate::error::Result;
use crate::export::{ExportFormat, Exporter, FfmpegEncoder};
use crate::playback::{list_audio_devices, RodioGraph};
use crate::session::{EditCommand, EditSession};
use crate::tasks::{Channels, ExportWorker};
use crate::tui::{Editor, TuiApp};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep log lines off the terminal while the editor owns it
    let log_file = if args.is_interactive() { app::log_file_path() } else { None };
    init_tracing(args.verbose, log_file.as_deref());

    info!("wavecut v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        if e.is_user_facing() {
            eprintln!("wavecut: {}", e);
            std::process::exit(2);
        }
        return Err(e);
    }

    Ok(())
}

/// Initialize tracing subscriber, to a file when one is given
fn init_tracing(verbose: bool, log_file: Option<&Path>) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let file = log_file.and_then(|path| {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .compact()
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .compact()
            .init(),
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = Settings::from_args(&args);

    match args.command {
        Command::Info { input, json } => run_info(&settings, &input, json).await,
        Command::Edit {
            input,
            ops,
            output,
            format,
        } => run_edit(&settings, &input, &ops, output, format).await,
        Command::Open {
            input,
            device,
            out_dir,
            format,
        } => run_open(settings, &input, device, out_dir, format).await,
        Command::Devices => run_devices(),
    }
}

/// Summary printed by `info`
#[derive(Debug, Serialize)]
struct AudioInfo {
    path: PathBuf,
    duration_secs: f64,
    sample_rate: u32,
    channels: usize,
    frames: usize,
    peak: f32,
}

async fn load(settings: &Settings, input: &Path) -> Result<SampleBuffer> {
    let decoder = AudioDecoder::new(settings.decode.clone());
    Ok(decoder.decode_file(input).await?)
}

fn file_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

async fn run_info(settings: &Settings, input: &Path, json: bool) -> Result<()> {
    let buffer = load(settings, input).await?;

    let info = AudioInfo {
        path: input.to_path_buf(),
        duration_secs: buffer.duration_secs(),
        sample_rate: buffer.sample_rate(),
        channels: buffer.channel_count(),
        frames: buffer.frame_count(),
        peak: buffer.peak(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("File:        {}", info.path.display());
        println!(
            "Duration:    {} ({:.3}s)",
            audio::timecode::format_precise(info.duration_secs),
            info.duration_secs
        );
        println!("Sample rate: {} Hz", info.sample_rate);
        println!("Channels:    {}", info.channels);
        println!("Frames:      {}", info.frames);
        println!("Peak:        {:.4}", info.peak);
    }

    Ok(())
}

async fn run_edit(
    settings: &Settings,
    input: &Path,
    ops: &[String],
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
) -> Result<()> {
    // Parse every edit before decoding so typos fail fast
    let commands = ops
        .iter()
        .map(|op| op.parse::<EditCommand>())
        .collect::<Result<Vec<_>>>()?;

    let buffer = load(settings, input).await?;
    let mut session = EditSession::new(file_name(input), buffer, settings.selection);

    for command in commands {
        let report = session
            .apply(command)
            .inspect_err(|e| error!(edit = %command, error = %e, "Edit rejected"))?;
        println!(
            "{:<12} {} -> {} frames",
            command.to_string(),
            report.frames_before,
            report.frames_after
        );
    }

    let format = format
        .or_else(|| output.as_deref().and_then(ExportFormat::from_path))
        .unwrap_or(ExportFormat::Wav);
    let target = output.unwrap_or_else(|| PathBuf::from("."));

    let exporter = Exporter::new(FfmpegEncoder::new(&settings.decode.ffmpeg), settings.export.clone());
    let saved = exporter.export_to(session.buffer(), format, &target).await?;

    if saved.fell_back {
        warn!(requested = format.extension(), "Compressed export failed, wrote WAV");
    }
    println!(
        "Wrote {} ({}, {} bytes)",
        saved.path.display(),
        saved.mime_type,
        saved.bytes
    );

    Ok(())
}

async fn run_open(
    settings: Settings,
    input: &Path,
    device: Option<usize>,
    out_dir: PathBuf,
    format: ExportFormat,
) -> Result<()> {
    let buffer = load(&settings, input).await?;
    info!(
        file = %input.display(),
        duration_secs = buffer.duration_secs(),
        sample_rate = buffer.sample_rate(),
        channels = buffer.channel_count(),
        "Opening editor"
    );

    let graph = RodioGraph::with_device(device)?;
    let session = EditSession::new(file_name(input), buffer, settings.selection);

    // Export worker runs off the UI loop
    let (cmd_tx, cmd_rx, event_tx, mut event_rx) = Channels::new().split();
    let exporter = Exporter::new(FfmpegEncoder::new(&settings.decode.ffmpeg), settings.export.clone());
    let worker = ExportWorker::new(exporter, cmd_rx, event_tx);
    let worker_handle = tokio::spawn(worker.run());

    let editor = Editor::new(session, graph, settings, format)?;
    let mut tui = TuiApp::new(editor, cmd_tx, out_dir)?;

    info!("TUI started - press 'q' to quit");

    loop {
        let should_quit = tui.handle_input().await?;
        if should_quit {
            break;
        }

        while let Ok(event) = event_rx.try_recv() {
            tui.handle_export_event(event);
        }

        tui.tick();
        tui.draw()?;
    }

    tui.cleanup();
    drop(tui);

    if let Err(e) = worker_handle.await {
        warn!(error = %e, "Export worker did not shut down cleanly");
    }

    info!("wavecut shutdown complete");
    Ok(())
}

fn run_devices() -> Result<()> {
    let devices = list_audio_devices()?;
    if devices.is_empty() {
        println!("No audio output devices found");
        return Ok(());
    }

    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("{:>3}  {}{}", device.index, device.name, marker);
    }
    Ok(())
}
