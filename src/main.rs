// Practice Metronome - Command-line host
//
// Plays the metronome on an output device for a fixed duration, or renders it
// to a WAV file. Beats are printed as they sound.

use clap::Parser;
use log::{error, info};
use practice_metronome::audio::device::AudioDeviceManager;
use practice_metronome::sequencer::subdivision;
use practice_metronome::{
    ClickTrackExporter, ConfigureRequest, CpalBackend, DriveMode, EngineConfig, EngineError,
    ExportSampleFormat, ExportSettings, MetronomeCallbacks, MetronomeEngine, OfflineBackend,
    Result, TEMPO_PRESETS, TimeSignature,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "practice-metronome")]
#[command(version, about = "Sample-accurate practice metronome", long_about = None)]
struct Cli {
    /// Engine config file (RON); the per-user config is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tempo in BPM (20-300)
    #[arg(short, long, default_value_t = 120)]
    tempo: u32,

    /// Time signature: 1/4 2/4 3/4 4/4 3/8 6/8 9/8 12/8
    #[arg(short = 's', long, default_value = "4/4")]
    time_signature: String,

    /// Subdivision id (see --list-subdivisions)
    #[arg(short = 'd', long, default_value = "1")]
    subdivision: String,

    /// Accent pattern, one character per beat: x accented, anything else plain ("x..x..")
    #[arg(short, long)]
    accents: Option<String>,

    /// Seconds to play or export
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Output device name (default device otherwise)
    #[arg(long)]
    device: Option<String>,

    /// Click volume (0.0-1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Print beats and state changes as JSON lines
    #[arg(long)]
    json: bool,

    /// Render to this WAV file instead of playing
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export sample rate (Hz)
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Export a mono file
    #[arg(long)]
    mono: bool,

    /// Export 32-bit float samples
    #[arg(long)]
    float: bool,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// List subdivisions for the time signature and exit
    #[arg(long)]
    list_subdivisions: bool,

    /// List tempo presets and exit
    #[arg(long)]
    presets: bool,

    /// Write the effective engine config to this RON file and exit
    /// ("default" writes to the per-user config location)
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn parse_accents(pattern: &str) -> Vec<bool> {
    pattern.chars().map(|c| c.eq_ignore_ascii_case(&'x')).collect()
}

fn list_devices() {
    let manager = AudioDeviceManager::new();
    let devices = manager.list_output_devices();
    if devices.is_empty() {
        println!("No output devices found ({})", manager.host_name());
        return;
    }
    println!("Output devices ({}):", manager.host_name());
    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("  {}{}", device.name, marker);
    }
}

fn list_subdivisions(time_signature: &str) -> Result<()> {
    let ts = TimeSignature::from_name(time_signature)
        .ok_or_else(|| EngineError::UnknownTimeSignature(time_signature.to_string()))?;
    println!("Subdivisions for {}:", ts);
    for pattern in subdivision::for_time_signature(&ts) {
        println!("  {:>3}  {}", pattern.id, pattern.label);
    }
    Ok(())
}

fn list_presets() {
    for preset in TEMPO_PRESETS.iter() {
        println!("  {:<12} {:>3} BPM", preset.name, preset.bpm);
    }
}

fn export(cli: &Cli, request: &ConfigureRequest, path: &Path, volume: f32) -> Result<()> {
    // Resolve the same way the engine would, so the file matches live playback
    let engine = MetronomeEngine::new(
        OfflineBackend::new(),
        EngineConfig {
            drive: DriveMode::Manual,
            ..Default::default()
        },
    );
    engine.configure(request.clone())?;

    let exporter = ClickTrackExporter::new(ExportSettings {
        sample_rate: cli.sample_rate,
        channels: if cli.mono { 1 } else { 2 },
        sample_format: if cli.float {
            ExportSampleFormat::Float32
        } else {
            ExportSampleFormat::Int16
        },
        volume,
    });
    let summary = exporter.export(&engine.settings(), cli.duration, path, None)?;
    println!(
        "Exported {} clicks ({:.1}s) to {}",
        summary.clicks,
        cli.duration,
        path.display()
    );
    Ok(())
}

fn play(cli: &Cli, request: ConfigureRequest, config: EngineConfig) -> Result<()> {
    if !cli.duration.is_finite() || cli.duration <= 0.0 {
        return Err(EngineError::InvalidDuration(cli.duration));
    }
    let backend = CpalBackend::new(config.device_name.clone(), config.volume);
    let engine = MetronomeEngine::new(
        backend,
        EngineConfig {
            drive: DriveMode::Threaded,
            ..config
        },
    );
    engine.configure(request)?;

    let json = cli.json;
    engine.set_callbacks(
        MetronomeCallbacks::new()
            .on_beat(move |beat| {
                if json {
                    if let Ok(line) = serde_json::to_string(beat) {
                        println!("{}", line);
                    }
                } else {
                    let marker = if beat.is_accent { ">" } else { " " };
                    println!("{} {}", marker, beat.beat_number);
                }
            })
            .on_state_change(move |state| {
                if json && let Ok(line) = serde_json::to_string(state) {
                    println!("{}", line);
                }
            }),
    );

    let settings = engine.settings();
    println!(
        "{} ({}), {}, subdivision {}",
        settings.tempo,
        settings.tempo.marking(),
        settings.time_signature,
        settings.subdivision.label
    );

    if !engine.start() {
        return Err(EngineError::Unavailable(
            "could not start audio output".to_string(),
        ));
    }
    std::thread::sleep(Duration::from_secs_f64(cli.duration));
    engine.stop();
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_devices {
        list_devices();
        return Ok(());
    }
    if cli.list_subdivisions {
        return list_subdivisions(&cli.time_signature);
    }
    if cli.presets {
        list_presets();
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_or_default(),
    };
    if let Some(device) = &cli.device {
        config.device_name = Some(device.clone());
    }
    if let Some(volume) = cli.volume {
        config.volume = volume;
    }
    let config = config.sanitized();

    if let Some(path) = &cli.write_config {
        let path = if path.as_os_str() == "default" {
            EngineConfig::default_path().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "no per-user config directory")
            })?
        } else {
            path.clone()
        };
        config.save(&path)?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }

    let mut request =
        ConfigureRequest::new(cli.tempo, cli.time_signature.clone(), cli.subdivision.clone());
    if let Some(accents) = &cli.accents {
        request = request.with_accents(parse_accents(accents));
    }

    match &cli.export {
        Some(path) => export(&cli, &request, path, config.volume),
        None => {
            info!("Engine config: {:?}", config);
            play(&cli, request, config)
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
