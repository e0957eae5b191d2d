//! Huddle console binary.
//!
//! # Usage
//!
//! ```bash
//! # Default session: mocked devices, quiet room
//! huddle
//!
//! # Chatty room, reproducible, with the camera permission refused
//! huddle --speaker-activity 0.3 --seed 7 --deny-camera
//! ```
//!
//! Line commands on stdin: `mute`, `video`, `share`,
//! `share-ended`, `chat`, `say <text>`, `recv <id> <text>`, `pinch <from> <to>`,
//! `release`, `join <id> <name>`, `leave <id>`, `end`, `rejoin`, `quit`.

use std::time::Duration;

use clap::Parser;
use huddle_app::Runtime;
use huddle_cli::{ConsoleDriver, MockAudioMeter, MockMediaDevices, SystemEnv};
use huddle_core::{SessionConfig, controls::ControlsConfig, speaker::SpeakerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Simulated video meeting in the terminal
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Headless simulated video meeting driven by line commands")]
#[command(version)]
struct Args {
    /// Hide the floating controls after this much inactivity
    #[arg(long, default_value = "3000", value_parser = clap::value_parser!(u64).range(1..))]
    hide_controls_after_ms: u64,

    /// Audio sampling interval per participant
    #[arg(long, default_value = "200", value_parser = clap::value_parser!(u64).range(1..))]
    sample_interval_ms: u64,

    /// Peak level (0-255) above which a participant counts as speaking
    #[arg(long, default_value = "50")]
    speaking_threshold: u8,

    /// Refuse camera permission
    #[arg(long)]
    deny_camera: bool,

    /// Pretend the platform cannot capture the screen
    #[arg(long)]
    no_screen_share: bool,

    /// Probability that a single audio sample is loud
    #[arg(long, default_value = "0.05", value_parser = probability)]
    speaker_activity: f64,

    /// Seed for the random audio levels
    #[arg(long)]
    seed: Option<u64>,

    /// Delay before mocked devices answer a request
    #[arg(long, default_value = "300")]
    media_latency_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn probability(value: &str) -> Result<f64, String> {
    let p: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&p) { Ok(p) } else { Err(format!("{p} is not within 0..=1")) }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "Huddle starting");

    let config = SessionConfig {
        speaker: SpeakerConfig {
            sample_interval: Duration::from_millis(args.sample_interval_ms),
            speaking_threshold: args.speaking_threshold,
        },
        controls: ControlsConfig { hide_after: Duration::from_millis(args.hide_controls_after_ms) },
        ..SessionConfig::default()
    };

    let devices = MockMediaDevices::new(Duration::from_millis(args.media_latency_ms))
        .deny_camera(args.deny_camera)
        .screen_supported(!args.no_screen_share);
    let meter = MockAudioMeter::new(seed, args.speaker_activity);
    let driver = ConsoleDriver::spawn(devices.clone());

    let runtime = Runtime::new(driver, SystemEnv::new(), devices, Box::new(meter), config);
    runtime.run().await?;

    tracing::info!("Huddle stopped");
    Ok(())
}
