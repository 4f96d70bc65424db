use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use warden_bot::voice::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use warden_bot::{Config, WardenBot};

/// Warden - voice-command moderation bot for Discord guilds
#[derive(Parser)]
#[command(name = "warden", version, about)]
struct Cli {
    /// Text command prefix
    #[arg(short, long, env = "WARDEN_PREFIX")]
    prefix: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for hosts without audio hardware)
    #[arg(long, env = "WARDEN_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Print the effective configuration sources and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,warden_bot=info",
        1 => "info,warden_bot=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::CheckConfig => check_config(),
        };
    }

    let mut config = Config::load()?;
    if let Some(prefix) = cli.prefix {
        config.command_prefix = prefix;
    }
    if cli.disable_voice {
        config.voice.enabled = false;
    }

    tracing::info!(
        prefix = %config.command_prefix,
        voice = config.voice.enabled,
        "starting warden"
    );

    WardenBot::new(config).run().await?;
    Ok(())
}

/// Record a few seconds from the default microphone and report levels
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Recording {duration}s from the default input device...");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    tokio::time::sleep(Duration::from_secs(duration)).await;
    capture.stop();

    let samples = capture.take_buffer();
    let peak = samples.iter().fold(0.0f32, |max, s| max.max(s.abs()));
    let wav = samples_to_wav(&samples, SAMPLE_RATE)?;

    println!(
        "Captured {} samples (peak level {peak:.3}, {} WAV bytes).",
        samples.len(),
        wav.len()
    );
    if peak < 0.01 {
        println!("Peak level is very low - check the microphone.");
    }

    Ok(())
}

/// Show where configuration comes from without connecting
fn check_config() -> anyhow::Result<()> {
    match warden_bot::config::file::config_file_path() {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not present)", path.display()),
        None => println!("Config file: no home directory found"),
    }

    match Config::load() {
        Ok(config) => {
            println!("Discord token: set");
            println!("Prefix: {}", config.command_prefix);
            println!("Wake word: {}", config.wake_word);
            println!(
                "Voice: {} ({:?}, model {}, {}s window)",
                if config.voice.enabled { "enabled" } else { "disabled" },
                config.voice.backend,
                config.voice.model,
                config.voice.listen_window.as_secs()
            );
            println!(
                "Mass-action pacing: {}ms",
                config.moderation.pacing.as_millis()
            );
        }
        Err(e) => println!("Configuration incomplete: {e}"),
    }

    Ok(())
}
