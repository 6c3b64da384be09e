//! Voxcast CLI - spoken answers and multi-voice podcasts from a topic.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use voxcast::audio::{OutputFormat, write_atomic};
use voxcast::config::{self, Config, IssueLevel};
use voxcast::prelude::*;

/// Voxcast - turn a topic into speech with Groq and Deepgram
#[derive(Parser)]
#[command(name = "voxcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "VOXCAST_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a query, optionally speaking the answer
    Ask(AskArgs),

    /// Speak a piece of text
    Speak(SpeakArgs),

    /// Generate a podcast on a topic
    Podcast(PodcastArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the ask command
#[derive(Args)]
struct AskArgs {
    /// The question to answer
    query: String,

    /// Also speak the answer and write the WAV here
    #[arg(short, long)]
    speak: Option<PathBuf>,

    /// Answer model (overrides config)
    #[arg(short, long)]
    model: Option<String>,
}

/// Arguments for the speak command
#[derive(Args)]
struct SpeakArgs {
    /// Text to speak
    text: String,

    /// Output WAV file
    #[arg(short, long, default_value = "speech.wav")]
    output: PathBuf,

    /// Voice model (overrides config)
    #[arg(long)]
    voice: Option<String>,
}

/// Arguments for the podcast command
#[derive(Args)]
struct PodcastArgs {
    /// Podcast topic
    topic: String,

    /// Total number of speakers (1-6)
    #[arg(short = 'n', long, default_value_t = 2)]
    speakers: usize,

    /// Number of male speakers
    #[arg(long, default_value_t = 1)]
    male: usize,

    /// Number of female speakers
    #[arg(long, default_value_t = 1)]
    female: usize,

    /// Output file (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from the output extension, then config)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Accept scripts wrapped in prose
    #[arg(long)]
    lenient: bool,

    /// Speakers synthesized in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Seed for voice assignment
    #[arg(long)]
    seed: Option<u64>,

    /// Print the generated script as JSON
    #[arg(long)]
    print_script: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Mp3,
    Wav,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Mp3 => Self::Mp3,
            FormatArg::Wav => Self::Wav,
        }
    }
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (keys redacted)
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init,
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "voxcast_cli={level},voxcast={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.as_deref();
    match cli.command {
        Commands::Ask(args) => cmd_ask(args, path).await,
        Commands::Speak(args) => cmd_speak(args, path).await,
        Commands::Podcast(args) => cmd_podcast(args, path).await,
        Commands::Config(args) => cmd_config(args, path).await,
    }
}

/// Answer a query.
async fn cmd_ask(args: AskArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load(config_path).await?;
    if let Some(model) = args.model {
        config.podcast.answer_model = model;
    }
    let podcaster = Podcaster::from_config(&config)?;

    let answer = podcaster.answer(&args.query).await?;
    println!("{answer}");

    if let Some(out) = args.speak {
        let audio = podcaster.speak(&answer).await?;
        write_atomic(&out, &audio).await?;
        println!("\nSpoken answer saved to: {}", out.display());
    }

    Ok(())
}

/// Speak text.
async fn cmd_speak(args: SpeakArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load(config_path).await?;
    if let Some(voice) = args.voice {
        config.podcast.answer_voice = voice;
    }
    let podcaster = Podcaster::from_config(&config)?;

    let audio = podcaster.speak(&args.text).await?;
    write_atomic(&args.output, &audio).await?;
    println!("Speech saved to: {}", args.output.display());

    Ok(())
}

/// Generate a podcast.
async fn cmd_podcast(args: PodcastArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load(config_path).await?;

    if let Some(output) = args.output {
        if let Some(format) = output
            .extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
        {
            config.output.format = format;
        }
        config.output.path = output;
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if args.lenient {
        config.podcast.lenient_parsing = true;
    }
    if let Some(concurrency) = args.concurrency {
        config.podcast.synthesis_concurrency = concurrency;
    }

    let mut podcaster = Podcaster::from_config(&config)?;
    if let Some(seed) = args.seed {
        podcaster = podcaster.with_seed(seed);
    }

    let request = PodcastRequest::new(args.topic, args.speakers, args.male, args.female);
    let output = podcaster.generate_podcast(&request).await?;

    if args.print_script {
        println!("{}", output.script.to_json_pretty().map_err(std::io::Error::other)?);
    }

    let summary = serde_json::json!({
        "title": output.title,
        "path": output.path,
        "seconds": output.duration.as_secs_f64(),
        "voices": output.voices,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).map_err(std::io::Error::other)?
    );

    Ok(())
}

/// Manage configuration.
async fn cmd_config(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let file = config_path.map_or_else(config::config_path, Path::to_path_buf);

    match args.command {
        ConfigCommands::Show => {
            let config = redacted(config::load(config_path).await?);
            let content = toml::to_string_pretty(&config).map_err(ConfigError::from)?;
            println!("{content}");
        }
        ConfigCommands::Path => {
            println!("{}", file.display());
        }
        ConfigCommands::Init => {
            if config::init_config(&file).await? {
                println!("Configuration created: {}", file.display());
                println!();
                println!("Next steps:");
                println!("  1. export GROQ_API_KEY=<key>");
                println!("  2. export DEEPGRAM_API_KEY=<key>");
                println!("  3. voxcast podcast \"AI in todays world\" -n 3 --male 1 --female 2");
            } else {
                println!("Configuration already exists at: {}", file.display());
            }
        }
        ConfigCommands::Validate => {
            let config = config::load(config_path).await?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("Configuration is valid.");
            }
            for issue in &issues {
                println!("{issue}");
            }
            if issues.iter().any(|i| i.level != IssueLevel::Warning) {
                config.ensure_valid()?;
            }
        }
    }

    Ok(())
}

fn redacted(mut config: Config) -> Config {
    for key in [&mut config.groq.api_key, &mut config.deepgram.api_key] {
        if !key.is_empty() {
            *key = "<redacted>".to_owned();
        }
    }
    config
}
