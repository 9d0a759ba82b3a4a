//! subgen - video to subtitle pipeline
//!
//! Entry point for the CLI and the HTTP service. Audio is extracted with
//! ffmpeg; transcription and translation go through a generative model.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subgen::cli::{Args, Commands};
use subgen::config::Config;
use subgen::language::LanguageTable;
use subgen::media::MediaExtractorFactory;
use subgen::model::{GeminiClient, GenerativeModel};
use subgen::server::{self, AppState};
use subgen::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;
    let languages = LanguageTable::standard();

    match args.command {
        Commands::Languages => {
            println!("{:<15} {:<6}", "Language", "Code");
            println!("{}", "-".repeat(21));
            for tag in languages.entries() {
                println!("{:<15} {:<6}", tag.name, tag.code);
            }
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());

            let extractor = MediaExtractorFactory::create_extractor(config.media.clone());
            extractor.check_availability().await?;

            let video = tokio::fs::read(&input).await?;
            let progress = spinner("Extracting audio with ffmpeg");
            let audio = extractor.extract_audio(&video, extension(&input)).await;
            progress.finish_and_clear();
            let audio = audio?;

            tokio::fs::write(&output, audio.bytes()).await?;
            info!(
                "Wrote {:.1}s of audio to {}",
                audio.duration_secs(),
                output.display()
            );
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }

            let workflow = build_workflow(&config)?;
            workflow.extractor().check_availability().await?;
            info!("Using {}", workflow.extractor().version_info().await?);

            server::serve(AppState::new(workflow), &config.server).await?;
        }
        Commands::Generate {
            input,
            target_lang,
            output,
        } => {
            let language = languages.resolve(&target_lang)?;
            info!("Generating {} subtitles for: {}", language, input.display());

            let workflow = build_workflow(&config)?;
            let audio = tokio::fs::read(&input).await?;

            let progress = spinner("Waiting for the model");
            let artifact = workflow.generate_from_audio(audio, &language).await;
            progress.finish_and_clear();
            let artifact = artifact?;

            let output = output.unwrap_or_else(|| sibling(&input, &artifact.filename));
            artifact.write_to(&output).await?;
        }
        Commands::Translate {
            input,
            from_lang,
            target_lang,
            output,
        } => {
            let from = languages.resolve(&from_lang)?;
            let to = languages.resolve(&target_lang)?;
            info!("Translating subtitles {} -> {}: {}", from, to, input.display());

            let workflow = build_workflow(&config)?;
            let subtitles = tokio::fs::read(&input).await?;

            let progress = spinner("Waiting for the model");
            let artifact = workflow.translate_subtitles(&subtitles, &from, &to).await;
            progress.finish_and_clear();
            let artifact = artifact?;

            let output = output.unwrap_or_else(|| sibling(&input, &artifact.filename));
            artifact.write_to(&output).await?;
        }
        Commands::Process {
            input,
            target_lang,
            output_dir,
        } => {
            let language = languages.resolve(&target_lang)?;
            info!("Processing video file: {}", input.display());

            let workflow = build_workflow(&config)?;
            workflow.extractor().check_availability().await?;
            let video = tokio::fs::read(&input).await?;

            let progress = spinner("Extracting audio and waiting for the model");
            let artifact = workflow
                .generate_from_video(&video, extension(&input), &language)
                .await;
            progress.finish_and_clear();
            let artifact = artifact?;

            let output = match output_dir {
                Some(dir) => dir.join(&artifact.filename),
                None => sibling(&input, &artifact.filename),
            };
            artifact.write_to(&output).await?;
        }
    }

    info!("subgen completed successfully");
    Ok(())
}

/// `--config`, then `./config.toml`, then defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// The model credential is required up front; a missing key is fatal.
fn build_workflow(config: &Config) -> Result<Workflow> {
    let api_key = config.model.resolve_api_key()?;
    let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::new(config.model.clone(), api_key)?);
    info!("Using model {}", model.model_name());

    Ok(Workflow::from_config(config, model))
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn sibling(input: &Path, filename: &str) -> PathBuf {
    input
        .parent()
        .map(|dir| dir.join(filename))
        .unwrap_or_else(|| PathBuf::from(filename))
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subgen").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subgen.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subgen.log").display()
    );

    Ok(())
}
