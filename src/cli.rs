use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind, overrides the configuration file
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Extract audio from a video file (16kHz mono WAV)
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate subtitles from a WAV audio file
    Generate {
        /// Input audio file (16kHz mono WAV)
        #[arg(short, long)]
        input: PathBuf,

        /// Target language, as a code or a name (e.g. "es" or "Spanish")
        #[arg(short, long)]
        target_lang: String,

        /// Output subtitle file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Translate an existing SRT file
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Source language, as a code or a name
        #[arg(short, long)]
        from_lang: String,

        /// Target language, as a code or a name
        #[arg(short, long)]
        target_lang: String,

        /// Output subtitle file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate subtitles for a video file (extraction and transcription)
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language, as a code or a name
        #[arg(short, long)]
        target_lang: String,

        /// Output directory for the subtitle file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List the known languages
    Languages,
}
