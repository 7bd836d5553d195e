use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Media file to load into the interactive menu
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show format and stream information for a media file
    Info {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Convert a file to another container format
    Convert {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Target format extension (e.g. mp4, mp3, mkv)
        #[arg(short, long, default_value = "mp4")]
        format: String,
    },

    /// Extract the audio track to an MP3 file
    Extract {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compress a video file with libx264
    Compress {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Cut a section out of a video without re-encoding
    Trim {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Start time (HH:MM:SS or seconds)
        #[arg(short, long)]
        start: String,

        /// Duration (HH:MM:SS or seconds)
        #[arg(short, long)]
        duration: String,
    },

    /// Split a video into segments (pick exactly one of --duration, --size-mb, --parts)
    Split {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Segment duration (HH:MM:SS or seconds)
        #[arg(short, long)]
        duration: Option<String>,

        /// Approximate segment size in MiB
        #[arg(long)]
        size_mb: Option<u64>,

        /// Number of equal-duration parts (2 or more)
        #[arg(short, long)]
        parts: Option<u32>,
    },

    /// Attempt to repair a broken or truncated video file
    Repair {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },
}
