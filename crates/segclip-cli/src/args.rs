//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Segment videos with Gemini and cut clips with ffmpeg.
#[derive(Debug, Parser)]
#[command(name = "segclip", version, about)]
pub struct Cli {
    /// Path to the video ledger JSON file
    #[arg(long, global = true, default_value = "videos.json")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a video to the Gemini Files API and record it
    Upload {
        /// Path to the video file
        video_path: PathBuf,

        /// Display name (default: filename stem)
        #[arg(long)]
        name: Option<String>,

        /// Description of the video
        #[arg(long)]
        description: Option<String>,

        /// Re-upload even if the display name already exists
        #[arg(long)]
        force: bool,
    },

    /// List all recorded videos with expiry status
    List {
        /// Show stored metadata as well
        #[arg(short, long)]
        verbose: bool,

        /// Skip checking whether files still exist remotely
        #[arg(long)]
        skip_check: bool,
    },

    /// Show details of one video
    Show {
        /// Video ID
        id: u64,

        /// Skip the remote existence check
        #[arg(long)]
        skip_check: bool,
    },

    /// Update a video's display name or description
    Update {
        /// Video ID
        id: u64,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a video from the ledger
    Delete {
        /// Video ID
        id: u64,

        /// Also delete the remote file, not just the ledger entry
        #[arg(long)]
        delete_remote: bool,
    },

    /// Remove expired videos from the ledger
    Cleanup {
        /// Delete all locally expired entries without asking the API
        #[arg(long)]
        skip_check: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Analyze an uploaded video with one or more prompts
    Analyze {
        /// Video ID from the ledger
        id: u64,

        /// Prompts to run (default: all); see `segclip prompts`
        #[arg(long = "prompt")]
        prompts: Vec<String>,

        /// Base directory for results and extracted clips
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Also extract a clip per segment with ffmpeg
        #[arg(long)]
        extract: bool,

        /// Extract segments as GIFs instead of video clips
        #[arg(long)]
        gifs: bool,

        /// Frame sampling rate sent to the model
        #[arg(long, default_value_t = segclip_gemini::DEFAULT_SAMPLING_FPS)]
        fps: u32,

        /// Seconds of padding around each extracted segment
        #[arg(long, default_value_t = 1.0)]
        padding: f64,
    },

    /// Extract clips from a saved analysis-results file
    Extract {
        /// Path to a `*_analysis.json` file
        results: PathBuf,

        /// Source video (default: the path recorded in the results file)
        #[arg(long)]
        video: Option<PathBuf>,

        /// Directory for the extracted files
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Produce GIFs instead of video clips
        #[arg(long)]
        gifs: bool,

        /// Seconds of padding around each segment
        #[arg(long, default_value_t = 1.0)]
        padding: f64,
    },

    /// List available analysis prompts
    Prompts,
}
