//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Primary input file (first -i)
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Arguments placed before the primary -i (seek, duration)
    input_args: Vec<String>,
    /// Additional input files (e.g. a palette)
    extra_inputs: Vec<PathBuf>,
    /// Arguments placed after the inputs
    output_args: Vec<String>,
    /// Whether to pass -y (overwrite) or -n (never overwrite)
    overwrite: bool,
    /// FFmpeg log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            extra_inputs: Vec::new(),
            output_args: Vec::new(),
            overwrite: false,
            log_level: "error".to_string(),
        }
    }

    /// Set seek position (before input).
    pub fn seek(mut self, seconds: f64) -> Self {
        self.input_args.push("-ss".to_string());
        self.input_args.push(format!("{seconds:.3}"));
        self
    }

    /// Set output duration.
    pub fn duration(mut self, seconds: f64) -> Self {
        self.input_args.push("-t".to_string());
        self.input_args.push(format!("{seconds:.3}"));
        self
    }

    /// Add a secondary input file.
    pub fn extra_input(mut self, input: impl AsRef<Path>) -> Self {
        self.extra_inputs.push(input.as_ref().to_path_buf());
        self
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(mut self) -> Self {
        self.output_args.push("-c".to_string());
        self.output_args.push("copy".to_string());
        self
    }

    /// Set a simple video filter.
    pub fn video_filter(mut self, filter: impl Into<String>) -> Self {
        self.output_args.push("-vf".to_string());
        self.output_args.push(filter.into());
        self
    }

    /// Set a filter graph spanning multiple inputs.
    pub fn filter_complex(mut self, filter: impl Into<String>) -> Self {
        self.output_args.push("-filter_complex".to_string());
        self.output_args.push(filter.into());
        self
    }

    /// Overwrite the output if it already exists.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Build the full argument vector.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        args.push(if self.overwrite { "-y" } else { "-n" }.to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());
        for extra in &self.extra_inputs {
            args.push("-i".to_string());
            args.push(extra.to_string_lossy().into_owned());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().into_owned());

        args
    }

    /// Run the command to completion, capturing stderr for diagnostics.
    pub async fn run(&self) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = self.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                output.status.code(),
            ))
        }
    }
}

/// Check that FFmpeg is available on PATH.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
