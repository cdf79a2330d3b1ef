//! Segment extraction and GIF conversion.

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use segclip_models::{time_to_seconds, Segment};

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// GIF conversion settings.
#[derive(Debug, Clone)]
pub struct GifOptions {
    /// Re-encode once at reduced width if the result exceeds this size
    pub max_size_mb: f64,
    /// Output frame rate
    pub fps: u32,
    /// Output width in pixels; height follows the aspect ratio
    pub width: u32,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            max_size_mb: 4.0,
            fps: 10,
            width: 480,
        }
    }
}

/// Cut one segment out of `input` as a stream copy.
///
/// `padding_secs` is subtracted from the start (clamped at zero) and
/// added to the end. Returns false and logs on any failure; transcoder
/// errors never propagate to the caller.
pub async fn extract_segment(
    input: impl AsRef<Path>,
    segment: &Segment,
    output: impl AsRef<Path>,
    overwrite: bool,
    padding_secs: f64,
) -> bool {
    let input = input.as_ref();
    let output = output.as_ref();

    match try_extract_segment(input, segment, output, overwrite, padding_secs).await {
        Ok(()) => {
            info!("Extracted segment to {}", output.display());
            true
        }
        Err(e) => {
            error!(
                "Failed to extract segment {} - {}: {}",
                segment.start_time, segment.end_time, e
            );
            false
        }
    }
}

async fn try_extract_segment(
    input: &Path,
    segment: &Segment,
    output: &Path,
    overwrite: bool,
    padding_secs: f64,
) -> MediaResult<()> {
    let start_secs = time_to_seconds(&segment.start_time)?;
    let end_secs = time_to_seconds(&segment.end_time)?;

    let start_secs = (start_secs - padding_secs).max(0.0);
    let end_secs = end_secs + padding_secs;
    let duration = end_secs - start_secs;

    if padding_secs > 0.0 {
        info!(
            "Extracting segment: {} - {} (+{padding_secs}s padding) to {}",
            segment.start_time,
            segment.end_time,
            output.display()
        );
    } else {
        info!(
            "Extracting segment: {} - {} to {}",
            segment.start_time,
            segment.end_time,
            output.display()
        );
    }

    FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(duration)
        .codec_copy()
        .overwrite(overwrite)
        .run()
        .await
}

/// Extract every segment to its own file under `output_dir`.
///
/// Filenames are `{prefix}_{index:03}_{sanitized_activity}{ext}` with a
/// 1-based index. A failed segment is skipped, not fatal; the returned
/// paths are the successes, in input order.
pub async fn extract_all_segments(
    input: impl AsRef<Path>,
    segments: &[Segment],
    output_dir: impl AsRef<Path>,
    prefix: &str,
    overwrite: bool,
    padding_secs: f64,
) -> MediaResult<Vec<PathBuf>> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    tokio::fs::create_dir_all(output_dir).await?;

    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut extracted = Vec::new();
    for (index, segment) in segments.iter().enumerate() {
        let filename = segment_filename(prefix, index + 1, &segment.activity, &ext);
        let output = output_dir.join(filename);

        if extract_segment(input, segment, &output, overwrite, padding_secs).await {
            extracted.push(output);
        }
    }

    info!(
        "Extracted {}/{} segments to {}",
        extracted.len(),
        segments.len(),
        output_dir.display()
    );
    Ok(extracted)
}

/// Derive the output filename for one segment.
pub fn segment_filename(prefix: &str, index: usize, activity: &str, ext: &str) -> String {
    format!("{prefix}_{index:03}_{}{ext}", sanitize_activity(activity))
}

/// Make an activity label filesystem-safe: everything outside
/// alphanumerics, spaces, hyphens and underscores becomes an
/// underscore, then spaces become underscores, lowercased.
fn sanitize_activity(activity: &str) -> String {
    activity
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else if c == ' ' {
                ' '
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace(' ', "_")
        .to_lowercase()
}

/// Convert a clip to a size-optimized animated GIF.
///
/// Two-pass transcode: generate a color palette, then apply it. If the
/// result exceeds `max_size_mb`, re-encodes once at 75% width,
/// replacing the oversized output. Returns false on any failure.
pub async fn convert_to_gif(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &GifOptions,
) -> bool {
    let input = input.as_ref();
    let output = output.as_ref();

    match try_convert_to_gif(input, output, options).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to convert {} to GIF: {e}", input.display());
            false
        }
    }
}

async fn try_convert_to_gif(input: &Path, output: &Path, options: &GifOptions) -> MediaResult<()> {
    run_gif_passes(input, output, options.fps, options.width).await?;

    let size_mb = tokio::fs::metadata(output).await?.len() as f64 / (1024.0 * 1024.0);
    if size_mb > options.max_size_mb {
        let reduced = options.width * 3 / 4;
        warn!(
            "GIF is {size_mb:.1} MB (limit {:.1} MB), retrying at width {reduced}",
            options.max_size_mb
        );
        run_gif_passes(input, output, options.fps, reduced).await?;
    }

    info!("Converted {} to {}", input.display(), output.display());
    Ok(())
}

/// palettegen + paletteuse. The palette file is removed whether or not
/// the second pass succeeds.
async fn run_gif_passes(input: &Path, output: &Path, fps: u32, width: u32) -> MediaResult<()> {
    let palette = output.with_extension("palette.png");
    let scale = format!("fps={fps},scale={width}:-1:flags=lanczos");

    FfmpegCommand::new(input, &palette)
        .video_filter(format!("{scale},palettegen"))
        .overwrite(true)
        .run()
        .await?;

    let result = FfmpegCommand::new(input, output)
        .extra_input(&palette)
        .filter_complex(format!("{scale}[x];[x][1:v]paletteuse"))
        .overwrite(true)
        .run()
        .await;

    if let Err(e) = tokio::fs::remove_file(&palette).await {
        warn!("Failed to remove palette {}: {e}", palette.display());
    }
    result
}

/// Extract all segments as GIFs.
///
/// Clips are cut into a temporary directory, converted one by one, and
/// the temporary directory is removed. Returns the GIF paths that were
/// produced, in input order.
pub async fn extract_all_segments_as_gifs(
    input: impl AsRef<Path>,
    segments: &[Segment],
    output_dir: impl AsRef<Path>,
    prefix: &str,
    padding_secs: f64,
    options: &GifOptions,
) -> MediaResult<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    tokio::fs::create_dir_all(output_dir).await?;

    let temp_dir = tempfile::tempdir()?;
    let clips = extract_all_segments(
        input,
        segments,
        temp_dir.path(),
        prefix,
        true,
        padding_secs,
    )
    .await?;

    let mut gifs = Vec::new();
    for clip in clips {
        let stem = clip
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let gif_path = output_dir.join(format!("{stem}.gif"));

        if convert_to_gif(&clip, &gif_path, options).await {
            gifs.push(gif_path);
        }
    }

    info!(
        "Converted {}/{} clips to GIFs in {}",
        gifs.len(),
        segments.len(),
        output_dir.display()
    );
    Ok(gifs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_activity() {
        assert_eq!(sanitize_activity("Pick up Cup #1!"), "pick_up_cup__1_");
        assert_eq!(sanitize_activity("Open door"), "open_door");
        assert_eq!(sanitize_activity("wipe-down_counter"), "wipe-down_counter");
    }

    #[test]
    fn test_segment_filename() {
        assert_eq!(
            segment_filename("p", 2, "Pick up Cup #1!", ".mp4"),
            "p_002_pick_up_cup__1_.mp4"
        );
        assert_eq!(
            segment_filename("segment", 12, "Open door", ".mov"),
            "segment_012_open_door.mov"
        );
    }

    #[tokio::test]
    async fn test_extract_segment_rejects_bad_times_without_panicking() {
        let segment = Segment {
            start_time: "abc".to_string(),
            end_time: "00:10".to_string(),
            activity: "Broken".to_string(),
            description: String::new(),
        };
        // Invalid time literal surfaces as a false result, not an error
        assert!(!extract_segment("in.mp4", &segment, "out.mp4", true, 1.0).await);
    }
}
