//! Subcommand implementations.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde_json::Value;
use tracing::{error, info, warn};

use segclip_gemini::{prompts, GeminiClient};
use segclip_ledger::{RecordUpdate, RemoteFileCheck, VideoLedger};
use segclip_media::{check_ffmpeg, extract_all_segments, extract_all_segments_as_gifs, GifOptions};
use segclip_models::{AnalysisResults, Segment, VideoRecord};

/// Build a Gemini client from `GEMINI_API_KEY`.
fn gemini_client() -> Result<GeminiClient> {
    let api_key = std::env::var("GEMINI_API_KEY").context(
        "GEMINI_API_KEY not set. Get an API key from https://aistudio.google.com/app/apikey",
    )?;
    Ok(GeminiClient::new(api_key))
}

/// Human-readable remaining lifetime, or `EXPIRED`.
fn format_time_remaining(remaining: Duration) -> String {
    if remaining < Duration::zero() {
        return "EXPIRED".to_string();
    }
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m remaining")
    } else {
        format!("{minutes}m remaining")
    }
}

pub async fn upload(
    ledger: &VideoLedger,
    video_path: &Path,
    name: Option<String>,
    description: Option<String>,
    force: bool,
) -> Result<()> {
    if !video_path.exists() {
        bail!("Video file not found: {}", video_path.display());
    }

    let display_name = name.clone().unwrap_or_else(|| {
        video_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    if !force {
        if let Some(existing) = ledger.get_by_name(&display_name).await? {
            bail!(
                "Video '{}' already exists (ID: {}). Use --force to re-upload.",
                existing.display_name,
                existing.id
            );
        }
    }

    let client = gemini_client()?;
    info!("Uploading video: {}", video_path.display());
    let file = client.upload_file(video_path, Some(&display_name)).await?;
    let file = client.wait_for_active(&file.name).await?;
    info!("Video uploaded successfully: {}", file.name);

    let mut metadata = HashMap::new();
    metadata.insert("uri".to_string(), Value::from(file.uri.clone()));
    if let Some(mime_type) = &file.mime_type {
        metadata.insert("mime_type".to_string(), Value::from(mime_type.clone()));
    }

    let record = ledger
        .add(
            video_path,
            file.id(),
            &file.name,
            name.as_deref(),
            description.as_deref(),
            Some(metadata),
        )
        .await?;

    println!("\nVideo added to ledger:");
    println!("  ID: {}", record.id);
    println!("  Name: {}", record.display_name);
    println!("  Remote file: {}", record.file_name);
    Ok(())
}

pub async fn list(ledger: &VideoLedger, verbose: bool, skip_check: bool) -> Result<()> {
    let videos = ledger.list().await?;
    if videos.is_empty() {
        println!("No videos in ledger.");
        return Ok(());
    }

    let client = if skip_check {
        None
    } else {
        match gemini_client() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("{e:#} - cannot verify remote file existence");
                None
            }
        }
    };

    println!("\nUploaded videos ({}):", videos.len());
    println!("{}", "=".repeat(100));

    let mut expired_count = 0;
    for video in &videos {
        let status = if video.is_expired() {
            expired_count += 1;
            "EXPIRED".to_string()
        } else {
            format_time_remaining(video.time_until_expiry())
        };

        println!("\nID: {}", video.id);
        println!("Name: {}", video.display_name);
        println!("Local path: {}", video.local_path);
        println!("Remote file: {}", video.file_name);
        println!("Uploaded: {}", video.uploaded_at.to_rfc3339());
        println!("Expiry status: {status}");

        if let Some(client) = &client {
            let exists = client.file_is_active(&video.file_name).await;
            println!("File exists in API: {}", if exists { "YES" } else { "NO" });
        }
        if !video.description.is_empty() {
            println!("Description: {}", video.description);
        }
        if verbose && !video.metadata.is_empty() {
            println!("Metadata: {}", serde_json::to_string(&video.metadata)?);
        }
    }

    println!("{}", "=".repeat(100));
    if expired_count > 0 {
        println!("\n{expired_count} video(s) expired. Run 'segclip cleanup' to remove them.");
    }
    Ok(())
}

pub async fn show(ledger: &VideoLedger, id: u64, skip_check: bool) -> Result<()> {
    let video = ledger
        .get(id)
        .await?
        .with_context(|| format!("Video ID {id} not found"))?;

    println!("\nVideo details:");
    println!("{}", "=".repeat(100));
    println!("ID: {}", video.id);
    println!("Name: {}", video.display_name);
    println!("Local path: {}", video.local_path);
    println!("Remote file ID: {}", video.file_id);
    println!("Remote file name: {}", video.file_name);
    println!("Uploaded: {}", video.uploaded_at.to_rfc3339());
    println!("Expires: {}", video.expiry_time().to_rfc3339());

    if video.is_expired() {
        println!("Status: EXPIRED");
    } else {
        println!(
            "Status: Active ({})",
            format_time_remaining(video.time_until_expiry())
        );
    }

    if !skip_check {
        let client = gemini_client()?;
        let exists = client.file_is_active(&video.file_name).await;
        println!("File exists in API: {}", if exists { "YES" } else { "NO" });
    }

    println!("Description: {}", video.description);
    println!("Metadata: {}", serde_json::to_string(&video.metadata)?);
    println!("{}", "=".repeat(100));
    Ok(())
}

pub async fn update(
    ledger: &VideoLedger,
    id: u64,
    name: Option<String>,
    description: Option<String>,
) -> Result<()> {
    if name.is_none() && description.is_none() {
        bail!("No updates specified. Use --name or --description");
    }

    let found = ledger
        .update(
            id,
            RecordUpdate {
                display_name: name,
                description,
                metadata: None,
            },
        )
        .await?;

    if !found {
        bail!("Video ID {id} not found");
    }
    println!("Updated video ID {id}");
    Ok(())
}

pub async fn delete(ledger: &VideoLedger, id: u64, delete_remote: bool) -> Result<()> {
    let video = ledger
        .get(id)
        .await?
        .with_context(|| format!("Video ID {id} not found"))?;

    if delete_remote {
        let client = gemini_client()?;
        info!("Deleting remote file: {}", video.file_name);
        if let Err(e) = client.delete_file(&video.file_name).await {
            warn!("Failed to delete remote file: {e}");
        }
    }

    if ledger.delete(id).await? {
        println!("Deleted video '{}' (ID: {id})", video.display_name);
    }
    Ok(())
}

pub async fn cleanup(ledger: &VideoLedger, skip_check: bool, yes: bool) -> Result<()> {
    let videos = ledger.list().await?;
    if videos.is_empty() {
        println!("No videos in ledger.");
        return Ok(());
    }

    let expired: Vec<&VideoRecord> = videos.iter().filter(|v| v.is_expired()).collect();
    if expired.is_empty() {
        println!("No expired videos found.");
        return Ok(());
    }

    let client = if skip_check { None } else { Some(gemini_client()?) };

    println!("\nFound {} expired video(s):", expired.len());
    for video in &expired {
        println!(
            "  [{}] {} (uploaded {}, expired {})",
            video.id,
            video.display_name,
            video.uploaded_at.to_rfc3339(),
            video.expiry_time().to_rfc3339()
        );
        if let Some(client) = &client {
            let exists = client.file_is_active(&video.file_name).await;
            println!("      File still exists in API: {}", remote_status(exists));
        }
    }

    if !yes && !confirm(&format!("Delete {} expired video(s) from ledger?", expired.len()))? {
        println!("Cancelled.");
        return Ok(());
    }
    let report = ledger
        .cleanup_expired(client.as_ref().map(|c| c as &dyn RemoteFileCheck))
        .await?;

    println!("\nCleanup complete:");
    println!("  Deleted: {} video(s)", report.deleted.len());
    if !report.kept.is_empty() {
        println!(
            "  Kept: {} video(s) (file still exists in API)",
            report.kept.len()
        );
    }
    if !report.deleted.is_empty() {
        let ids: Vec<String> = report.deleted.iter().map(u64::to_string).collect();
        println!("\nDeleted video IDs: {}", ids.join(", "));
    }
    Ok(())
}

/// Label an expired record's remote state in the cleanup preview.
fn remote_status(exists: bool) -> &'static str {
    if exists {
        "YES (will keep)"
    } else {
        "NO (will delete)"
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("\n{question} [y/N]: ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

#[allow(clippy::too_many_arguments)]
pub async fn analyze(
    ledger: &VideoLedger,
    id: u64,
    prompt_names: Vec<String>,
    output_dir: &Path,
    extract_clips: bool,
    gifs: bool,
    fps: u32,
    padding: f64,
) -> Result<()> {
    let video = ledger
        .get(id)
        .await?
        .with_context(|| format!("Video ID {id} not found"))?;

    if video.is_expired() {
        bail!(
            "Video ID {id} has expired. Re-upload it with: segclip upload {}",
            video.local_path
        );
    }

    let client = gemini_client()?;
    if !client.file_is_active(&video.file_name).await {
        bail!(
            "Remote file for video ID {id} no longer exists. Re-upload it with: segclip upload {}",
            video.local_path
        );
    }

    let file_uri = match video.metadata.get("uri").and_then(Value::as_str) {
        Some(uri) => uri.to_string(),
        None => client.get_file(&video.file_name).await?.uri,
    };
    let mime_type = video
        .metadata
        .get("mime_type")
        .and_then(Value::as_str)
        .map(str::to_string);

    let prompt_names = if prompt_names.is_empty() {
        prompts::names().iter().map(|s| s.to_string()).collect()
    } else {
        prompt_names
    };

    info!(
        "Analyzing '{}' with {} prompt(s): {}",
        video.display_name,
        prompt_names.len(),
        prompt_names.join(", ")
    );

    for name in &prompt_names {
        let Some(prompt) = prompts::get(name) else {
            error!(
                "Unknown prompt '{name}'. Available: {}",
                prompts::names().join(", ")
            );
            continue;
        };

        info!("Running prompt: {name}");
        let segments = match client
            .analyze_video_segments(&file_uri, mime_type.as_deref(), prompt, fps)
            .await
        {
            Ok(segments) => segments,
            Err(e) => {
                // One failed prompt aborts only itself
                error!("Prompt '{name}' failed: {e}");
                continue;
            }
        };

        let run_dir = output_dir.join(&video.display_name).join(name);
        tokio::fs::create_dir_all(&run_dir).await?;

        let results = AnalysisResults::new(name.clone(), segments.clone(), Some(&video));
        let results_path = run_dir.join(format!("{name}_analysis.json"));
        results.save(&results_path)?;
        info!("Saved analysis results to {}", results_path.display());

        print_segments(name, &segments);

        if extract_clips || gifs {
            run_extraction(
                Path::new(&video.local_path),
                &segments,
                &run_dir,
                name,
                gifs,
                padding,
            )
            .await?;
        }
    }
    Ok(())
}

pub async fn extract(
    results_path: &Path,
    video: Option<PathBuf>,
    output_dir: &Path,
    gifs: bool,
    padding: f64,
) -> Result<()> {
    let results = AnalysisResults::load(results_path)
        .with_context(|| format!("Failed to load {}", results_path.display()))?;

    let source = match video {
        Some(path) => path,
        None => results
            .video_info
            .as_ref()
            .map(|info| PathBuf::from(&info.local_path))
            .context("Results file has no video_info; pass --video")?,
    };
    if !source.exists() {
        bail!("Source video not found: {}", source.display());
    }

    info!(
        "Extracting {} segment(s) from {} ({})",
        results.segment_count,
        source.display(),
        results.prompt_name
    );
    run_extraction(
        &source,
        &results.segments,
        output_dir,
        &results.prompt_name,
        gifs,
        padding,
    )
    .await
}

async fn run_extraction(
    source: &Path,
    segments: &[Segment],
    base_dir: &Path,
    prefix: &str,
    gifs: bool,
    padding: f64,
) -> Result<()> {
    check_ffmpeg()?;
    if gifs {
        let gif_dir = base_dir.join("gifs");
        let produced = extract_all_segments_as_gifs(
            source,
            segments,
            &gif_dir,
            prefix,
            padding,
            &GifOptions::default(),
        )
        .await?;
        println!(
            "Produced {}/{} GIFs in {}",
            produced.len(),
            segments.len(),
            gif_dir.display()
        );
    } else {
        let clip_dir = base_dir.join("videos");
        let produced =
            extract_all_segments(source, segments, &clip_dir, prefix, true, padding).await?;
        println!(
            "Extracted {}/{} clips to {}",
            produced.len(),
            segments.len(),
            clip_dir.display()
        );
    }
    Ok(())
}

fn print_segments(prompt_name: &str, segments: &[Segment]) {
    println!("\nResults for prompt '{prompt_name}':");
    println!("{}", "-".repeat(80));
    for (i, segment) in segments.iter().enumerate() {
        println!("\n{}. {}", i + 1, segment.activity);
        println!("   Timestamp: {} - {}", segment.start_time, segment.end_time);
        if !segment.description.is_empty() {
            println!("   {}", segment.description);
        }
    }
    println!();
}

pub fn list_prompts() {
    println!("Available prompts:");
    for name in prompts::names() {
        println!("  {name}");
    }
}
