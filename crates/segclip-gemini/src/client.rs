//! Gemini API client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use segclip_ledger::RemoteFileCheck;
use segclip_models::{parse_segments_response, Segment};

use crate::error::{GeminiError, GeminiResult};

/// Model used for video analysis.
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Frame sampling rate sent with video parts, frames per second.
pub const DEFAULT_SAMPLING_FPS: u32 = 2;

/// How often to poll an uploaded file's processing state.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    StateUnspecified,
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

impl FileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::StateUnspecified => "STATE_UNSPECIFIED",
            FileState::Processing => "PROCESSING",
            FileState::Active => "ACTIVE",
            FileState::Failed => "FAILED",
            FileState::Unknown => "UNKNOWN",
        }
    }
}

/// Metadata of a file held by the Files API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Resource name, e.g. `files/abc123`
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub uri: String,
    pub state: FileState,
}

impl FileMetadata {
    /// The identifier fragment after `files/`.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: FileMetadata,
}

/// generateContent request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_metadata: Option<VideoPartMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    file_uri: String,
}

#[derive(Debug, Serialize)]
struct VideoPartMetadata {
    fps: u32,
}

/// generateContent response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Upload a local video via the resumable upload protocol.
    ///
    /// The returned metadata usually reports `PROCESSING`; call
    /// [`wait_for_active`](Self::wait_for_active) before referencing the
    /// file in a prompt.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        display_name: Option<&str>,
    ) -> GeminiResult<FileMetadata> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = guess_mime_type(path);
        let display_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path));

        info!(
            "Uploading {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            mime_type
        );

        // Step 1: open a resumable upload session
        let start_url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let response = self
            .client
            .post(&start_url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let upload_url = response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GeminiError::upload_failed("no upload URL in start response"))?;

        // Step 2: send the bytes and finalize in one shot
        let response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let response = check_status(response).await?;

        let envelope: FileEnvelope = response.json().await?;
        info!("Upload accepted: {}", envelope.file.name);
        Ok(envelope.file)
    }

    /// Poll a file until it leaves `PROCESSING`.
    ///
    /// Blocks until the file becomes `ACTIVE`; any other terminal state
    /// is an error. There is no timeout, matching the upload tool's
    /// wait-forever behavior.
    pub async fn wait_for_active(&self, name: &str) -> GeminiResult<FileMetadata> {
        let mut file = self.get_file(name).await?;
        while file.state == FileState::Processing {
            info!("Waiting for video processing...");
            tokio::time::sleep(POLL_INTERVAL).await;
            file = self.get_file(name).await?;
        }

        if file.state != FileState::Active {
            return Err(GeminiError::ProcessingFailed(file.state.as_str().to_string()));
        }
        Ok(file)
    }

    /// Fetch metadata for `files/...`.
    pub async fn get_file(&self, name: &str) -> GeminiResult<FileMetadata> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);
        let response = check_status(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Delete a file from the Files API.
    pub async fn delete_file(&self, name: &str) -> GeminiResult<()> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);
        check_status(self.client.delete(&url).send().await?).await?;
        info!("Deleted remote file {name}");
        Ok(())
    }

    /// Ask the model to segment an uploaded video, returning the raw
    /// reply text.
    pub async fn generate_segments(
        &self,
        file_uri: &str,
        mime_type: Option<&str>,
        prompt: &str,
        fps: u32,
    ) -> GeminiResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        file_data: Some(FileData {
                            mime_type: mime_type.map(str::to_string),
                            file_uri: file_uri.to_string(),
                        }),
                        video_metadata: Some(VideoPartMetadata { fps }),
                        text: None,
                    },
                    Part {
                        file_data: None,
                        video_metadata: None,
                        text: Some(prompt.to_string()),
                    },
                ],
            }],
        };

        debug!("Calling {GEMINI_MODEL} generateContent (fps {fps})");
        let response = self.client.post(&url).json(&request).send().await?;
        let response = check_status(response).await?;

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or(GeminiError::EmptyResponse)?;

        Ok(text)
    }

    /// Segment an uploaded video and parse the reply.
    pub async fn analyze_video_segments(
        &self,
        file_uri: &str,
        mime_type: Option<&str>,
        prompt: &str,
        fps: u32,
    ) -> GeminiResult<Vec<Segment>> {
        let text = self
            .generate_segments(file_uri, mime_type, prompt, fps)
            .await?;
        Ok(parse_segments_response(&text)?)
    }
}

#[async_trait]
impl RemoteFileCheck for GeminiClient {
    /// True only when the file exists and reports `ACTIVE`. Any query
    /// failure, not-found included, comes back as `false`.
    async fn file_is_active(&self, file_name: &str) -> bool {
        match self.get_file(file_name).await {
            Ok(file) => file.state == FileState::Active,
            Err(e) => {
                warn!("Remote file check failed for {file_name}: {e}");
                false
            }
        }
    }
}

async fn check_status(response: reqwest::Response) -> GeminiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(GeminiError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Guess a video mime type from the file extension.
fn guess_mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mpg") | Some("mpeg") => "video/mpeg",
        _ => "application/octet-stream",
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file_json(state: &str) -> serde_json::Value {
        serde_json::json!({
            "name": "files/abc123",
            "displayName": "sample",
            "mimeType": "video/mp4",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
            "state": state,
        })
    }

    #[tokio::test]
    async fn test_get_file_parses_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/abc123"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_json("ACTIVE")))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.uri());
        let file = client.get_file("files/abc123").await.unwrap();
        assert_eq!(file.state, FileState::Active);
        assert_eq!(file.id(), "abc123");
    }

    #[tokio::test]
    async fn test_file_is_active_swallows_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_json("ACTIVE")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/processing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_json("PROCESSING")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.uri());
        assert!(client.file_is_active("files/active").await);
        assert!(!client.file_is_active("files/processing").await);
        assert!(!client.file_is_active("files/gone").await);
    }

    #[tokio::test]
    async fn test_delete_file_maps_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/files/abc123"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.uri());
        let err = client.delete_file("files/abc123").await.unwrap_err();
        assert!(matches!(err, GeminiError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_upload_file_two_step() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/upload-session", server.uri());

        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("X-Goog-Upload-URL", upload_url.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload-session"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "file": file_json("PROCESSING") })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("sample.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let client = GeminiClient::new("test-key").with_base_url(server.uri());
        let file = client.upload_file(&video, None).await.unwrap();
        assert_eq!(file.name, "files/abc123");
        assert_eq!(file.state, FileState::Processing);
    }

    #[tokio::test]
    async fn test_generate_segments_extracts_text() {
        let server = MockServer::start().await;
        let reply = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "text": "```json\n[{\"start_time\":\"00:00\",\"end_time\":\"00:10\",\"activity\":\"Open door\"}]\n```"
                    }]
                }
            }]
        });
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{GEMINI_MODEL}:generateContent")))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.uri());
        let segments = client
            .analyze_video_segments("https://example/files/abc123", Some("video/mp4"), "prompt", 2)
            .await
            .unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].activity, "Open door");
    }

    #[tokio::test]
    async fn test_generate_segments_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{GEMINI_MODEL}:generateContent")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.uri());
        let err = client
            .generate_segments("uri", None, "prompt", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse));
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("a/b.MP4")), "video/mp4");
        assert_eq!(guess_mime_type(Path::new("clip.webm")), "video/webm");
        assert_eq!(guess_mime_type(Path::new("noext")), "application/octet-stream");
    }
}
