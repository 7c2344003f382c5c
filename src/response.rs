//! Turns a successful HTTP response into text or playable audio

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use log::info;
use serde_json::Value;
use tempfile::TempPath;

use crate::error::RunError;

/// Status, content type and body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: String::new(),
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Audio returned by a model, parked in a temp file until dropped.
pub struct AudioClip {
    path: TempPath,
    mime: String,
    len: usize,
}

impl AudioClip {
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Result<Self, RunError> {
        let mut file = tempfile::Builder::new()
            .prefix("speechlab-")
            .suffix(extension_for_mime(mime))
            .tempfile()
            .map_err(|e| RunError::StorageError(e.to_string()))?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| RunError::StorageError(e.to_string()))?;

        Ok(Self {
            path: file.into_temp_path(),
            mime: mime.to_string(),
            len: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Only meaningful for WAV output.
    pub fn wav_duration(&self) -> Option<Duration> {
        let reader = hound::WavReader::open(self.path()).ok()?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return None;
        }
        let frames = reader.duration() as f64;
        Some(Duration::from_secs_f64(frames / spec.sample_rate as f64))
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("path", &self.path.to_path_buf())
            .field("mime", &self.mime)
            .field("len", &self.len)
            .finish()
    }
}

#[derive(Debug)]
pub enum RunOutput {
    Text(String),
    Audio(AudioClip),
}

impl RunOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RunOutput::Text(text) => Some(text),
            RunOutput::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioClip> {
        match self {
            RunOutput::Audio(clip) => Some(clip),
            RunOutput::Text(_) => None,
        }
    }
}

/// Classify a 2xx response by its content type. JSON first, then audio, then plain text.
pub fn classify(response: RawResponse) -> Result<RunOutput, RunError> {
    let content_type = response
        .content_type
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("application/json") {
        let json: Value = serde_json::from_slice(&response.body).map_err(|e| {
            RunError::ParseError(format!("{}: {}", e, String::from_utf8_lossy(&response.body)))
        })?;
        info!("📝 JSON response ({} bytes)", response.body.len());
        return Ok(RunOutput::Text(extract_text(&json)));
    }

    if content_type.contains("audio/") {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        let clip = AudioClip::from_bytes(&response.body, mime)?;
        info!("🔊 Audio response: {} bytes of {}", clip.len(), clip.mime());
        return Ok(RunOutput::Audio(clip));
    }

    info!("📝 Plain response ({} bytes)", response.body.len());
    Ok(RunOutput::Text(String::from_utf8_lossy(&response.body).into_owned()))
}

/// `text`, then `result`, then the whole document.
fn extract_text(json: &Value) -> String {
    ["text", "result"]
        .iter()
        .find_map(|key| json.get(key).and_then(truthy_text))
        .unwrap_or_else(|| json.to_string())
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => ".wav",
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/ogg" | "audio/opus" => ".ogg",
        "audio/flac" | "audio/x-flac" => ".flac",
        "audio/webm" => ".webm",
        "audio/mp4" | "audio/aac" | "audio/x-m4a" => ".m4a",
        _ => ".bin",
    }
}
