//! Loading user-picked audio files into input blobs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::model::AudioBlob;

/// Extensions offered by the file picker. The filter is advisory only.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "oga", "flac", "webm", "m4a", "aac", "opus"];

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        _ => "application/octet-stream",
    }
}

pub fn load_audio_file(path: &Path) -> Result<AudioBlob> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .context("selected path has no file name")?;

    info!("📁 Loaded {} ({} bytes)", filename, bytes.len());
    Ok(AudioBlob::new(filename, mime_for_path(path), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("a/b/speech.WAV")), "audio/wav");
        assert_eq!(mime_for_path(Path::new("clip.mp3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("clip.m4a")), "audio/mp4");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_load_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.flac");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let blob = load_audio_file(&path).unwrap();
        assert_eq!(blob.filename, "sample.flac");
        assert_eq!(blob.mime, "audio/flac");
        assert_eq!(blob.len(), 3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_audio_file(&dir.path().join("gone.wav")).is_err());
    }
}
