//! Audio playback for recorded inputs and model output

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

/// Owns the output device. Not `Send`, keep it on the UI thread.
pub struct Player {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl Player {
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default().context("no audio output device")?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    pub fn play_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let source = Decoder::new(BufReader::new(file)).context("unsupported audio format")?;
        self.fresh_sink()?.append(source);
        info!("🔈 Playing {}", path.display());
        Ok(())
    }

    pub fn play_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let source = Decoder::new(Cursor::new(bytes.to_vec())).context("unsupported audio format")?;
        self.fresh_sink()?.append(source);
        info!("🔈 Playing {} bytes from memory", bytes.len());
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }

    fn fresh_sink(&mut self) -> Result<&Sink> {
        self.stop();
        let sink = Sink::try_new(&self.handle).context("failed to open playback sink")?;
        Ok(self.sink.insert(sink))
    }
}
