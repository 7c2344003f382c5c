//! Compile-time defaults for SpeechLab
//! Runtime preferences live in `settings.rs`.

/// Endpoint pre-filled into the first model configuration of a session
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/process";

/// Multipart field carrying the requested output kind
pub const OUTPUT_TYPE_FIELD: &str = "output_type";

/// Audio Configuration
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const DEFAULT_RECORDING_SAMPLE_RATE: u32 = 16000;

/// How long a toast stays on screen unless overridden in settings
pub const DEFAULT_NOTICE_SECONDS: f32 = 4.0;
