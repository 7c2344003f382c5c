//! SpeechLab - test bench for speech model endpoints
//!
//! Describe a model endpoint with typed text/audio inputs, fill them in,
//! run it, and inspect the text or audio that comes back.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod playback;
pub mod recorder;
pub mod request;
pub mod response;
pub mod settings;
pub mod upload;
pub mod workbench;

pub use dispatch::{dispatch, HttpTransport, Transport};
pub use error::{EditError, RunError};
pub use model::{AudioBlob, InputField, InputKind, InputValue, ModelConfig, OutputType};
pub use request::{build_payload, PartBody, Payload, PayloadPart};
pub use response::{classify, AudioClip, RawResponse, RunOutput};
pub use settings::AppSettings;
pub use workbench::{Notice, NoticeLevel, RunResult, RunSlot, RunState, Workbench};
