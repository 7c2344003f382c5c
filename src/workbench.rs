//! Owns every model configuration and the latest result of each one.
//!
//! All state lives on the UI thread. A run builds its payload here, then hands
//! it to a worker thread which reports back through a channel that the UI
//! drains once per frame with [`Workbench::process_messages`].

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::dispatch::{dispatch, Transport};
use crate::error::{EditError, RunError};
use crate::model::{AudioBlob, InputField, InputKind, ModelConfig, OutputType};
use crate::request::build_payload;
use crate::response::RunOutput;

#[derive(Debug)]
pub enum RunResult {
    Success(RunOutput),
    Failure(String),
}

impl RunResult {
    pub fn output(&self) -> Option<&RunOutput> {
        match self {
            RunResult::Success(output) => Some(output),
            RunResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RunResult::Failure(message) => Some(message),
            RunResult::Success(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Per-configuration run bookkeeping. Holds only the most recent result.
#[derive(Debug, Default)]
pub struct RunSlot {
    in_flight: bool,
    started_at: Option<Instant>,
    last: Option<RunResult>,
    elapsed: Option<Duration>,
}

impl RunSlot {
    pub fn state(&self) -> RunState {
        match (&self.last, self.in_flight) {
            (_, true) => RunState::Running,
            (Some(RunResult::Success(_)), false) => RunState::Succeeded,
            (Some(RunResult::Failure(_)), false) => RunState::Failed,
            (None, false) => RunState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.last.as_ref()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    fn finish(&mut self, result: RunResult) {
        self.in_flight = false;
        self.elapsed = self.started_at.take().map(|start| start.elapsed());
        // Replacing the result drops any previous audio clip and its temp file.
        self.last = Some(result);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Fire-and-forget message for the toast stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

struct RunMessage {
    model_id: String,
    outcome: Result<RunOutput, RunError>,
}

pub struct Workbench {
    models: Vec<ModelConfig>,
    slots: HashMap<String, RunSlot>,
    notices: VecDeque<Notice>,
    transport: Arc<dyn Transport>,
    message_tx: Sender<RunMessage>,
    message_rx: Receiver<RunMessage>,
}

impl Workbench {
    /// Starts with a single "Speech Model" pointing at `default_endpoint`.
    pub fn new(transport: Arc<dyn Transport>, default_endpoint: &str) -> Self {
        let (message_tx, message_rx) = channel();
        let mut workbench = Self {
            models: Vec::new(),
            slots: HashMap::new(),
            notices: VecDeque::new(),
            transport,
            message_tx,
            message_rx,
        };
        workbench.push_model(ModelConfig::new("Speech Model", default_endpoint, "Input Text"));
        workbench
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn model(&self, model_id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn slot(&self, model_id: &str) -> Option<&RunSlot> {
        self.slots.get(model_id)
    }

    pub fn state(&self, model_id: &str) -> RunState {
        self.slot(model_id).map_or(RunState::Idle, RunSlot::state)
    }

    pub fn any_running(&self) -> bool {
        self.slots.values().any(RunSlot::is_running)
    }

    /// Runs already in flight keep the transport they started with.
    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = transport;
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // --- configuration edits ---

    /// Adds `Model {n}` with an empty endpoint and returns its id.
    pub fn add_model(&mut self) -> String {
        let name = format!("Model {}", self.models.len() + 1);
        self.push_model(ModelConfig::new(name, "", "Input 1"))
    }

    /// A result that lands after removal is discarded.
    pub fn remove_model(&mut self, model_id: &str) -> Result<(), EditError> {
        let before = self.models.len();
        self.models.retain(|m| m.id != model_id);
        if self.models.len() == before {
            return Err(EditError::UnknownModel(model_id.to_string()));
        }
        self.slots.remove(model_id);
        Ok(())
    }

    pub fn set_model_name(&mut self, model_id: &str, name: &str) -> Result<(), EditError> {
        self.model_mut(model_id)?.name = name.to_string();
        Ok(())
    }

    pub fn set_endpoint(&mut self, model_id: &str, endpoint: &str) -> Result<(), EditError> {
        self.model_mut(model_id)?.endpoint = endpoint.to_string();
        Ok(())
    }

    pub fn set_output_type(&mut self, model_id: &str, output_type: OutputType) -> Result<(), EditError> {
        self.model_mut(model_id)?.output_type = output_type;
        Ok(())
    }

    pub fn add_input(&mut self, model_id: &str) -> Result<String, EditError> {
        Ok(self.model_mut(model_id)?.add_input())
    }

    pub fn remove_input(&mut self, model_id: &str, input_id: &str) -> Result<(), EditError> {
        if self.model_mut(model_id)?.remove_input(input_id) {
            Ok(())
        } else {
            Err(EditError::UnknownInput(input_id.to_string()))
        }
    }

    pub fn set_input_name(&mut self, model_id: &str, input_id: &str, name: &str) -> Result<(), EditError> {
        self.input_mut(model_id, input_id)?.name = name.to_string();
        Ok(())
    }

    pub fn set_input_kind(&mut self, model_id: &str, input_id: &str, kind: InputKind) -> Result<(), EditError> {
        self.input_mut(model_id, input_id)?.set_kind(kind);
        Ok(())
    }

    pub fn toggle_input_required(&mut self, model_id: &str, input_id: &str) -> Result<(), EditError> {
        let input = self.input_mut(model_id, input_id)?;
        input.required = !input.required;
        Ok(())
    }

    pub fn set_input_text(&mut self, model_id: &str, input_id: &str, text: &str) -> Result<(), EditError> {
        self.input_mut(model_id, input_id)?.set_text(text)
    }

    pub fn set_input_audio(&mut self, model_id: &str, input_id: &str, blob: AudioBlob) -> Result<(), EditError> {
        self.input_mut(model_id, input_id)?.set_audio(blob)
    }

    pub fn clear_input(&mut self, model_id: &str, input_id: &str) -> Result<(), EditError> {
        self.input_mut(model_id, input_id)?.clear();
        Ok(())
    }

    // --- runs ---

    /// Validate and start a run. `Ok` means a request is now in flight.
    pub fn run_model(&mut self, model_id: &str) -> Result<(), RunError> {
        let Some(config) = self.model(model_id) else {
            let err = RunError::ConfigError("model configuration not found".to_string());
            self.notify(NoticeLevel::Error, err.to_string());
            return Err(err);
        };

        if !config.has_endpoint() {
            let err = RunError::ConfigError("endpoint required".to_string());
            self.notify(NoticeLevel::Error, err.to_string());
            return Err(err);
        }

        if self.slot(model_id).is_some_and(RunSlot::is_running) {
            warn!("Run for '{}' ignored, one is already in flight", config.name);
            return Err(RunError::Busy);
        }

        let endpoint = config.endpoint.trim().to_string();
        let payload = match build_payload(config) {
            Ok(payload) => payload,
            Err(err) => {
                let slot = self.slots.entry(model_id.to_string()).or_default();
                slot.finish(RunResult::Failure(err.to_string()));
                self.notify(NoticeLevel::Error, err.to_string());
                return Err(err);
            }
        };

        info!("▶️ Running '{}' against {}", config.name, endpoint);
        let slot = self.slots.entry(model_id.to_string()).or_default();
        slot.in_flight = true;
        slot.started_at = Some(Instant::now());

        let tx = self.message_tx.clone();
        let transport = self.transport.clone();
        let model_id = model_id.to_string();

        thread::spawn(move || {
            let outcome = dispatch(transport.as_ref(), &endpoint, payload);
            let _ = tx.send(RunMessage { model_id, outcome });
        });

        Ok(())
    }

    /// Apply every finished run without blocking. Returns how many were applied.
    pub fn process_messages(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.message_rx.try_recv() {
            self.apply(message);
            applied += 1;
        }
        applied
    }

    /// Block until nothing is in flight. Returns `false` on timeout.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.any_running() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.message_rx.recv_timeout(remaining) {
                Ok(message) => self.apply(message),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    fn apply(&mut self, message: RunMessage) {
        let Some(slot) = self.slots.get_mut(&message.model_id) else {
            info!("Dropping result for removed model {}", message.model_id);
            return;
        };

        match message.outcome {
            Ok(output) => {
                slot.finish(RunResult::Success(output));
                self.notify(NoticeLevel::Success, "Model executed successfully".to_string());
            }
            Err(err) => {
                warn!("Run failed: {}", err);
                slot.finish(RunResult::Failure(err.to_string()));
                self.notify(NoticeLevel::Error, err.to_string());
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push_back(Notice { level, message });
    }

    fn push_model(&mut self, config: ModelConfig) -> String {
        let id = config.id.clone();
        self.models.push(config);
        id
    }

    fn model_mut(&mut self, model_id: &str) -> Result<&mut ModelConfig, EditError> {
        self.models
            .iter_mut()
            .find(|m| m.id == model_id)
            .ok_or_else(|| EditError::UnknownModel(model_id.to_string()))
    }

    fn input_mut(&mut self, model_id: &str, input_id: &str) -> Result<&mut InputField, EditError> {
        self.model_mut(model_id)?
            .input_mut(input_id)
            .ok_or_else(|| EditError::UnknownInput(input_id.to_string()))
    }
}
