//! Model configurations and their typed input fields

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EditError;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// What an input slot accepts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Audio,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Audio => "audio",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output kind requested from the endpoint. Sent verbatim as `output_type`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Text,
    Audio,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputType::Text => "text",
            OutputType::Audio => "audio",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished piece of audio, either recorded or picked from disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioBlob {
    pub filename: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl AudioBlob {
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum InputValue {
    #[default]
    Empty,
    Text(String),
    Audio(AudioBlob),
}

impl InputValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, InputValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            InputValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioBlob> {
        match self {
            InputValue::Audio(blob) => Some(blob),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputField {
    pub id: String,
    pub name: String,
    kind: InputKind,
    value: InputValue,
    pub required: bool,
}

impl InputField {
    pub fn new(name: impl Into<String>, kind: InputKind) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            value: InputValue::Empty,
            required: true,
        }
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn value(&self) -> &InputValue {
        &self.value
    }

    /// Changing the kind always drops the current value.
    pub fn set_kind(&mut self, kind: InputKind) {
        self.kind = kind;
        self.value = InputValue::Empty;
    }

    /// An empty string counts as no value at all.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), EditError> {
        if self.kind != InputKind::Text {
            return Err(self.mismatch());
        }
        let text = text.into();
        self.value = if text.is_empty() {
            InputValue::Empty
        } else {
            InputValue::Text(text)
        };
        Ok(())
    }

    pub fn set_audio(&mut self, blob: AudioBlob) -> Result<(), EditError> {
        if self.kind != InputKind::Audio {
            return Err(self.mismatch());
        }
        self.value = InputValue::Audio(blob);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.value = InputValue::Empty;
    }

    pub fn is_missing(&self) -> bool {
        self.required && self.value.is_empty()
    }

    fn mismatch(&self) -> EditError {
        EditError::KindMismatch {
            name: self.name.clone(),
            expected: self.kind.as_str(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    pub inputs: Vec<InputField>,
    pub output_type: OutputType,
}

impl ModelConfig {
    /// A configuration with one required text input.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, first_input: &str) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            endpoint: endpoint.into(),
            inputs: vec![InputField::new(first_input, InputKind::Text)],
            output_type: OutputType::Text,
        }
    }

    pub fn input(&self, input_id: &str) -> Option<&InputField> {
        self.inputs.iter().find(|input| input.id == input_id)
    }

    pub fn input_mut(&mut self, input_id: &str) -> Option<&mut InputField> {
        self.inputs.iter_mut().find(|input| input.id == input_id)
    }

    /// Appends `Input {n+1}` as a required text field and returns its id.
    pub fn add_input(&mut self) -> String {
        let input = InputField::new(format!("Input {}", self.inputs.len() + 1), InputKind::Text);
        let id = input.id.clone();
        self.inputs.push(input);
        id
    }

    pub fn remove_input(&mut self, input_id: &str) -> bool {
        let before = self.inputs.len();
        self.inputs.retain(|input| input.id != input_id);
        self.inputs.len() != before
    }

    pub fn has_endpoint(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_blob() -> AudioBlob {
        AudioBlob::new("clip.wav", "audio/wav", vec![1, 2, 3, 4])
    }

    #[test]
    fn test_new_config_has_one_required_text_input() {
        let config = ModelConfig::new("Speech Model", "http://localhost:8000", "Input Text");
        assert_eq!(config.inputs.len(), 1);
        let input = &config.inputs[0];
        assert_eq!(input.name, "Input Text");
        assert_eq!(input.kind(), InputKind::Text);
        assert!(input.required);
        assert!(input.value().is_empty());
        assert_eq!(config.output_type, OutputType::Text);
    }

    #[test]
    fn test_switching_kind_resets_value() {
        let mut input = InputField::new("Speech", InputKind::Audio);
        input.set_audio(wav_blob()).unwrap();
        input.set_kind(InputKind::Text);
        assert_eq!(input.value(), &InputValue::Empty);

        input.set_text("hello").unwrap();
        input.set_kind(InputKind::Audio);
        assert_eq!(input.value(), &InputValue::Empty);
    }

    #[test]
    fn test_value_must_match_kind() {
        let mut input = InputField::new("Prompt", InputKind::Text);
        let err = input.set_audio(wav_blob()).unwrap_err();
        assert!(matches!(err, EditError::KindMismatch { expected: "text", .. }));

        let mut input = InputField::new("Speech", InputKind::Audio);
        assert!(input.set_text("hi").is_err());
        assert!(input.value().is_empty());
    }

    #[test]
    fn test_empty_text_is_stored_as_empty() {
        let mut input = InputField::new("Prompt", InputKind::Text);
        input.set_text("hi").unwrap();
        assert_eq!(input.value().as_text(), Some("hi"));
        input.set_text("").unwrap();
        assert!(input.is_missing());
    }

    #[test]
    fn test_add_and_remove_inputs() {
        let mut config = ModelConfig::new("Model 2", "", "Input 1");
        let id = config.add_input();
        assert_eq!(config.inputs[1].name, "Input 2");
        assert!(config.remove_input(&id));
        assert!(!config.remove_input(&id));
        assert_eq!(config.inputs.len(), 1);
    }

    #[test]
    fn test_blank_endpoint_is_not_an_endpoint() {
        let config = ModelConfig::new("Model 2", "   ", "Input 1");
        assert!(!config.has_endpoint());
    }

    #[test]
    fn test_output_type_wire_names() {
        assert_eq!(OutputType::Text.to_string(), "text");
        assert_eq!(OutputType::Audio.to_string(), "audio");
        assert_eq!(serde_json::to_string(&InputKind::Audio).unwrap(), "\"audio\"");
    }
}
