//! Builds the multipart payload for one model run

use std::collections::HashSet;
use std::sync::Arc;

use log::warn;
use reqwest::blocking::multipart::{Form, Part};

use crate::config::OUTPUT_TYPE_FIELD;
use crate::error::RunError;
use crate::model::{InputValue, ModelConfig};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartBody {
    Text(String),
    Binary {
        filename: String,
        mime: String,
        bytes: Arc<[u8]>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadPart {
    pub name: String,
    pub body: PartBody,
}

/// Transport-independent multipart body. Parts keep declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload {
    parts: Vec<PayloadPart>,
}

impl Payload {
    pub fn parts(&self) -> &[PayloadPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&PayloadPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.part(name).map(|part| &part.body) {
            Some(PartBody::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn push_text(&mut self, name: &str, text: &str) {
        self.parts.push(PayloadPart {
            name: name.to_string(),
            body: PartBody::Text(text.to_string()),
        });
    }

    pub fn into_form(self) -> Result<Form, RunError> {
        let mut form = Form::new();
        for part in self.parts {
            form = match part.body {
                PartBody::Text(text) => form.text(part.name, text),
                PartBody::Binary { filename, mime, bytes } => {
                    let binary = Part::bytes(bytes.to_vec())
                        .file_name(filename)
                        .mime_str(&mime)
                        .map_err(|e| {
                            RunError::ValidationError(format!(
                                "invalid MIME type '{}' for input '{}': {}",
                                mime, part.name, e
                            ))
                        })?;
                    form.part(part.name, binary)
                }
            };
        }
        Ok(form)
    }
}

/// Validate required inputs, then lay out one part per filled input plus `output_type`.
pub fn build_payload(config: &ModelConfig) -> Result<Payload, RunError> {
    if let Some(missing) = config.inputs.iter().find(|input| input.is_missing()) {
        return Err(RunError::ValidationError(format!(
            "missing required input '{}'",
            missing.name
        )));
    }

    let mut seen = HashSet::new();
    let mut payload = Payload::default();

    for input in &config.inputs {
        let body = match input.value() {
            InputValue::Empty => continue,
            InputValue::Text(text) => PartBody::Text(text.clone()),
            InputValue::Audio(blob) => PartBody::Binary {
                filename: blob.filename.clone(),
                mime: blob.mime.clone(),
                bytes: blob.bytes.clone(),
            },
        };

        // Receivers usually key parts by name, so the later part wins.
        if !seen.insert(input.name.as_str()) {
            warn!("⚠️ Duplicate input name '{}' in '{}'", input.name, config.name);
        }

        payload.parts.push(PayloadPart {
            name: input.name.clone(),
            body,
        });
    }

    payload.push_text(OUTPUT_TYPE_FIELD, config.output_type.as_str());
    Ok(payload)
}
