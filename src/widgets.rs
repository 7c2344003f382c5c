//! Model cards, input editors and result views.
//!
//! Rendering only reads workbench state. Every interaction is recorded as a
//! [`UiAction`] and applied by the app once the frame is laid out.

use eframe::egui;
use speechlab::{InputField, InputKind, InputValue, ModelConfig, OutputType, RunOutput, RunResult, RunSlot};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(56, 189, 248);
const MUTED: egui::Color32 = egui::Color32::from_rgb(100, 100, 120);
const CARD: egui::Color32 = egui::Color32::from_rgb(18, 18, 24);
const CARD_STROKE: egui::Color32 = egui::Color32::from_rgb(40, 40, 55);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputRef {
    pub model_id: String,
    pub input_id: String,
}

pub enum UiAction {
    SetModelName(String, String),
    SetEndpoint(String, String),
    SetOutputType(String, OutputType),
    RemoveModel(String),
    Run(String),
    AddInput(String),
    RemoveInput(InputRef),
    SetInputName(InputRef, String),
    SetInputKind(InputRef, InputKind),
    ToggleRequired(InputRef),
    SetInputText(InputRef, String),
    ClearInput(InputRef),
    StartRecording(InputRef),
    StopRecording,
    PickAudioFile(InputRef),
    PlayInput(InputRef),
    PlayResult(String),
    StopPlayback,
    SaveResult(String),
    CopyText(String),
}

/// What the card needs to know beyond the configuration itself.
pub struct CardContext<'a> {
    pub slot: Option<&'a RunSlot>,
    pub recording: Option<&'a InputRef>,
    pub playing: bool,
    pub can_remove: bool,
}

pub fn model_card(ui: &mut egui::Ui, model: &ModelConfig, cx: &CardContext<'_>, actions: &mut Vec<UiAction>) {
    let running = cx.slot.is_some_and(RunSlot::is_running);
    let title = if model.name.is_empty() { "New Model" } else { model.name.as_str() };

    egui::Frame::none().fill(CARD).rounding(16.0).inner_margin(20.0).stroke(egui::Stroke::new(1.0, CARD_STROKE)).show(ui, |ui| {
        egui::CollapsingHeader::new(egui::RichText::new(title).size(18.0).strong().color(ACCENT))
            .id_salt(("model", &model.id))
            .default_open(true)
            .show(ui, |ui| {
                let endpoint_hint = if model.has_endpoint() { model.endpoint.as_str() } else { "No endpoint configured" };
                ui.label(egui::RichText::new(endpoint_hint).size(11.0).color(MUTED));
                ui.add_space(10.0);

                egui::Grid::new(("model_grid", &model.id)).num_columns(2).spacing([12.0, 8.0]).show(ui, |ui| {
                    ui.label("Model Name");
                    let mut name = model.name.clone();
                    if ui.add(egui::TextEdit::singleline(&mut name).hint_text("Enter model name").desired_width(f32::INFINITY)).changed() {
                        actions.push(UiAction::SetModelName(model.id.clone(), name));
                    }
                    ui.end_row();

                    ui.label("API Endpoint URL");
                    let mut endpoint = model.endpoint.clone();
                    if ui.add(egui::TextEdit::singleline(&mut endpoint).hint_text("http://localhost:8000/api/model").desired_width(f32::INFINITY)).changed() {
                        actions.push(UiAction::SetEndpoint(model.id.clone(), endpoint));
                    }
                    ui.end_row();

                    ui.label("Output Type");
                    let mut output_type = model.output_type;
                    egui::ComboBox::from_id_salt(("output_type", &model.id))
                        .selected_text(kind_label(output_type.as_str()))
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut output_type, OutputType::Text, "Text");
                            ui.selectable_value(&mut output_type, OutputType::Audio, "Audio");
                        });
                    if output_type != model.output_type {
                        actions.push(UiAction::SetOutputType(model.id.clone(), output_type));
                    }
                    ui.end_row();
                });

                ui.add_space(16.0);
                ui.label(egui::RichText::new("INPUT FIELDS").size(10.0).strong().color(MUTED));
                ui.add_space(8.0);

                let can_remove_input = model.inputs.len() > 1;
                for input in &model.inputs {
                    let target = InputRef { model_id: model.id.clone(), input_id: input.id.clone() };
                    let recording = cx.recording == Some(&target);
                    input_editor(ui, input, target, recording, cx.recording.is_some(), can_remove_input, actions);
                    ui.add_space(8.0);
                }

                if ui.add_sized([ui.available_width(), 28.0], egui::Button::new("➕ Add Input Field")).clicked() {
                    actions.push(UiAction::AddInput(model.id.clone()));
                }

                ui.add_space(14.0);
                ui.horizontal(|ui| {
                    if cx.can_remove && ui.button("🗑 Remove").clicked() {
                        actions.push(UiAction::RemoveModel(model.id.clone()));
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let label = if running { "Processing..." } else { "▶ Run Model" };
                        if ui.add_enabled(!running, egui::Button::new(egui::RichText::new(label).strong())).clicked() {
                            actions.push(UiAction::Run(model.id.clone()));
                        }
                        if let Some(elapsed) = cx.slot.and_then(RunSlot::elapsed) {
                            ui.label(egui::RichText::new(format!("last run {:.2}s", elapsed.as_secs_f32())).size(11.0).color(MUTED));
                        }
                    });
                });
            });
    });

    result_view(ui, model, cx, running, actions);
}

fn input_editor(
    ui: &mut egui::Ui,
    input: &InputField,
    target: InputRef,
    recording: bool,
    any_recording: bool,
    can_remove: bool,
    actions: &mut Vec<UiAction>,
) {
    egui::Frame::none().fill(egui::Color32::from_rgb(12, 12, 16)).rounding(12.0).inner_margin(14.0).show(ui, |ui| {
        ui.horizontal(|ui| {
            let mut name = input.name.clone();
            if ui.add(egui::TextEdit::singleline(&mut name).id(egui::Id::new(("input_name", &input.id))).desired_width(180.0)).changed() {
                actions.push(UiAction::SetInputName(target.clone(), name));
            }

            let mut kind = input.kind();
            egui::ComboBox::from_id_salt(("input_kind", &input.id))
                .selected_text(kind_label(kind.as_str()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut kind, InputKind::Text, "Text");
                    ui.selectable_value(&mut kind, InputKind::Audio, "Audio");
                });
            if kind != input.kind() {
                actions.push(UiAction::SetInputKind(target.clone(), kind));
            }

            let mut required = input.required;
            if ui.checkbox(&mut required, "Required").changed() {
                actions.push(UiAction::ToggleRequired(target.clone()));
            }

            if can_remove {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("🗑").on_hover_text("Remove input").clicked() {
                        actions.push(UiAction::RemoveInput(target.clone()));
                    }
                });
            }
        });

        ui.add_space(6.0);
        let star = if input.required { " *" } else { "" };
        ui.label(egui::RichText::new(format!("{}{}", input.name, star)).size(12.0).strong());

        match input.kind() {
            InputKind::Text => {
                let mut text = input.value().as_text().unwrap_or_default().to_string();
                let edit = egui::TextEdit::singleline(&mut text)
                    .id(egui::Id::new(("input_value", &input.id)))
                    .hint_text(format!("Enter {}", input.name))
                    .desired_width(f32::INFINITY);
                if ui.add(edit).changed() {
                    actions.push(UiAction::SetInputText(target, text));
                }
            }
            InputKind::Audio => audio_controls(ui, input, target, recording, any_recording, actions),
        }
    });
}

fn audio_controls(
    ui: &mut egui::Ui,
    input: &InputField,
    target: InputRef,
    recording: bool,
    any_recording: bool,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        if recording {
            let stop = egui::Button::new(egui::RichText::new("⏹ Stop Recording").color(egui::Color32::WHITE))
                .fill(egui::Color32::from_rgb(185, 28, 28));
            if ui.add(stop).clicked() {
                actions.push(UiAction::StopRecording);
            }
        } else if ui.add_enabled(!any_recording, egui::Button::new("🎤 Record Audio")).clicked() {
            actions.push(UiAction::StartRecording(target.clone()));
        }

        ui.label(egui::RichText::new("or").color(MUTED));

        if ui.add_enabled(!recording, egui::Button::new("📁 Upload Audio File")).clicked() {
            actions.push(UiAction::PickAudioFile(target.clone()));
        }
    });

    if let InputValue::Audio(blob) = input.value() {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(format!("Selected: {} ({})", blob.filename, human_size(blob.len()))).size(12.0).color(MUTED));
            if ui.small_button("▶").on_hover_text("Play").clicked() {
                actions.push(UiAction::PlayInput(target.clone()));
            }
            if ui.small_button("✖").on_hover_text("Clear").clicked() {
                actions.push(UiAction::ClearInput(target));
            }
        });
    }
}

fn result_view(ui: &mut egui::Ui, model: &ModelConfig, cx: &CardContext<'_>, running: bool, actions: &mut Vec<UiAction>) {
    if running {
        ui.add_space(10.0);
        egui::Frame::none().fill(CARD).rounding(16.0).inner_margin(20.0).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(egui::RichText::new("Processing... your request is being processed").color(MUTED));
            });
        });
        return;
    }

    let Some(result) = cx.slot.and_then(RunSlot::result) else {
        return;
    };

    ui.add_space(10.0);
    match result {
        RunResult::Failure(message) => {
            egui::Frame::none().fill(egui::Color32::from_rgb(40, 14, 16)).rounding(16.0).inner_margin(20.0).stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(127, 29, 29))).show(ui, |ui| {
                ui.label(egui::RichText::new("ERROR").size(10.0).strong().color(egui::Color32::from_rgb(248, 113, 113)));
                ui.label(egui::RichText::new("Failed to get results from the model").size(12.0).color(MUTED));
                ui.add_space(6.0);
                ui.add(egui::Label::new(egui::RichText::new(message).color(egui::Color32::from_rgb(252, 165, 165))).wrap());
            });
        }
        RunResult::Success(output) => {
            egui::Frame::none().fill(egui::Color32::from_rgb(12, 30, 20)).rounding(16.0).inner_margin(20.0).stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(22, 101, 52))).show(ui, |ui| {
                ui.label(egui::RichText::new("RESULT").size(10.0).strong().color(egui::Color32::from_rgb(74, 222, 128)));
                let received = match output {
                    RunOutput::Text(_) => "text",
                    RunOutput::Audio(_) => "audio",
                };
                let subtitle = if received == model.output_type.as_str() {
                    format!("Successfully processed {} output", received)
                } else {
                    format!("Requested {} output, received {}", model.output_type, received)
                };
                ui.label(egui::RichText::new(subtitle).size(12.0).color(MUTED));
                ui.add_space(8.0);

                match output {
                    RunOutput::Text(text) => {
                        egui::ScrollArea::vertical().id_salt(("result", &model.id)).max_height(220.0).show(ui, |ui| {
                            ui.add(egui::Label::new(egui::RichText::new(text).monospace().size(13.0)).wrap());
                        });
                        ui.add_space(6.0);
                        if ui.small_button("📋 Copy").clicked() {
                            actions.push(UiAction::CopyText(text.clone()));
                        }
                    }
                    RunOutput::Audio(clip) => {
                        let duration = clip
                            .wav_duration()
                            .map(|d| format!(", {:.1}s", d.as_secs_f32()))
                            .unwrap_or_default();
                        ui.label(format!("{} ({}{})", clip.mime(), human_size(clip.len()), duration));
                        ui.horizontal(|ui| {
                            if cx.playing {
                                if ui.button("⏹ Stop").clicked() {
                                    actions.push(UiAction::StopPlayback);
                                }
                            } else if ui.button("▶ Play").clicked() {
                                actions.push(UiAction::PlayResult(model.id.clone()));
                            }
                            if ui.button("💾 Save As...").clicked() {
                                actions.push(UiAction::SaveResult(model.id.clone()));
                            }
                        });
                    }
                }
            });
        }
    }
}

fn kind_label(kind: &str) -> &'static str {
    match kind {
        "audio" => "Audio",
        _ => "Text",
    }
}

fn human_size(bytes: usize) -> String {
    match bytes {
        b if b >= 1024 * 1024 => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
        b if b >= 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(12), "12 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
