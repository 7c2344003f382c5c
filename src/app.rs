//! SpeechLab main window

use cpal::traits::StreamTrait;
use eframe::egui;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use speechlab::playback::Player;
use speechlab::recorder::{self, RecordingState};
use speechlab::upload::{self, AUDIO_EXTENSIONS};
use speechlab::{AppSettings, HttpTransport, RunError, RunOutput, Workbench};

use crate::toasts::Toasts;
use crate::widgets::{self, CardContext, InputRef, UiAction};

/// An open microphone stream and the input it will fill.
struct ActiveRecording {
    target: InputRef,
    stream: cpal::Stream,
}

pub struct SpeechLabApp {
    workbench: Workbench,
    settings: AppSettings,
    show_settings: bool,
    toasts: Toasts,

    recording_state: RecordingState,
    active_recording: Option<ActiveRecording>,

    player: Option<Player>,
    clipboard: Option<arboard::Clipboard>,
}

impl SpeechLabApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Result<Self, RunError> {
        let transport = HttpTransport::new(settings.request_timeout())?;
        let workbench = Workbench::new(Arc::new(transport), &settings.default_endpoint);

        Ok(Self {
            workbench,
            toasts: Toasts::new(Duration::from_secs_f32(settings.notice_seconds)),
            settings,
            show_settings: false,
            recording_state: RecordingState::new(),
            active_recording: None,
            player: None,
            clipboard: arboard::Clipboard::new().ok(),
        })
    }

    fn process_messages(&mut self) {
        self.workbench.process_messages();
        for notice in self.workbench.drain_notices() {
            self.toasts.push(notice);
        }
    }

    fn apply(&mut self, action: UiAction) {
        let edit = match action {
            UiAction::SetModelName(id, name) => self.workbench.set_model_name(&id, &name),
            UiAction::SetEndpoint(id, endpoint) => self.workbench.set_endpoint(&id, &endpoint),
            UiAction::SetOutputType(id, output_type) => self.workbench.set_output_type(&id, output_type),
            UiAction::RemoveModel(id) => {
                self.cancel_recording_for(|target| target.model_id == id);
                self.workbench.remove_model(&id)
            }
            UiAction::AddInput(id) => self.workbench.add_input(&id).map(|_| ()),
            UiAction::RemoveInput(target) => {
                self.cancel_recording_for(|active| *active == target);
                self.workbench.remove_input(&target.model_id, &target.input_id)
            }
            UiAction::SetInputName(target, name) => self.workbench.set_input_name(&target.model_id, &target.input_id, &name),
            UiAction::SetInputKind(target, kind) => {
                self.cancel_recording_for(|active| *active == target);
                self.workbench.set_input_kind(&target.model_id, &target.input_id, kind)
            }
            UiAction::ToggleRequired(target) => self.workbench.toggle_input_required(&target.model_id, &target.input_id),
            UiAction::SetInputText(target, text) => self.workbench.set_input_text(&target.model_id, &target.input_id, &text),
            UiAction::ClearInput(target) => self.workbench.clear_input(&target.model_id, &target.input_id),
            UiAction::Run(id) => {
                // Failures are already queued as notices by the workbench.
                let _ = self.workbench.run_model(&id);
                Ok(())
            }
            UiAction::StartRecording(target) => {
                self.start_recording(target);
                Ok(())
            }
            UiAction::StopRecording => {
                self.stop_recording();
                Ok(())
            }
            UiAction::PickAudioFile(target) => {
                self.pick_audio_file(target);
                Ok(())
            }
            UiAction::PlayInput(target) => {
                self.play_input(&target);
                Ok(())
            }
            UiAction::PlayResult(id) => {
                self.play_result(&id);
                Ok(())
            }
            UiAction::StopPlayback => {
                if let Some(player) = self.player.as_mut() {
                    player.stop();
                }
                Ok(())
            }
            UiAction::SaveResult(id) => {
                self.save_result(&id);
                Ok(())
            }
            UiAction::CopyText(text) => {
                self.copy_text(text);
                Ok(())
            }
        };

        if let Err(e) = edit {
            warn!("Edit rejected: {}", e);
            self.toasts.error(e.to_string());
        }
    }

    fn start_recording(&mut self, target: InputRef) {
        if self.active_recording.is_some() {
            return;
        }

        match recorder::start_recording(&self.recording_state) {
            Ok(stream) => self.active_recording = Some(ActiveRecording { target, stream }),
            Err(e) => self.toasts.error(format!("Mic Error: {}", e)),
        }
    }

    fn stop_recording(&mut self) {
        let Some(active) = self.active_recording.take() else {
            return;
        };
        let _ = active.stream.pause();
        drop(active.stream);

        let target = active.target;
        match recorder::stop_recording(&self.recording_state, self.settings.recording_sample_rate) {
            Ok(blob) => {
                if let Err(e) = self.workbench.set_input_audio(&target.model_id, &target.input_id, blob) {
                    self.toasts.error(e.to_string());
                }
            }
            Err(e) => self.toasts.error(format!("Mic Error: {}", e)),
        }
    }

    /// Drop a recording whose input is going away without storing anything.
    fn cancel_recording_for(&mut self, matches: impl Fn(&InputRef) -> bool) {
        if !self.active_recording.as_ref().is_some_and(|active| matches(&active.target)) {
            return;
        }
        if let Some(active) = self.active_recording.take() {
            let _ = active.stream.pause();
            let _ = recorder::stop_recording(&self.recording_state, None);
            info!("Recording discarded");
        }
    }

    fn pick_audio_file(&mut self, target: InputRef) {
        let Some(path) = rfd::FileDialog::new().add_filter("Audio", AUDIO_EXTENSIONS).pick_file() else {
            return;
        };

        let stored = upload::load_audio_file(&path).and_then(|blob| {
            self.workbench
                .set_input_audio(&target.model_id, &target.input_id, blob)
                .map_err(anyhow::Error::from)
        });
        if let Err(e) = stored {
            self.toasts.error(format!("{:#}", e));
        }
    }

    fn player(&mut self) -> anyhow::Result<&mut Player> {
        if self.player.is_none() {
            self.player = Some(Player::new()?);
        }
        self.player.as_mut().ok_or_else(|| anyhow::anyhow!("audio output unavailable"))
    }

    fn play_input(&mut self, target: &InputRef) {
        let Some(blob) = self
            .workbench
            .model(&target.model_id)
            .and_then(|model| model.input(&target.input_id))
            .and_then(|input| input.value().as_audio())
            .cloned()
        else {
            return;
        };

        if let Err(e) = self.player().and_then(|player| player.play_bytes(&blob.bytes)) {
            self.toasts.error(format!("Playback failed: {:#}", e));
        }
    }

    fn result_clip_path(&self, model_id: &str) -> Option<std::path::PathBuf> {
        self.workbench
            .slot(model_id)
            .and_then(|slot| slot.result())
            .and_then(|result| result.output())
            .and_then(RunOutput::as_audio)
            .map(|clip| clip.path().to_path_buf())
    }

    fn play_result(&mut self, model_id: &str) {
        let Some(path) = self.result_clip_path(model_id) else {
            return;
        };
        if let Err(e) = self.player().and_then(|player| player.play_file(&path)) {
            self.toasts.error(format!("Playback failed: {:#}", e));
        }
    }

    fn save_result(&mut self, model_id: &str) {
        let Some(path) = self.result_clip_path(model_id) else {
            return;
        };
        let suggested = format!(
            "output.{}",
            path.extension().and_then(|e| e.to_str()).unwrap_or("bin")
        );
        let Some(dest) = rfd::FileDialog::new().set_file_name(suggested).save_file() else {
            return;
        };

        match std::fs::copy(&path, &dest) {
            Ok(_) => info!("💾 Saved output to {}", dest.display()),
            Err(e) => self.toasts.error(format!("Save failed: {}", e)),
        }
    }

    fn copy_text(&mut self, text: String) {
        match self.clipboard.as_mut() {
            Some(clipboard) => {
                if let Err(e) = clipboard.set_text(text) {
                    self.toasts.error(format!("Copy failed: {}", e));
                }
            }
            None => self.toasts.error("Clipboard unavailable"),
        }
    }

    fn settings_panel(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;
        let mut transport_changed = false;

        egui::Frame::none().fill(egui::Color32::from_rgb(18, 18, 24)).rounding(16.0).inner_margin(20.0).stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(40, 40, 55))).show(ui, |ui| {
            ui.label(egui::RichText::new("CONFIG").size(10.0).strong().color(egui::Color32::from_rgb(100, 100, 120)));
            ui.add_space(15.0);

            ui.horizontal(|ui| {
                ui.label("Default endpoint:");
                changed |= ui.add(egui::TextEdit::singleline(&mut self.settings.default_endpoint).desired_width(f32::INFINITY)).changed();
            });

            ui.horizontal(|ui| {
                let mut use_timeout = self.settings.request_timeout_secs.is_some();
                if ui.checkbox(&mut use_timeout, "Request timeout").changed() {
                    self.settings.request_timeout_secs = use_timeout.then_some(60);
                    transport_changed = true;
                }
                if let Some(secs) = self.settings.request_timeout_secs.as_mut() {
                    transport_changed |= ui.add(egui::DragValue::new(secs).range(1..=3600).suffix(" s")).changed();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Recording rate:");
                let current = match self.settings.recording_sample_rate {
                    Some(rate) => format!("{} Hz", rate),
                    None => "Device rate".to_string(),
                };
                egui::ComboBox::from_id_salt("recording_rate").selected_text(current).show_ui(ui, |ui| {
                    for option in [Some(16000), Some(22050), Some(44100), Some(48000), None] {
                        let label = option.map_or("Device rate".to_string(), |rate| format!("{} Hz", rate));
                        changed |= ui.selectable_value(&mut self.settings.recording_sample_rate, option, label).changed();
                    }
                });
            });

            ui.horizontal(|ui| {
                ui.label("Notifications:");
                if ui.add(egui::Slider::new(&mut self.settings.notice_seconds, 1.0..=15.0).suffix(" s")).changed() {
                    self.toasts.set_lifetime(Duration::from_secs_f32(self.settings.notice_seconds));
                    changed = true;
                }
            });

            changed |= ui.checkbox(&mut self.settings.always_on_top, "Always on Top").changed();
        });

        if transport_changed {
            match HttpTransport::new(self.settings.request_timeout()) {
                Ok(transport) => self.workbench.set_transport(Arc::new(transport)),
                Err(e) => self.toasts.error(e.to_string()),
            }
        }

        if changed || transport_changed {
            if let Err(e) = self.settings.save() {
                warn!("Failed to save settings: {}", e);
            }
        }
    }
}

impl eframe::App for SpeechLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_messages();
        if self.workbench.any_running() || self.active_recording.is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        let level = if self.settings.always_on_top { egui::WindowLevel::AlwaysOnTop } else { egui::WindowLevel::Normal };
        ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(level));

        let mut visuals = egui::Visuals::dark();
        visuals.window_rounding = 16.0.into();
        ctx.set_visuals(visuals);

        let mut actions = Vec::new();
        let playing = self.player.as_ref().is_some_and(Player::is_playing);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(7, 7, 10)).inner_margin(28.0))
            .show(ctx, |ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new("SPEECHLAB").size(11.0).strong().extra_letter_spacing(2.0).color(egui::Color32::from_rgb(56, 189, 248)));
                        ui.add_space(-4.0);
                        ui.label(egui::RichText::new("Research Platform").size(24.0).strong().color(egui::Color32::WHITE));
                        ui.label(egui::RichText::new("Configure and test your speech processing models").size(12.0).color(egui::Color32::from_rgb(140, 140, 155)));
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(egui::RichText::new("⚙").size(20.0)).clicked() {
                            self.show_settings = !self.show_settings;
                        }
                    });
                });

                ui.add_space(20.0);

                if self.show_settings {
                    self.settings_panel(ui);
                    ui.add_space(20.0);
                }

                egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                    let recording = self.active_recording.as_ref().map(|active| &active.target);
                    let can_remove = self.workbench.models().len() > 1;

                    for model in self.workbench.models() {
                        let cx = CardContext {
                            slot: self.workbench.slot(&model.id),
                            recording,
                            playing,
                            can_remove,
                        };
                        widgets::model_card(ui, model, &cx, &mut actions);
                        ui.add_space(24.0);
                    }

                    if ui.add_sized([ui.available_width(), 36.0], egui::Button::new("➕ Add New Model Configuration")).clicked() {
                        self.workbench.add_model();
                    }
                });
            });

        for action in actions {
            self.apply(action);
        }

        self.toasts.show(ctx);
    }
}
