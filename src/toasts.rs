//! Transient notifications in the bottom-right corner

use std::time::{Duration, Instant};

use eframe::egui;
use speechlab::{Notice, NoticeLevel};

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

pub struct Toasts {
    items: Vec<Toast>,
    lifetime: Duration,
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self { items: Vec::new(), lifetime }
    }

    pub fn set_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    pub fn push(&mut self, notice: Notice) {
        self.items.push(Toast { notice, shown_at: Instant::now() });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notice { level: NoticeLevel::Error, message: message.into() });
    }

    fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.items.retain(|toast| now.duration_since(toast.shown_at) < lifetime);
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune(Instant::now());
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("speechlab_toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                for toast in &self.items {
                    let (fill, text) = match toast.notice.level {
                        NoticeLevel::Success => (egui::Color32::from_rgb(20, 60, 40), egui::Color32::from_rgb(134, 239, 172)),
                        NoticeLevel::Error => (egui::Color32::from_rgb(70, 20, 24), egui::Color32::from_rgb(252, 165, 165)),
                    };
                    egui::Frame::none().fill(fill).rounding(10.0).inner_margin(12.0).show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.add(egui::Label::new(egui::RichText::new(&toast.notice.message).size(13.0).color(text)).wrap());
                    });
                    ui.add_space(6.0);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let mut toasts = Toasts::new(Duration::from_secs(4));
        toasts.error("boom");
        toasts.push(Notice { level: NoticeLevel::Success, message: "ok".to_string() });
        assert_eq!(toasts.items.len(), 2);

        toasts.prune(Instant::now());
        assert_eq!(toasts.items.len(), 2);

        toasts.prune(Instant::now() + Duration::from_secs(5));
        assert_eq!(toasts.items.len(), 0);
    }
}
