use std::time::{Duration, Instant};

use egui::{Color32, Context, RichText};

use crate::ui::theme;

/// How long a toast stays on screen.
pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

/// Transient top-right notifications.
#[derive(Debug, Default)]
pub struct Notifications {
    toasts: Vec<Toast>,
}

impl Notifications {
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message.into(), ToastKind::Success, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message.into(), ToastKind::Error, Instant::now());
    }

    fn push(&mut self, message: String, kind: ToastKind, shown_at: Instant) {
        tracing::debug!(?kind, %message, "toast");
        self.toasts.push(Toast { message, kind, shown_at });
    }

    /// Drop toasts older than [`TOAST_LIFETIME`].
    pub fn prune(&mut self, now: Instant) {
        self.toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_LIFETIME);
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn show(&mut self, ctx: &Context) {
        let now = Instant::now();
        self.prune(now);
        if self.toasts.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_TOP, [-16.0, 48.0])
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    let fill = match toast.kind {
                        ToastKind::Success => theme::TOAST_SUCCESS,
                        ToastKind::Error => theme::TOAST_ERROR,
                    };
                    egui::Frame::none()
                        .fill(fill)
                        .rounding(egui::Rounding::same(6.0))
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                        .shadow(egui::epaint::Shadow {
                            offset: egui::vec2(0.0, 2.0),
                            blur: 8.0,
                            spread: 0.0,
                            color: Color32::from_black_alpha(60),
                        })
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.label(RichText::new(&toast.message).color(Color32::WHITE));
                        });
                    ui.add_space(6.0);
                }
            });

        // Wake up again when the oldest toast expires.
        if let Some(oldest) = self.toasts.iter().map(|t| t.shown_at).min() {
            let remaining = TOAST_LIFETIME.saturating_sub(now.saturating_duration_since(oldest));
            ctx.request_repaint_after(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_lifetime() {
        let mut n = Notifications::default();
        let t0 = Instant::now();
        n.push("Задача сохранена".into(), ToastKind::Success, t0);
        n.push("Ошибка".into(), ToastKind::Error, t0 + Duration::from_secs(2));

        n.prune(t0 + Duration::from_millis(2999));
        assert_eq!(n.toasts().len(), 2);

        n.prune(t0 + Duration::from_secs(3));
        assert_eq!(n.toasts().len(), 1);
        assert_eq!(n.toasts()[0].kind, ToastKind::Error);

        n.prune(t0 + Duration::from_secs(5));
        assert!(n.toasts().is_empty());
    }
}
