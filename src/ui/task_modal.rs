use chrono::NaiveDate;
use egui::{Color32, Context, RichText, Ui, Window};

use crate::model::date;
use crate::model::task::TaskUpdate;
use crate::model::{StatusClass, Task, TaskDetail};
use crate::ui::theme;

pub const START_AFTER_DEADLINE: &str = "Дата начала не может быть позже даты дедлайна";
pub const EMPTY_TITLE: &str = "Название задачи не может быть пустым";

/// Detail dialog lifecycle.
#[derive(Debug, Default)]
pub enum TaskModal {
    #[default]
    Closed,
    Loading { task_id: String },
    Open {
        detail: Box<TaskDetail>,
        form: EditForm,
        saving: bool,
    },
}

impl TaskModal {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            TaskModal::Closed => None,
            TaskModal::Loading { task_id } => Some(task_id),
            TaskModal::Open { detail, .. } => Some(&detail.task.id),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, TaskModal::Closed)
    }
}

/// Things the dialog asks the app to do.
pub enum ModalAction {
    None,
    Close,
    Save { task_id: String, form: TaskUpdate },
    OpenAttachment(String),
}

/// Editable copy of a task's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    pub title: String,
    pub description: String,
    pub assignee_id: String,
    pub status: StatusClass,
    pub has_start: bool,
    pub start: NaiveDate,
    pub has_deadline: bool,
    pub deadline: NaiveDate,
}

impl EditForm {
    /// Missing dates default to `today` in the pickers but stay unset until enabled.
    pub fn from_task(task: &Task, today: NaiveDate) -> Self {
        let start = task.start().valid();
        let deadline = task.deadline().valid();
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            assignee_id: task.assignee_id.clone().unwrap_or_default(),
            status: task.status_class(),
            has_start: start.is_some(),
            start: start.unwrap_or(today),
            has_deadline: deadline.is_some(),
            deadline: deadline.unwrap_or(today),
        }
    }

    pub fn validate(&self) -> Result<TaskUpdate, &'static str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(EMPTY_TITLE);
        }
        if self.has_start && self.has_deadline && self.start > self.deadline {
            return Err(START_AFTER_DEADLINE);
        }
        Ok(TaskUpdate {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            assignee_id: self.assignee_id.clone(),
            status: self.status.wire_value().to_string(),
            start_date: if self.has_start { date::format(self.start) } else { String::new() },
            deadline: if self.has_deadline { date::format(self.deadline) } else { String::new() },
        })
    }
}

/// Render the task dialog. Returns what the user asked for this frame.
pub fn show_task_modal(modal: &mut TaskModal, ctx: &Context) -> ModalAction {
    if !modal.is_open() {
        return ModalAction::None;
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        return ModalAction::Close;
    }

    let mut action = ModalAction::None;
    let mut open = true;

    Window::new(RichText::new("Задача").strong().size(14.0))
        .open(&mut open)
        .resizable(true)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_size([560.0, 520.0])
        .show(ctx, |ui| match modal {
            TaskModal::Closed => {}
            TaskModal::Loading { .. } => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new("Загрузка задачи...").color(theme::TEXT_SECONDARY));
                });
            }
            TaskModal::Open { detail, form, saving } => {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    show_summary(ui, &detail.task);
                    ui.add_space(6.0);
                    ui.separator();
                    if let Some(a) = show_edit_form(ui, detail, form, *saving) {
                        action = a;
                    }
                    ui.separator();
                    show_history(ui, detail);
                    ui.add_space(6.0);
                    if let Some(a) = show_reports(ui, detail) {
                        action = a;
                    }
                });
            }
        });

    if !open {
        return ModalAction::Close;
    }
    action
}

fn show_summary(ui: &mut Ui, task: &Task) {
    let status = task.status_class();
    ui.horizontal(|ui| {
        ui.heading(RichText::new(&task.title).strong());
        let badge = egui::Frame::none()
            .fill(theme::status_color(status))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::symmetric(8.0, 2.0));
        badge.show(ui, |ui| {
            ui.label(RichText::new(theme::status_label(status)).size(11.0).color(Color32::WHITE));
        });
    });

    if let Some(desc) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        ui.add_space(4.0);
        ui.label(desc);
    }

    ui.add_space(4.0);
    let fmt = |raw: Option<&str>| match date::parse(raw).valid() {
        Some(d) => date::format(d),
        None => "Не указан".to_string(),
    };
    egui::Grid::new("task_summary_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label(RichText::new("Исполнитель").color(theme::TEXT_SECONDARY));
            ui.label(task.assignee_label());
            ui.end_row();
            ui.label(RichText::new("Начало").color(theme::TEXT_SECONDARY));
            ui.label(fmt(task.start_date.as_deref()));
            ui.end_row();
            ui.label(RichText::new("Дедлайн").color(theme::TEXT_SECONDARY));
            ui.label(fmt(task.deadline.as_deref()));
            ui.end_row();
        });
}

fn show_edit_form(ui: &mut Ui, detail: &TaskDetail, form: &mut EditForm, saving: bool) -> Option<ModalAction> {
    let mut action = None;
    egui::CollapsingHeader::new(RichText::new("Редактировать").strong())
        .id_salt("task_edit")
        .show(ui, |ui| {
            ui.add_enabled_ui(!saving, |ui| {
                egui::Grid::new("task_edit_grid")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Название").color(theme::TEXT_SECONDARY));
                        ui.add_sized([300.0, 24.0], egui::TextEdit::singleline(&mut form.title));
                        ui.end_row();

                        ui.label(RichText::new("Описание").color(theme::TEXT_SECONDARY));
                        ui.add_sized([300.0, 60.0], egui::TextEdit::multiline(&mut form.description));
                        ui.end_row();

                        ui.label(RichText::new("Исполнитель").color(theme::TEXT_SECONDARY));
                        let current = detail
                            .team_users
                            .iter()
                            .find(|u| u.id == form.assignee_id)
                            .map(|u| u.name.as_str())
                            .unwrap_or(crate::model::task::UNASSIGNED);
                        egui::ComboBox::from_id_salt("assignee_combo")
                            .selected_text(current)
                            .width(300.0)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(
                                    &mut form.assignee_id,
                                    String::new(),
                                    crate::model::task::UNASSIGNED,
                                );
                                for user in &detail.team_users {
                                    ui.selectable_value(&mut form.assignee_id, user.id.clone(), &user.name);
                                }
                            });
                        ui.end_row();

                        ui.label(RichText::new("Статус").color(theme::TEXT_SECONDARY));
                        egui::ComboBox::from_id_salt("status_combo")
                            .selected_text(theme::status_label(form.status))
                            .width(300.0)
                            .show_ui(ui, |ui| {
                                for s in StatusClass::ALL {
                                    ui.selectable_value(&mut form.status, s, theme::status_label(s));
                                }
                            });
                        ui.end_row();

                        ui.label(RichText::new("Начало").color(theme::TEXT_SECONDARY));
                        ui.horizontal(|ui| {
                            ui.checkbox(&mut form.has_start, "");
                            ui.add_enabled(
                                form.has_start,
                                egui_extras::DatePickerButton::new(&mut form.start).id_salt("dp_edit_start"),
                            );
                        });
                        ui.end_row();

                        ui.label(RichText::new("Дедлайн").color(theme::TEXT_SECONDARY));
                        ui.horizontal(|ui| {
                            ui.checkbox(&mut form.has_deadline, "");
                            ui.add_enabled(
                                form.has_deadline,
                                egui_extras::DatePickerButton::new(&mut form.deadline).id_salt("dp_edit_deadline"),
                            );
                        });
                        ui.end_row();
                    });

                ui.add_space(6.0);
                let validation = form.validate();
                if let Err(msg) = &validation {
                    ui.label(RichText::new(*msg).size(11.0).color(theme::TOAST_ERROR));
                }
                ui.horizontal(|ui| {
                    let label = if saving { "Сохранение..." } else { "Сохранить" };
                    let save_btn = egui::Button::new(RichText::new(label).color(Color32::WHITE))
                        .fill(theme::ACCENT)
                        .rounding(egui::Rounding::same(4.0));
                    if ui.add_enabled(validation.is_ok(), save_btn).clicked() {
                        if let Ok(update) = validation {
                            action = Some(ModalAction::Save {
                                task_id: detail.task.id.clone(),
                                form: update,
                            });
                        }
                    }
                    if ui.button("Отмена").clicked() {
                        action = Some(ModalAction::Close);
                    }
                });
            });
        });
    action
}

fn show_history(ui: &mut Ui, detail: &TaskDetail) {
    ui.label(RichText::new("История").strong());
    if detail.history.is_empty() {
        ui.label(RichText::new("Нет записей").color(theme::TEXT_DIM));
        return;
    }
    for entry in &detail.history {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(&entry.action).strong());
            ui.label(
                RichText::new(format!(
                    "{} - {}",
                    entry.date,
                    entry.user_name.as_deref().unwrap_or("—")
                ))
                .size(11.0)
                .color(theme::TEXT_DIM),
            );
        });
    }
}

fn show_reports(ui: &mut Ui, detail: &TaskDetail) -> Option<ModalAction> {
    let mut action = None;
    ui.label(RichText::new("Отчёты").strong());
    if detail.reports.is_empty() {
        ui.label(RichText::new("Отчётов пока нет").color(theme::TEXT_DIM));
        return None;
    }
    for report in &detail.reports {
        egui::Frame::none()
            .fill(theme::BG_HEADER)
            .rounding(egui::Rounding::same(4.0))
            .inner_margin(egui::Margin::same(6.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(report.comment.as_deref().filter(|c| !c.is_empty()).unwrap_or("Без комментария"));
                ui.label(
                    RichText::new(format!(
                        "{}  {}",
                        report.date,
                        report.executor_name.as_deref().unwrap_or_default()
                    ))
                    .size(11.0)
                    .color(theme::TEXT_DIM),
                );
                if let Some(file) = &report.file_info {
                    let link = ui.link(format!("{} {}", egui_phosphor::regular::PAPERCLIP, file.filename));
                    if link.clicked() {
                        action = Some(ModalAction::OpenAttachment(file.path.clone()));
                    }
                }
            });
        ui.add_space(3.0);
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Task {
        Task {
            id: "t1".into(),
            title: "  Смета  ".into(),
            status: Some("отложена".into()),
            assignee_id: Some("2".into()),
            start_date: Some("01.02.2024".into()),
            deadline: None,
            ..Default::default()
        }
    }

    #[test]
    fn form_starts_from_task_fields() {
        let form = EditForm::from_task(&sample(), ymd(2024, 5, 1));
        assert_eq!(form.status, StatusClass::Paused);
        assert!(form.has_start);
        assert_eq!(form.start, ymd(2024, 2, 1));
        assert!(!form.has_deadline);
        assert_eq!(form.deadline, ymd(2024, 5, 1));
    }

    #[test]
    fn validated_form_matches_wire_format() {
        let form = EditForm::from_task(&sample(), ymd(2024, 5, 1));
        let update = form.validate().unwrap();
        assert_eq!(update.title, "Смета");
        assert_eq!(update.status, "отложена");
        assert_eq!(update.start_date, "01.02.2024");
        assert_eq!(update.deadline, "");
        assert_eq!(update.assignee_id, "2");
    }

    #[test]
    fn rejects_start_after_deadline_and_blank_title() {
        let mut form = EditForm::from_task(&sample(), ymd(2024, 1, 1));
        form.has_deadline = true;
        assert_matches!(form.validate(), Err(START_AFTER_DEADLINE));
        form.deadline = ymd(2024, 2, 1);
        assert!(form.validate().is_ok());
        form.title = "   ".into();
        assert_matches!(form.validate(), Err(EMPTY_TITLE));
    }

    #[test]
    fn modal_reports_current_task() {
        assert_eq!(TaskModal::Closed.task_id(), None);
        let loading = TaskModal::Loading { task_id: "t9".into() };
        assert_eq!(loading.task_id(), Some("t9"));
        assert!(loading.is_open());
    }
}
