use std::cmp::Ordering;

use crate::model::date;
use crate::model::{StatusClass, Task};
use crate::ui::theme;
use egui::{Color32, RichText, Ui};

/// Actions that the task list can request.
pub enum TaskTableAction {
    None,
    Open(String),
}

/// Tasks passing the status filter and the search query, in server order.
pub fn filter_tasks<'a>(tasks: &'a [Task], status: Option<StatusClass>, query: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| status.map_or(true, |s| t.status_class() == s))
        .filter(|t| t.matches_query(query))
        .collect()
}

/// Column the list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Order the server returned.
    #[default]
    Server,
    Deadline,
    Status,
    Title,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Server, SortKey::Deadline, SortKey::Status, SortKey::Title];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Server => "По умолчанию",
            SortKey::Deadline => "По дедлайну",
            SortKey::Status => "По статусу",
            SortKey::Title => "По названию",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSort {
    pub key: SortKey,
    pub descending: bool,
}

/// Stable sort of the visible rows. Ties keep server order. When sorting by
/// deadline, tasks without a valid one stay at the bottom in both directions.
pub fn sort_tasks(tasks: &mut [&Task], sort: TaskSort) {
    if sort.key == SortKey::Server {
        if sort.descending {
            tasks.reverse();
        }
        return;
    }
    tasks.sort_by(|a, b| compare(a, b, sort));
}

fn compare(a: &Task, b: &Task, sort: TaskSort) -> Ordering {
    let directed = |ord: Ordering| if sort.descending { ord.reverse() } else { ord };
    match sort.key {
        SortKey::Server => Ordering::Equal,
        SortKey::Deadline => match (a.deadline().valid(), b.deadline().valid()) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Status => directed(status_rank(a).cmp(&status_rank(b))),
        SortKey::Title => directed(a.title.to_lowercase().cmp(&b.title.to_lowercase())),
    }
}

fn status_rank(task: &Task) -> usize {
    let class = task.status_class();
    StatusClass::ALL.iter().position(|s| *s == class).unwrap_or(0)
}

fn filter_label(status: Option<StatusClass>) -> &'static str {
    match status {
        None => "Все",
        Some(s) => theme::status_label(s),
    }
}

/// Status filter, sort selector and search box above the list.
pub fn show_filter_bar(
    query: &mut String,
    status: &mut Option<StatusClass>,
    sort: &mut TaskSort,
    ui: &mut Ui,
) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(egui_phosphor::regular::MAGNIFYING_GLASS).color(theme::TEXT_DIM));
        ui.add(
            egui::TextEdit::singleline(query)
                .hint_text("Поиск задач...")
                .desired_width(220.0),
        );
        ui.add_space(8.0);
        egui::ComboBox::from_id_salt("status-filter")
            .selected_text(filter_label(*status))
            .show_ui(ui, |ui| {
                ui.selectable_value(status, None, filter_label(None));
                for s in StatusClass::ALL {
                    ui.selectable_value(status, Some(s), filter_label(Some(s)));
                }
            });
        egui::ComboBox::from_id_salt("task-sort")
            .selected_text(sort.key.label())
            .show_ui(ui, |ui| {
                for key in SortKey::ALL {
                    ui.selectable_value(&mut sort.key, key, key.label());
                }
            });
        let (icon, hint) = if sort.descending {
            (egui_phosphor::regular::SORT_DESCENDING, "По убыванию")
        } else {
            (egui_phosphor::regular::SORT_ASCENDING, "По возрастанию")
        };
        if ui.button(icon).on_hover_text(hint).clicked() {
            sort.descending = !sort.descending;
        }
    });
}

/// Render the task list tab.
pub fn show_task_table(tasks: &[&Task], total: usize, ui: &mut Ui) -> TaskTableAction {
    let mut action = TaskTableAction::None;

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Задачи")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        let count = if tasks.len() == total {
            format!("({total})")
        } else {
            format!("({} из {total})", tasks.len())
        };
        ui.label(RichText::new(count).size(11.0).color(theme::TEXT_DIM));
    });
    ui.add_space(4.0);
    ui.separator();

    if tasks.is_empty() {
        ui.add_space(12.0);
        ui.label(RichText::new("Задачи не найдены").color(theme::TEXT_DIM));
        return action;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, task) in tasks.iter().enumerate() {
                let row_bg = if i % 2 == 0 { theme::BG_PANEL } else { theme::BG_DARK };
                let status = task.status_class();

                let frame = egui::Frame {
                    fill: row_bg,
                    rounding: egui::Rounding::same(4.0),
                    inner_margin: egui::Margin::symmetric(8.0, 6.0),
                    outer_margin: egui::Margin::ZERO,
                    stroke: egui::Stroke::NONE,
                    shadow: egui::epaint::Shadow::NONE,
                };

                let frame_resp = frame.show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 6.0;

                        let (dot_rect, _) =
                            ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                        ui.painter()
                            .circle_filled(dot_rect.center(), 4.0, theme::status_color(status));

                        ui.vertical(|ui| {
                            ui.add(
                                egui::Label::new(
                                    RichText::new(&task.title).size(12.5).color(theme::TEXT_PRIMARY),
                                )
                                .truncate(),
                            );
                            if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
                                ui.add(
                                    egui::Label::new(RichText::new(desc).size(10.5).color(theme::TEXT_DIM))
                                        .truncate(),
                                );
                            }
                        });

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new(theme::status_label(status))
                                    .size(10.5)
                                    .color(theme::status_color(status)),
                            );
                            ui.label(
                                RichText::new(task.assignee_label())
                                    .size(10.5)
                                    .color(theme::TEXT_SECONDARY),
                            );
                            let deadline = task
                                .deadline()
                                .valid()
                                .map(date::format)
                                .unwrap_or_else(|| "—".to_string());
                            ui.label(
                                RichText::new(format!("{} {deadline}", egui_phosphor::regular::CALENDAR))
                                    .size(10.5)
                                    .color(Color32::from_gray(170)),
                            );
                        });
                    });
                });

                // Make entire row clickable
                let row_click = ui.interact(
                    frame_resp.response.rect,
                    egui::Id::new(("task-row", &task.id)),
                    egui::Sense::click(),
                );
                if row_click.clicked() {
                    action = TaskTableAction::Open(task.id.clone());
                }
                if row_click.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }

                ui.add_space(1.0);
            }
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, title: &str, status: &str) -> Task {
        Task {
            id: id.into(),
            title: title.into(),
            status: Some(status.into()),
            ..Default::default()
        }
    }

    fn ids(v: &[&Task]) -> Vec<String> {
        v.iter().map(|t| t.id.clone()).collect()
    }

    fn sorted(tasks: &[Task], key: SortKey, descending: bool) -> Vec<String> {
        let mut rows: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut rows, TaskSort { key, descending });
        ids(&rows)
    }

    fn with_deadline(id: &str, deadline: Option<&str>) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            deadline: deadline.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn deadline_sort_parses_dates_and_keeps_undated_last() {
        let tasks = [
            with_deadline("feb", Some("01.02.2024")),
            with_deadline("none", None),
            with_deadline("jan-iso", Some("2024-01-15")),
            with_deadline("bad", Some("31.02.2024")),
            with_deadline("dec", Some("20/12/2023")),
        ];
        assert_eq!(sorted(&tasks, SortKey::Deadline, false), ["dec", "jan-iso", "feb", "none", "bad"]);
        assert_eq!(sorted(&tasks, SortKey::Deadline, true), ["feb", "jan-iso", "dec", "none", "bad"]);
    }

    #[test]
    fn status_and_title_sorts_are_stable() {
        let tasks = [
            task("1", "Бюджет", "завершена"),
            task("2", "акт", "активна"),
            task("3", "Встреча", "отложена"),
            task("4", "Архив", "активна"),
        ];
        assert_eq!(sorted(&tasks, SortKey::Status, false), ["2", "4", "1", "3"]);
        assert_eq!(sorted(&tasks, SortKey::Status, true), ["3", "1", "2", "4"]);
        assert_eq!(sorted(&tasks, SortKey::Title, false), ["2", "4", "1", "3"]);
        assert_eq!(sorted(&tasks, SortKey::Title, true), ["3", "1", "4", "2"]);
        assert_eq!(sorted(&tasks, SortKey::Server, false), ["1", "2", "3", "4"]);
        assert_eq!(sorted(&tasks, SortKey::Server, true), ["4", "3", "2", "1"]);
    }

    #[test]
    fn filter_combines_status_and_query() {
        let tasks = [
            task("1", "Смета на ремонт", "активна"),
            task("2", "Смета на закупку", "завершена"),
            task("3", "Отчёт", "отложена"),
        ];
        assert_eq!(ids(&filter_tasks(&tasks, None, "")), ["1", "2", "3"]);
        assert_eq!(ids(&filter_tasks(&tasks, None, "смета")), ["1", "2"]);
        assert_eq!(ids(&filter_tasks(&tasks, Some(StatusClass::Completed), "смета")), ["2"]);
        assert!(filter_tasks(&tasks, Some(StatusClass::Paused), "смета").is_empty());
    }
}
