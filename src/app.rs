use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::io::api::ApiClient;
use crate::io::worker::{self, ApiCommand, ApiMessage, RequestSeq, WorkerHandle};
use crate::model::layout::{self, GanttLayout};
use crate::model::task::DateUpdate;
use crate::model::{DateChange, RangeSource, RenderContext, StatusClass, Task, ZoomLevel};
use crate::ui;
use crate::ui::gantt_chart::ChartState;
use crate::ui::notifications::Notifications;
use crate::ui::task_modal::{EditForm, ModalAction, TaskModal};
use crate::ui::task_table::TaskSort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    Tasks,
    #[default]
    Gantt,
}

/// Main application state.
pub struct GanttApp {
    pub config: AppConfig,
    api: ApiClient,
    worker: WorkerHandle,

    pub tasks: Vec<Task>,
    pub loading: bool,
    load_seq: RequestSeq,

    // View state
    pub tab: Tab,
    pub zoom: ZoomLevel,
    pub range_source: RangeSource,
    pub chart: ChartState,
    layout: GanttLayout,
    /// Context `layout` was built for; `None` forces a rebuild.
    layout_key: Option<RenderContext>,

    // Filter / search
    pub search_query: String,
    pub filter_status: Option<StatusClass>,
    pub sort: TaskSort,

    pub modal: TaskModal,
    pub notifications: Notifications,
    pub status_message: String,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig, api: ApiClient) -> std::io::Result<Self> {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let repaint = cc.egui_ctx.clone();
        let worker = worker::spawn(api.clone(), move || repaint.request_repaint())?;

        let mut app = Self::with_worker(config, api, worker);
        app.reload_tasks();
        Ok(app)
    }

    fn with_worker(config: AppConfig, api: ApiClient, worker: WorkerHandle) -> Self {
        Self {
            zoom: config.default_zoom,
            range_source: config.range_source(),
            config,
            api,
            worker,
            tasks: Vec::new(),
            loading: false,
            load_seq: RequestSeq::default(),
            tab: Tab::default(),
            chart: ChartState::default(),
            layout: GanttLayout::Placeholder(layout::NO_TASKS_MESSAGE),
            layout_key: None,
            search_query: String::new(),
            filter_status: None,
            sort: TaskSort::default(),
            modal: TaskModal::Closed,
            notifications: Notifications::default(),
            status_message: "Готово".to_string(),
        }
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn send(&mut self, cmd: ApiCommand) {
        if !self.worker.send(cmd) {
            tracing::error!("api worker is gone");
            self.notifications.error("Нет соединения с сервером");
        }
    }

    /// Rebuild the chart layout if the tasks or the render context changed.
    fn refresh_layout(&mut self) {
        let ctx = RenderContext::new(self.zoom, self.range_source, Self::today());
        if self.layout_key != Some(ctx) {
            tracing::trace!(zoom = ?ctx.zoom, tasks = self.tasks.len(), "rebuilding gantt layout");
            self.layout = layout::render(&self.tasks, &ctx);
            self.layout_key = Some(ctx);
        }
    }

    fn invalidate_layout(&mut self) {
        self.layout_key = None;
    }

    // --- Commands ---

    pub fn reload_tasks(&mut self) {
        let Some(project_id) = self.config.project_id.clone() else {
            tracing::warn!(err = %ApiError::NoProject, "cannot load tasks");
            self.status_message = "Проект не выбран (TASKBOARD_PROJECT_ID)".to_string();
            return;
        };
        let seq = self.load_seq.next();
        self.loading = true;
        self.status_message = "Загрузка задач...".to_string();
        self.send(ApiCommand::LoadTasks { project_id, seq });
    }

    pub fn set_zoom(&mut self, zoom: ZoomLevel) {
        if self.zoom != zoom {
            tracing::debug!(?zoom, "zoom changed");
            self.zoom = zoom;
        }
    }

    pub fn scroll_to_today(&mut self) {
        self.tab = Tab::Gantt;
        self.chart.request_scroll_to_today();
    }

    pub fn open_task(&mut self, task_id: String) {
        self.modal = TaskModal::Loading { task_id: task_id.clone() };
        self.send(ApiCommand::LoadTask { task_id });
    }

    /// Apply a finished drag or resize: update the cached task and push the
    /// new dates to the server. Releases that did not move the bar are dropped.
    pub fn apply_date_change(&mut self, change: DateChange) {
        if change.is_noop() {
            tracing::trace!(task = %change.task_id, "bar released without change");
            return;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == change.task_id) else {
            tracing::debug!(task = %change.task_id, "date change for unknown task");
            return;
        };
        task.reschedule(change.start, change.end);
        self.layout_key = None;
        tracing::info!(task = %change.task_id, start = %change.start, end = %change.end, "rescheduled");
        self.status_message = format!(
            "«{}»: {} – {}",
            task.title,
            change.start.format("%d.%m.%Y"),
            change.end.format("%d.%m.%Y"),
        );
        let update = DateUpdate::new(change.task_id, change.start, change.end);
        self.send(ApiCommand::UpdateDates(update));
    }

    pub fn export_csv(&mut self) {
        if self.tasks.is_empty() {
            self.notifications.error("Нет задач для экспорта");
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name("tasks.csv")
            .save_file()
        {
            match crate::io::csv_export::export_csv(&self.tasks, &path) {
                Ok(count) => self.notifications.success(format!("Экспортировано задач: {count}")),
                Err(e) => {
                    tracing::warn!(%e, "CSV export failed");
                    self.notifications.error(format!("Ошибка экспорта: {e}"));
                }
            }
        }
    }

    fn open_attachment(&mut self, path: &str) {
        let url = self.api.upload_url(path);
        if let Err(e) = open::that(&url) {
            tracing::warn!(%url, %e, "failed to open attachment");
            self.notifications.error("Не удалось открыть файл");
        }
    }

    // --- Worker replies ---

    pub fn process_messages(&mut self) {
        while let Some(msg) = self.worker.try_recv() {
            self.handle_message(msg);
        }
    }

    pub fn handle_message(&mut self, msg: ApiMessage) {
        match msg {
            ApiMessage::TasksLoaded { seq, result } => {
                if !self.load_seq.is_current(seq) {
                    tracing::debug!(seq, "dropping stale task list");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(tasks) => {
                        tracing::info!(count = tasks.len(), "tasks loaded");
                        self.status_message = format!("Загружено задач: {}", tasks.len());
                        self.tasks = tasks;
                        self.invalidate_layout();
                    }
                    Err(err) => {
                        tracing::warn!(%err, "failed to load tasks");
                        self.status_message = "Ошибка загрузки".to_string();
                        self.notifications.error(err.user_message("Ошибка при загрузке задач"));
                    }
                }
            }
            ApiMessage::TaskLoaded { task_id, result } => {
                if self.modal.task_id() != Some(task_id.as_str()) {
                    return;
                }
                match result {
                    Ok(detail) => {
                        let form = EditForm::from_task(&detail.task, Self::today());
                        self.modal = TaskModal::Open {
                            detail: Box::new(detail),
                            form,
                            saving: false,
                        };
                    }
                    Err(err) => {
                        tracing::warn!(task = %task_id, %err, "failed to load task");
                        self.modal = TaskModal::Closed;
                        self.notifications.error(err.user_message("Ошибка при загрузке задачи"));
                    }
                }
            }
            ApiMessage::TaskUpdated { task_id, result } => match result {
                Ok(reply) => {
                    tracing::info!(task = %task_id, "task updated");
                    if self.modal.task_id() == Some(task_id.as_str()) {
                        self.modal = TaskModal::Closed;
                    }
                    self.notifications
                        .success(reply.message.unwrap_or_else(|| "Задача успешно обновлена".to_string()));
                    self.reload_tasks();
                }
                Err(err) => {
                    tracing::warn!(task = %task_id, %err, "task update failed");
                    if let TaskModal::Open { saving, .. } = &mut self.modal {
                        *saving = false;
                    }
                    self.notifications.error(err.user_message("Ошибка при сохранении задачи"));
                }
            },
            ApiMessage::DatesUpdated { update, result } => match result {
                Ok(reply) => {
                    if let Some(task) = reply.task {
                        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                            *slot = task;
                            self.invalidate_layout();
                        }
                    }
                    self.notifications.success("Даты задачи обновлены");
                }
                Err(err) => {
                    // The optimistic change stays in place; the next reload shows server truth.
                    self.notifications.error(err.user_message(&format!(
                        "Не удалось сохранить даты задачи ({} – {})",
                        update.start_date, update.deadline
                    )));
                }
            },
        }
    }

    fn handle_modal_action(&mut self, action: ModalAction) {
        match action {
            ModalAction::None => {}
            ModalAction::Close => self.modal = TaskModal::Closed,
            ModalAction::Save { task_id, form } => {
                if let TaskModal::Open { saving, .. } = &mut self.modal {
                    *saving = true;
                }
                self.send(ApiCommand::UpdateTask { task_id, form });
            }
            ModalAction::OpenAttachment(path) => self.open_attachment(&path),
        }
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_messages();

        // Keyboard shortcuts
        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.reload_tasks();
        }
        // Zooming mid-drag would rescale the other bars under the pointer.
        if self.tab == Tab::Gantt && !self.modal.is_open() && !self.chart.is_interacting() {
            let zoom_delta = ctx.input(|i| i.zoom_delta());
            if zoom_delta > 1.0 {
                self.set_zoom(self.zoom.zoom_in());
            } else if zoom_delta < 1.0 {
                self.set_zoom(self.zoom.zoom_out());
            }
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    if self.loading {
                        ui.spinner();
                    }
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Масштаб: {}", self.zoom.label()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM));
                        ui.label(
                            egui::RichText::new(format!("Задач: {}", self.tasks.len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        if self.tab == Tab::Gantt {
            self.refresh_layout();
        }

        let panel_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::same(8.0));
        let mut open_task = None;
        let mut date_change = None;
        egui::CentralPanel::default().frame(panel_frame).show(ctx, |ui| match self.tab {
            Tab::Tasks => {
                ui::task_table::show_filter_bar(
                    &mut self.search_query,
                    &mut self.filter_status,
                    &mut self.sort,
                    ui,
                );
                ui.add_space(4.0);
                let mut visible =
                    ui::task_table::filter_tasks(&self.tasks, self.filter_status, &self.search_query);
                ui::task_table::sort_tasks(&mut visible, self.sort);
                if let ui::task_table::TaskTableAction::Open(id) =
                    ui::task_table::show_task_table(&visible, self.tasks.len(), ui)
                {
                    open_task = Some(id);
                }
            }
            Tab::Gantt => {
                let interaction =
                    ui::gantt_chart::show_gantt_chart(&self.layout, &self.tasks, &mut self.chart, ui);
                open_task = interaction.open_task;
                date_change = interaction.date_change;
            }
        });

        if let Some(change) = date_change {
            self.apply_date_change(change);
        }
        if let Some(id) = open_task {
            self.open_task(id);
        }

        let action = ui::task_modal::show_task_modal(&mut self.modal, ctx);
        self.handle_modal_action(action);

        self.notifications.show(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{TaskDetail, UpdateResponse};
    use assert_matches::assert_matches;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> (GanttApp, UnboundedReceiver<ApiCommand>) {
        let config = AppConfig {
            project_id: Some("p1".into()),
            ..Default::default()
        };
        let api = ApiClient::new(&config).unwrap();
        let (worker, cmd_rx, _msg_tx) = WorkerHandle::detached();
        (GanttApp::with_worker(config, api, worker), cmd_rx)
    }

    fn task(id: &str, start: &str, end: &str) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            start_date: Some(start.into()),
            deadline: Some(end.into()),
            ..Default::default()
        }
    }

    #[test]
    fn stale_task_lists_are_ignored() {
        let (mut app, mut cmds) = app();
        app.reload_tasks();
        app.reload_tasks();
        let first = assert_matches!(cmds.try_recv(), Ok(ApiCommand::LoadTasks { seq, .. }) => seq);
        let second = assert_matches!(cmds.try_recv(), Ok(ApiCommand::LoadTasks { seq, .. }) => seq);

        app.handle_message(ApiMessage::TasksLoaded {
            seq: second,
            result: Ok(vec![task("new", "01.01.2024", "02.01.2024")]),
        });
        app.handle_message(ApiMessage::TasksLoaded {
            seq: first,
            result: Ok(vec![task("old", "01.01.2024", "02.01.2024")]),
        });
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].id, "new");
        assert!(!app.loading);
    }

    #[test]
    fn reschedule_updates_cache_and_sends_dates() {
        let (mut app, mut cmds) = app();
        app.tasks = vec![task("t1", "01.01.2024", "02.01.2024")];

        app.apply_date_change(DateChange {
            task_id: "t1".into(),
            start: ymd(2024, 1, 3),
            end: ymd(2024, 1, 4),
            previous_start: ymd(2024, 1, 1),
            previous_end: ymd(2024, 1, 2),
        });

        assert_eq!(app.tasks[0].start_date.as_deref(), Some("03.01.2024"));
        assert_eq!(app.tasks[0].deadline.as_deref(), Some("04.01.2024"));
        let update = assert_matches!(cmds.try_recv(), Ok(ApiCommand::UpdateDates(u)) => u);
        assert_eq!(update, DateUpdate::new("t1", ymd(2024, 1, 3), ymd(2024, 1, 4)));
    }

    #[test]
    fn unchanged_release_sends_nothing() {
        let (mut app, mut cmds) = app();
        app.tasks = vec![task("t1", "01.01.2024", "02.01.2024")];
        app.apply_date_change(DateChange {
            task_id: "t1".into(),
            start: ymd(2024, 1, 1),
            end: ymd(2024, 1, 2),
            previous_start: ymd(2024, 1, 1),
            previous_end: ymd(2024, 1, 2),
        });
        assert!(cmds.try_recv().is_err());
    }

    #[test]
    fn failed_date_update_keeps_optimistic_dates() {
        let (mut app, _cmds) = app();
        app.tasks = vec![task("t1", "03.01.2024", "04.01.2024")];
        app.handle_message(ApiMessage::DatesUpdated {
            update: DateUpdate::new("t1", ymd(2024, 1, 3), ymd(2024, 1, 4)),
            result: Err(ApiError::Rejected("Задача не найдена".into())),
        });
        assert_eq!(app.tasks[0].start_date.as_deref(), Some("03.01.2024"));
        assert_eq!(app.notifications.toasts().len(), 1);
        assert_eq!(app.notifications.toasts()[0].message, "Задача не найдена");
    }

    #[test]
    fn detail_reply_opens_only_the_requested_task() {
        let (mut app, mut cmds) = app();
        app.open_task("t1".into());
        assert_matches!(cmds.try_recv(), Ok(ApiCommand::LoadTask { task_id }) if task_id == "t1");

        let detail = |id: &str| TaskDetail {
            task: task(id, "01.01.2024", "02.01.2024"),
            ..Default::default()
        };
        app.handle_message(ApiMessage::TaskLoaded { task_id: "t0".into(), result: Ok(detail("t0")) });
        assert_matches!(app.modal, TaskModal::Loading { .. });
        app.handle_message(ApiMessage::TaskLoaded { task_id: "t1".into(), result: Ok(detail("t1")) });
        assert_matches!(&app.modal, TaskModal::Open { detail, .. } if detail.task.id == "t1");
    }

    #[test]
    fn successful_edit_closes_dialog_and_reloads() {
        let (mut app, mut cmds) = app();
        app.modal = TaskModal::Loading { task_id: "t1".into() };
        app.handle_message(ApiMessage::TaskUpdated {
            task_id: "t1".into(),
            result: Ok(UpdateResponse {
                success: true,
                ..Default::default()
            }),
        });
        assert!(!app.modal.is_open());
        assert_matches!(cmds.try_recv(), Ok(ApiCommand::LoadTasks { .. }));
    }

    fn first_bar(app: &GanttApp) -> crate::model::BarGeometry {
        match &app.layout {
            GanttLayout::Chart(chart) => chart.rows[0].bar.geometry,
            GanttLayout::Placeholder(msg) => panic!("unexpected placeholder: {msg}"),
        }
    }

    #[test]
    fn layout_is_rebuilt_only_when_inputs_change() {
        let (mut app, _cmds) = app();
        app.zoom = ZoomLevel::Day;
        let seq = app.load_seq.next();
        app.handle_message(ApiMessage::TasksLoaded {
            seq,
            result: Ok(vec![task("t1", "01.01.2024", "02.01.2024")]),
        });
        app.refresh_layout();
        let before = first_bar(&app);
        assert_eq!(before.width, 2 * 40);

        // edits that bypass the app do not trigger a rebuild
        app.tasks[0].deadline = Some("05.01.2024".into());
        app.refresh_layout();
        assert_eq!(first_bar(&app), before);

        app.set_zoom(ZoomLevel::Week);
        app.refresh_layout();
        assert_eq!(first_bar(&app).width, 5 * 35);
    }

    #[test]
    fn reschedule_rebuilds_the_layout() {
        let (mut app, _cmds) = app();
        app.zoom = ZoomLevel::Day;
        app.tasks = vec![task("t1", "01.01.2024", "02.01.2024")];
        app.refresh_layout();
        assert_eq!(first_bar(&app).width, 2 * 40);

        app.apply_date_change(DateChange {
            task_id: "t1".into(),
            start: ymd(2024, 1, 1),
            end: ymd(2024, 1, 4),
            previous_start: ymd(2024, 1, 1),
            previous_end: ymd(2024, 1, 2),
        });
        app.refresh_layout();
        assert_eq!(first_bar(&app).width, 4 * 40);
    }

    #[test]
    fn missing_project_does_not_issue_requests() {
        let (mut app, mut cmds) = app();
        app.config.project_id = None;
        app.reload_tasks();
        assert!(cmds.try_recv().is_err());
        assert!(!app.loading);
    }
}
