use crate::app::{GanttApp, Tab};
use crate::model::ZoomLevel;
use crate::ui::theme;
use egui::{RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top toolbar: tabs on the left, view and data actions on the right.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    ui.add_space(4.0);
    ui.horizontal(|ui| {
        ui.selectable_value(&mut app.tab, Tab::Tasks, format!("{} Список задач", icons::LIST_BULLETS));
        ui.selectable_value(&mut app.tab, Tab::Gantt, format!("{} Диаграмма Ганта", icons::CHART_BAR_HORIZONTAL));

        ui.separator();

        if app.tab == Tab::Gantt {
            ui.label(RichText::new("Масштаб:").color(theme::TEXT_SECONDARY));
            for zoom in ZoomLevel::ALL {
                if ui.selectable_label(app.zoom == zoom, zoom.label()).clicked() {
                    app.set_zoom(zoom);
                }
            }
            ui.separator();
            if ui
                .button(format!("{} Сегодня", icons::CALENDAR_CHECK))
                .on_hover_text("Прокрутить к сегодняшнему дню")
                .clicked()
            {
                app.scroll_to_today();
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .button(icons::FILE_CSV)
                .on_hover_text("Экспорт в CSV")
                .clicked()
            {
                app.export_csv();
            }
            let reload = ui.add_enabled(!app.loading, egui::Button::new(icons::ARROWS_CLOCKWISE));
            if reload.on_hover_text("Обновить (F5)").clicked() {
                app.reload_tasks();
            }
            if let Some(project) = app.config.project_id.as_deref() {
                ui.label(
                    RichText::new(format!("Проект {project}"))
                        .size(11.0)
                        .color(theme::TEXT_DIM),
                );
            }
        });
    });
    ui.add_space(4.0);
}
