use std::collections::HashMap;

use egui::{Color32, CursorIcon, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::model::date;
use crate::model::{
    BarController, BarGeometry, DateChange, GanttChart, GanttLayout, HitZone, PointerEvent, Task,
};
use crate::model::Granularity;
use crate::ui::theme;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_PADDING: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const LABEL_WIDTH: f32 = theme::LABEL_COLUMN_WIDTH;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Chart state that outlives a single frame.
#[derive(Default)]
pub struct ChartState {
    controllers: HashMap<String, BarController>,
    scroll_to_today: bool,
}

impl ChartState {
    /// Scroll the chart so today's cell is visible on the next frame.
    pub fn request_scroll_to_today(&mut self) {
        self.scroll_to_today = true;
    }

    /// True while any bar is being dragged or resized.
    pub fn is_interacting(&self) -> bool {
        self.controllers.values().any(BarController::is_active)
    }

    /// Bring controllers in line with the latest layout. Bars mid-session keep
    /// their live state; everything else is rebuilt from the layout.
    fn sync(&mut self, chart: &GanttChart) {
        self.controllers
            .retain(|id, c| c.is_active() || chart.row(id).is_some());
        for row in &chart.rows {
            let bar = &row.bar;
            let active = matches!(self.controllers.get(&bar.task_id), Some(c) if c.is_active());
            if !active {
                self.controllers.insert(
                    bar.task_id.clone(),
                    BarController::new(
                        bar.task_id.clone(),
                        bar.geometry,
                        chart.origin,
                        chart.cell_width,
                        chart.range.granularity,
                    ),
                );
            }
        }
    }
}

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Default)]
pub struct ChartInteraction {
    pub open_task: Option<String>,
    pub date_change: Option<DateChange>,
}

/// Render the Gantt tab.
pub fn show_gantt_chart(
    layout: &GanttLayout,
    tasks: &[Task],
    state: &mut ChartState,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();

    let chart = match layout {
        GanttLayout::Placeholder(message) => {
            state.controllers.clear();
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new(*message).size(14.0).color(theme::TEXT_DIM));
            });
            return interaction;
        }
        GanttLayout::Chart(chart) => chart,
    };

    state.sync(chart);

    let available = ui.available_size();
    let chart_width = LABEL_WIDTH + chart.total_width() as f32;
    let chart_height = HEADER_HEIGHT + chart.rows.len() as f32 * (ROW_HEIGHT + ROW_PADDING) + 20.0;

    let mut scroll = egui::ScrollArea::both().auto_shrink([false, false]);
    if std::mem::take(&mut state.scroll_to_today) {
        if let Some(x) = chart.today_x() {
            // leave a few cells of context left of today
            let offset = (x - 3 * chart.cell_width).max(0) as f32;
            scroll = scroll.horizontal_scroll_offset(offset);
        }
    }

    scroll.show(ui, |ui| {
        let (response, painter) = ui.allocate_painter(
            Vec2::new(chart_width.max(available.x), chart_height.max(available.y)),
            Sense::hover(),
        );
        let origin = response.rect.min;
        let grid_x = origin.x + LABEL_WIDTH;
        let bottom = response.rect.bottom();

        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

        draw_columns(&painter, chart, grid_x, origin.y, bottom);
        draw_rows(&painter, chart, origin, chart_width);
        draw_timeline_header(&painter, chart, origin, chart_width);
        draw_label_column(&painter, chart, origin, bottom);

        for (i, row) in chart.rows.iter().enumerate() {
            let bar = &row.bar;
            let Some(controller) = state.controllers.get_mut(&bar.task_id) else {
                continue;
            };
            let y = origin.y + HEADER_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_PADDING) + ROW_PADDING;
            let bar_rect = bar_rect_at(controller.geometry(), grid_x, y);
            let active = controller.is_active();

            let bar_response = ui.interact(
                bar_rect,
                ui.make_persistent_id(("gantt-bar", &bar.task_id)),
                Sense::click_and_drag(),
            );

            let chart_x = |pos: Pos2| (pos.x - grid_x).round() as i32;

            if bar_response.drag_started() {
                let press = ui
                    .input(|i| i.pointer.press_origin())
                    .or(bar_response.interact_pointer_pos());
                if let Some(press) = press {
                    let zone = HitZone::classify(press.x - bar_rect.left(), bar_rect.width(), HANDLE_WIDTH);
                    controller.handle(PointerEvent::Press { x: chart_x(press), zone });
                }
            }
            if bar_response.dragged() {
                if let Some(pos) = bar_response.interact_pointer_pos() {
                    controller.handle(PointerEvent::Move { x: chart_x(pos) });
                }
                ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
            }
            if bar_response.drag_stopped() {
                if let Some(change) = controller.handle(PointerEvent::Release) {
                    tracing::debug!(task = %change.task_id, start = %change.start, end = %change.end, "bar released");
                    interaction.date_change = Some(change);
                }
            }
            if bar_response.clicked() {
                interaction.open_task = Some(bar.task_id.clone());
            }

            // Repaint from the controller so the bar follows the pointer this frame.
            let bar_rect = bar_rect_at(controller.geometry(), grid_x, y);
            draw_task_bar(&painter, bar_rect, &row.title, theme::status_color(bar.status), active);

            if bar_response.hovered() && !active {
                if let Some(pos) = ui.input(|i| i.pointer.hover_pos()) {
                    let zone = HitZone::classify(pos.x - bar_rect.left(), bar_rect.width(), HANDLE_WIDTH);
                    ui.ctx().set_cursor_icon(match zone {
                        HitZone::Body => CursorIcon::Grab,
                        HitZone::Edge(_) => CursorIcon::ResizeHorizontal,
                    });
                    draw_handles(&painter, bar_rect);
                }
                if let Some(task) = tasks.iter().find(|t| t.id == bar.task_id) {
                    bar_response.on_hover_ui_at_pointer(|ui| task_tooltip(ui, task));
                }
            }
        }

        if let Some(x) = chart.today_x() {
            draw_today_line(&painter, chart, grid_x + x as f32, origin.y, bottom);
        }
    });

    interaction
}

fn bar_rect_at(geometry: BarGeometry, grid_x: f32, y: f32) -> Rect {
    let inset = theme::BAR_INSET;
    Rect::from_min_size(
        Pos2::new(grid_x + geometry.offset as f32, y + inset),
        Vec2::new(geometry.width as f32, ROW_HEIGHT - inset * 2.0),
    )
}

fn task_tooltip(ui: &mut Ui, task: &Task) {
    ui.strong(&task.title);
    ui.label(format!("Исполнитель: {}", task.assignee_label()));
    ui.label(format!("Статус: {}", task.status.as_deref().unwrap_or(theme::status_label(task.status_class()))));
    let deadline = task
        .deadline()
        .valid()
        .map(date::format)
        .unwrap_or_else(|| "Не указан".to_string());
    ui.label(format!("Дедлайн: {deadline}"));
}

/// Weekend shading and today highlight, full height.
fn draw_columns(painter: &egui::Painter, chart: &GanttChart, grid_x: f32, top: f32, bottom: f32) {
    let cw = chart.cell_width as f32;
    for (i, cell) in chart.cells.iter().enumerate() {
        let x = grid_x + i as f32 * cw;
        let column = Rect::from_min_max(Pos2::new(x, top), Pos2::new(x + cw, bottom));
        if cell.is_today {
            painter.rect_filled(column, 0.0, theme::BG_TODAY);
        } else if cell.is_weekend {
            painter.rect_filled(column, 0.0, theme::BG_WEEKEND);
        }
        painter.line_segment(
            [Pos2::new(x, top + HEADER_HEIGHT), Pos2::new(x, bottom)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
}

fn draw_rows(painter: &egui::Painter, chart: &GanttChart, origin: Pos2, width: f32) {
    for i in 0..chart.rows.len() {
        let y = origin.y + HEADER_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_PADDING);
        painter.line_segment(
            [
                Pos2::new(origin.x, y + ROW_HEIGHT + ROW_PADDING),
                Pos2::new(origin.x + width, y + ROW_HEIGHT + ROW_PADDING),
            ],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }
}

fn draw_timeline_header(painter: &egui::Painter, chart: &GanttChart, origin: Pos2, width: f32) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let cw = chart.cell_width as f32;
    let grid_x = origin.x + LABEL_WIDTH;
    for (i, cell) in chart.cells.iter().enumerate() {
        let center_x = grid_x + i as f32 * cw + cw / 2.0;
        let color = if cell.is_today {
            theme::ACCENT
        } else if cell.is_weekend {
            theme::TEXT_DIM
        } else {
            theme::TEXT_PRIMARY
        };

        match (chart.range.granularity, cell.sublabel) {
            (Granularity::Day, Some(weekday)) => {
                painter.text(
                    Pos2::new(center_x, origin.y + 15.0),
                    egui::Align2::CENTER_CENTER,
                    &cell.label,
                    theme::font_header(),
                    color,
                );
                painter.text(
                    Pos2::new(center_x, origin.y + 31.0),
                    egui::Align2::CENTER_CENTER,
                    weekday,
                    theme::font_small(),
                    theme::TEXT_SECONDARY,
                );
            }
            _ => {
                painter.text(
                    Pos2::new(center_x, origin.y + HEADER_HEIGHT / 2.0),
                    egui::Align2::CENTER_CENTER,
                    &cell.label,
                    theme::font_sub(),
                    color,
                );
            }
        }
    }
}

fn draw_label_column(painter: &egui::Painter, chart: &GanttChart, origin: Pos2, bottom: f32) {
    let column = Rect::from_min_max(origin, Pos2::new(origin.x + LABEL_WIDTH, bottom));
    painter.rect_filled(column, 0.0, theme::BG_PANEL);
    painter.line_segment(
        [Pos2::new(column.right(), origin.y), Pos2::new(column.right(), bottom)],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
    painter.text(
        Pos2::new(origin.x + 10.0, origin.y + HEADER_HEIGHT / 2.0),
        egui::Align2::LEFT_CENTER,
        "Задача",
        theme::font_header(),
        theme::TEXT_SECONDARY,
    );

    let clipped = painter.with_clip_rect(column.shrink2(Vec2::new(6.0, 0.0)));
    for (i, row) in chart.rows.iter().enumerate() {
        let y = origin.y + HEADER_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_PADDING) + ROW_PADDING;
        clipped.text(
            Pos2::new(origin.x + 10.0, y + 10.0),
            egui::Align2::LEFT_CENTER,
            &row.title,
            theme::font_bar(),
            theme::TEXT_PRIMARY,
        );
        clipped.text(
            Pos2::new(origin.x + 10.0, y + 23.0),
            egui::Align2::LEFT_CENTER,
            &row.assignee,
            theme::font_small(),
            theme::TEXT_DIM,
        );
    }
}

fn draw_today_line(painter: &egui::Painter, chart: &GanttChart, x: f32, top: f32, bottom: f32) {
    let x = x + chart.cell_width as f32 / 2.0;
    painter.line_segment(
        [Pos2::new(x, top + HEADER_HEIGHT), Pos2::new(x, bottom)],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
}

fn draw_task_bar(painter: &egui::Painter, bar_rect: Rect, title: &str, color: Color32, active: bool) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    // Soft shadow
    painter.rect_filled(bar_rect.translate(Vec2::new(1.0, 2.0)), rounding, Color32::from_black_alpha(35));

    let fill = if active { color.gamma_multiply(0.8) } else { color };
    painter.rect_filled(bar_rect, rounding, fill);
    let highlight_rect = Rect::from_min_size(
        bar_rect.min,
        Vec2::new(bar_rect.width(), (bar_rect.height() * 0.45).max(4.0)),
    );
    painter.rect_filled(
        highlight_rect,
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    if active {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
        draw_handles(painter, bar_rect);
    }

    // Title on bar (single line, clipped to bar bounds)
    if bar_rect.width() > 30.0 {
        let galley = painter.layout_no_wrap(title.to_string(), theme::font_bar(), theme::TEXT_ON_BAR);
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        painter
            .with_clip_rect(bar_rect)
            .galley(Pos2::new(bar_rect.left() + 6.0, text_y), galley, Color32::TRANSPARENT);
    }
}

fn draw_handles(painter: &egui::Painter, bar_rect: Rect) {
    let handle_h = bar_rect.height() * 0.55;
    let handle_y = bar_rect.center().y - handle_h / 2.0;
    let lh = Rect::from_min_size(Pos2::new(bar_rect.left() + 1.5, handle_y), Vec2::new(3.0, handle_h));
    let rh = Rect::from_min_size(Pos2::new(bar_rect.right() - 4.5, handle_y), Vec2::new(3.0, handle_h));
    painter.rect_filled(lh, Rounding::same(1.5), theme::HANDLE_COLOR);
    painter.rect_filled(rh, Rounding::same(1.5), theme::HANDLE_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RangeSource, RenderContext, ZoomLevel};
    use chrono::NaiveDate;

    fn chart_for(tasks: &[Task]) -> GanttChart {
        let ctx = RenderContext::new(
            ZoomLevel::Week,
            RangeSource::Tasks,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        );
        match crate::model::layout::render(tasks, &ctx) {
            GanttLayout::Chart(chart) => chart,
            GanttLayout::Placeholder(msg) => panic!("unexpected placeholder: {msg}"),
        }
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
    fn sync_keeps_active_sessions_and_drops_removed_rows() {
        let mut state = ChartState::default();
        let chart = chart_for(&[task("a", "01.01.2024", "02.01.2024"), task("b", "03.01.2024", "04.01.2024")]);
        state.sync(&chart);
        assert_eq!(state.controllers.len(), 2);

        let a = state.controllers.get_mut("a").unwrap();
        a.handle(PointerEvent::Press { x: 110, zone: HitZone::Body });
        a.handle(PointerEvent::Move { x: 145 });
        let live = a.geometry();
        assert!(state.is_interacting());

        // a reload that drops "b" and moves "a" must not disturb the drag
        let chart = chart_for(&[task("a", "05.01.2024", "06.01.2024")]);
        state.sync(&chart);
        assert!(!state.controllers.contains_key("b"));
        assert_eq!(state.controllers["a"].geometry(), live);
    }
}
