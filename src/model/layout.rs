use chrono::NaiveDate;

use super::geometry::{self, BarGeometry};
use super::task::{StatusClass, Task};
use super::timeline::{TimelineCell, TimelineRange, ZoomLevel};

pub const NO_TASKS_MESSAGE: &str = "Нет задач для отображения";
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Недостаточно данных для диаграммы";

/// Where the visible range comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeSource {
    /// Padded min/max of the task anchors.
    #[default]
    Tasks,
    /// Fixed project bounds supplied by the caller.
    Project { start: NaiveDate, end: NaiveDate },
}

/// Everything a render pass reads besides the tasks themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    pub zoom: ZoomLevel,
    pub range: RangeSource,
    pub today: NaiveDate,
}

impl RenderContext {
    pub fn new(zoom: ZoomLevel, range: RangeSource, today: NaiveDate) -> Self {
        Self { zoom, range, today }
    }

    pub fn cell_width(&self) -> i32 {
        self.zoom.cell_width()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GanttBar {
    pub task_id: String,
    pub geometry: BarGeometry,
    pub status: StatusClass,
}

/// A label cell plus the bar for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GanttRow {
    pub title: String,
    pub assignee: String,
    pub bar: GanttBar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GanttChart {
    pub range: TimelineRange,
    pub origin: NaiveDate,
    pub cell_width: i32,
    pub cells: Vec<TimelineCell>,
    pub rows: Vec<GanttRow>,
}

impl GanttChart {
    pub fn total_width(&self) -> i32 {
        self.cells.len() as i32 * self.cell_width
    }

    /// Pixel position of the today cell, if it is on screen.
    pub fn today_x(&self) -> Option<i32> {
        self.cells
            .iter()
            .position(|c| c.is_today)
            .map(|i| i as i32 * self.cell_width)
    }

    pub fn row(&self, task_id: &str) -> Option<&GanttRow> {
        self.rows.iter().find(|r| r.bar.task_id == task_id)
    }
}

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GanttLayout {
    Placeholder(&'static str),
    Chart(GanttChart),
}

/// Lay out the chart for `tasks`, preserving input order.
///
/// Tasks without both a resolvable start and end are left out.
pub fn render(tasks: &[Task], ctx: &RenderContext) -> GanttLayout {
    if tasks.is_empty() {
        return GanttLayout::Placeholder(NO_TASKS_MESSAGE);
    }

    let granularity = ctx.zoom.granularity();
    let anchors: Vec<_> = tasks
        .iter()
        .map(|t| (t.resolved_start(), t.resolved_end()))
        .collect();

    let range = match ctx.range {
        RangeSource::Project { start, end } => Ok(TimelineRange::from_bounds(start, end, granularity)),
        RangeSource::Tasks => TimelineRange::from_anchors(anchors.iter().copied(), granularity),
    }
    // Every drawn bar must lie inside the range, whatever the bounds or an
    // inverted task say.
    .map(|range| {
        anchors.iter().fold(range, |range, anchors| match *anchors {
            (Some(start), Some(end)) => range.covering(start).covering(end),
            _ => range,
        })
    })
    .and_then(TimelineRange::within_limit);

    let range = match range {
        Ok(range) => range,
        Err(err) => {
            tracing::debug!(%err, tasks = tasks.len(), "gantt placeholder");
            return GanttLayout::Placeholder(INSUFFICIENT_DATA_MESSAGE);
        }
    };

    let origin = range.origin();
    let cell_width = ctx.cell_width();
    let rows = tasks
        .iter()
        .zip(anchors)
        .filter_map(|(task, anchors)| match anchors {
            (Some(start), Some(end)) => Some(GanttRow {
                title: task.title.clone(),
                assignee: task.assignee_label().to_string(),
                bar: GanttBar {
                    task_id: task.id.clone(),
                    geometry: geometry::to_geometry(start, end, origin, cell_width, granularity),
                    status: task.status_class(),
                },
            }),
            _ => {
                tracing::trace!(task = %task.id, "skipping task without anchors");
                None
            }
        })
        .collect();

    GanttLayout::Chart(GanttChart {
        range,
        origin,
        cell_width,
        cells: range.cells(ctx.today),
        rows,
    })
}
