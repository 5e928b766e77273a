//! Drag-to-move and edge-drag-to-resize for a single Gantt bar.
//!
//! The controller is driven by plain press/move/release events so it can be
//! fed from any toolkit. It never talks to the network itself: a release
//! yields a [`DateChange`] and the caller decides what to do with it.

use chrono::NaiveDate;

use super::geometry::{self, BarGeometry};
use super::timeline::Granularity;

/// Which edge a resize grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// Where on the bar a press landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    Body,
    Edge(Edge),
}

impl HitZone {
    /// Classify a press at `local_x` pixels from the bar's left edge.
    ///
    /// The edge hot zones are `handle` pixels wide. A bar too narrow to hold
    /// two zones plus some body is split in half between the edges.
    pub fn classify(local_x: f32, width: f32, handle: f32) -> Self {
        let handle = handle.min(width / 3.0);
        if local_x <= handle {
            HitZone::Edge(Edge::Left)
        } else if local_x >= width - handle {
            HitZone::Edge(Edge::Right)
        } else {
            HitZone::Body
        }
    }
}

/// Pointer input, in chart-space pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press { x: i32, zone: HitZone },
    Move { x: i32 },
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging {
        start_x: i32,
        start_offset: i32,
    },
    Resizing {
        edge: Edge,
        start_x: i32,
        start_offset: i32,
        start_width: i32,
    },
}

/// Date pair produced when a drag or resize session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateChange {
    pub task_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
}

impl DateChange {
    /// True when the session ended on the cells it started from.
    pub fn is_noop(&self) -> bool {
        self.start == self.previous_start && self.end == self.previous_end
    }
}

/// Per-bar interaction state. Each bar owns one; nothing is shared between bars.
#[derive(Debug, Clone)]
pub struct BarController {
    task_id: String,
    geometry: BarGeometry,
    initial: BarGeometry,
    origin: NaiveDate,
    cell_width: i32,
    granularity: Granularity,
    state: DragState,
}

impl BarController {
    pub fn new(
        task_id: impl Into<String>,
        geometry: BarGeometry,
        origin: NaiveDate,
        cell_width: i32,
        granularity: Granularity,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            geometry,
            initial: geometry,
            origin,
            cell_width: cell_width.max(1),
            granularity,
            state: DragState::Idle,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Live geometry, including any in-progress drag.
    pub fn geometry(&self) -> BarGeometry {
        self.geometry
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Feed one pointer event. Returns the resulting dates on release of an
    /// active session; every other event returns `None`.
    pub fn handle(&mut self, event: PointerEvent) -> Option<DateChange> {
        match (self.state, event) {
            (DragState::Idle, PointerEvent::Press { x, zone }) => {
                self.initial = self.geometry;
                self.state = match zone {
                    HitZone::Body => DragState::Dragging {
                        start_x: x,
                        start_offset: self.geometry.offset,
                    },
                    HitZone::Edge(edge) => DragState::Resizing {
                        edge,
                        start_x: x,
                        start_offset: self.geometry.offset,
                        start_width: self.geometry.width,
                    },
                };
                None
            }
            (DragState::Dragging { start_x, start_offset }, PointerEvent::Move { x }) => {
                let candidate = geometry::snap(start_offset + (x - start_x), self.cell_width);
                self.geometry.offset = candidate.max(0);
                None
            }
            (
                DragState::Resizing {
                    edge,
                    start_x,
                    start_offset,
                    start_width,
                },
                PointerEvent::Move { x },
            ) => {
                self.resize(edge, x - start_x, start_offset, start_width);
                None
            }
            (DragState::Idle, _) => None,
            (_, PointerEvent::Release) => {
                self.state = DragState::Idle;
                Some(self.commit())
            }
            // A second press while a session is active is ignored.
            (_, PointerEvent::Press { .. }) => None,
        }
    }

    fn resize(&mut self, edge: Edge, delta: i32, start_offset: i32, start_width: i32) {
        match edge {
            Edge::Left => {
                let left = geometry::snap(start_offset + delta, self.cell_width);
                let width = start_width - (left - start_offset);
                if width < self.cell_width || left < 0 {
                    return;
                }
                self.geometry = BarGeometry { offset: left, width };
            }
            Edge::Right => {
                let width = geometry::snap(start_width + delta, self.cell_width);
                if width < self.cell_width {
                    return;
                }
                self.geometry.width = width;
            }
        }
    }

    fn commit(&self) -> DateChange {
        let (start, end) = geometry::to_dates(self.geometry, self.origin, self.cell_width, self.granularity);
        let (previous_start, previous_end) =
            geometry::to_dates(self.initial, self.origin, self.cell_width, self.granularity);
        DateChange {
            task_id: self.task_id.clone(),
            start,
            end,
            previous_start,
            previous_end,
        }
    }
}
