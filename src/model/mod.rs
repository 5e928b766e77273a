pub mod date;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod task;
pub mod timeline;

pub use geometry::BarGeometry;
pub use interaction::{BarController, DateChange, HitZone, PointerEvent};
pub use layout::{GanttChart, GanttLayout, RangeSource, RenderContext};
pub use task::{StatusClass, Task, TaskDetail};
pub use timeline::{Granularity, ZoomLevel};
