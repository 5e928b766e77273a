pub mod gantt_chart;
pub mod notifications;
pub mod task_modal;
pub mod task_table;
pub mod theme;
pub mod toolbar;
