use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::{self, ParsedDate};

pub const STATUS_ACTIVE: &str = "активна";
pub const STATUS_COMPLETED: &str = "завершена";
pub const STATUS_PAUSED: &str = "отложена";

/// Shown wherever a task has no assignee.
pub const UNASSIGNED: &str = "Не назначен";

/// Closed display classification of the free-text status the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Active,
    Completed,
    Paused,
}

impl StatusClass {
    pub const ALL: [StatusClass; 3] = [StatusClass::Active, StatusClass::Completed, StatusClass::Paused];

    /// Unknown or missing statuses degrade to `Active`.
    pub fn classify(status: Option<&str>) -> Self {
        match status.map(str::trim) {
            Some(STATUS_COMPLETED) => StatusClass::Completed,
            Some(STATUS_PAUSED) => StatusClass::Paused,
            _ => StatusClass::Active,
        }
    }

    /// The literal the server stores for this status.
    pub fn wire_value(self) -> &'static str {
        match self {
            StatusClass::Active => STATUS_ACTIVE,
            StatusClass::Completed => STATUS_COMPLETED,
            StatusClass::Paused => STATUS_PAUSED,
        }
    }
}

/// A task as returned by `GET /api/project/{id}/tasks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub assignee_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Task {
    pub fn status_class(&self) -> StatusClass {
        StatusClass::classify(self.status.as_deref())
    }

    pub fn start(&self) -> ParsedDate {
        date::parse(self.start_date.as_deref())
    }

    pub fn deadline(&self) -> ParsedDate {
        date::parse(self.deadline.as_deref())
    }

    /// Left anchor of the bar: the start date, or the creation date when unset.
    pub fn resolved_start(&self) -> Option<NaiveDate> {
        self.start()
            .valid()
            .or_else(|| date::parse(self.created_at.as_deref()).valid())
    }

    /// Right anchor of the bar.
    pub fn resolved_end(&self) -> Option<NaiveDate> {
        self.deadline().valid()
    }

    pub fn assignee_label(&self) -> &str {
        self.assignee_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNASSIGNED)
    }

    /// Rewrite both schedule fields in the server's `DD.MM.YYYY` form.
    pub fn reschedule(&mut self, start: NaiveDate, end: NaiveDate) {
        self.start_date = Some(date::format(start));
        self.deadline = Some(date::format(end));
    }

    /// Case-insensitive match over title and description.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// One entry of a task's change log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub path: String,
}

/// A progress report submitted by the assignee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub executor_name: Option<String>,
    #[serde(default)]
    pub file_info: Option<FileInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Full task detail from `GET /api/task/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub team_users: Vec<TeamUser>,
}

/// Form body of `POST /task/{id}/update`. Dates are `DD.MM.YYYY` or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    pub title: String,
    pub description: String,
    pub assignee_id: String,
    pub status: String,
    pub start_date: String,
    pub deadline: String,
}

/// JSON body of the date update sent after a drag or resize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateUpdate {
    pub task_id: String,
    pub start_date: String,
    pub deadline: String,
}

impl DateUpdate {
    pub fn new(task_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            task_id: task_id.into(),
            start_date: date::format(start),
            deadline: date::format(end),
        }
    }
}

/// Reply shape shared by the update endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub task: Option<Task>,
}
