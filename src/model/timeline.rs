use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days subtracted from the earliest task start when the range comes from task data.
pub const LOOKBACK_DAYS: u64 = 3;
/// Days added to the latest deadline when the range comes from task data.
pub const LOOKAHEAD_DAYS: u64 = 7;
/// Upper bound on the number of cells in one range. A mistyped year would
/// otherwise produce millions of columns.
pub const MAX_CELLS: i64 = 7500;

const WEEKDAY_SHORT: [&str; 7] = ["Вс", "Пн", "Вт", "Ср", "Чт", "Пт", "Сб"];
const MONTH_SHORT: [&str; 12] = [
    "янв.", "февр.", "март", "апр.", "май", "июнь", "июль", "авг.", "сент.", "окт.", "нояб.", "дек.",
];

/// What a single timeline cell represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Month,
}

/// Named zoom presets. Each one fixes both cell width and granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomLevel {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl ZoomLevel {
    pub const ALL: [ZoomLevel; 4] = [ZoomLevel::Day, ZoomLevel::Week, ZoomLevel::Month, ZoomLevel::Year];

    /// Pixels per timeline cell.
    pub fn cell_width(self) -> i32 {
        match self {
            ZoomLevel::Day => 40,
            ZoomLevel::Week => 35,
            ZoomLevel::Month => 20,
            ZoomLevel::Year => 60,
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            ZoomLevel::Year => Granularity::Month,
            _ => Granularity::Day,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ZoomLevel::Day => "День",
            ZoomLevel::Week => "Неделя",
            ZoomLevel::Month => "Месяц",
            ZoomLevel::Year => "Год",
        }
    }

    /// Next finer preset (saturates at `Day`).
    pub fn zoom_in(self) -> Self {
        match self {
            ZoomLevel::Year => ZoomLevel::Month,
            ZoomLevel::Month => ZoomLevel::Week,
            _ => ZoomLevel::Day,
        }
    }

    /// Next coarser preset (saturates at `Year`).
    pub fn zoom_out(self) -> Self {
        match self {
            ZoomLevel::Day => ZoomLevel::Week,
            ZoomLevel::Week => ZoomLevel::Month,
            _ => ZoomLevel::Year,
        }
    }
}

impl FromStr for ZoomLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(ZoomLevel::Day),
            "week" => Ok(ZoomLevel::Week),
            "month" => Ok(ZoomLevel::Month),
            "year" => Ok(ZoomLevel::Year),
            other => Err(format!("unknown zoom level '{other}'")),
        }
    }
}

/// Raised when no task supplies a usable start or end anchor, or when the
/// anchors span more than [`MAX_CELLS`] or leave the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not enough dated tasks to build a timeline")]
pub struct InsufficientData;

/// The visible date range of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

impl TimelineRange {
    /// Derive the range from task anchors: earliest start minus the lookback,
    /// latest end plus the lookahead. Starts and ends are taken independently,
    /// so inverted tasks can swap them; the result always has `start <= end`.
    pub fn from_anchors<I>(anchors: I, granularity: Granularity) -> Result<Self, InsufficientData>
    where
        I: IntoIterator<Item = (Option<NaiveDate>, Option<NaiveDate>)>,
    {
        let mut min: Option<NaiveDate> = None;
        let mut max: Option<NaiveDate> = None;
        for (start, end) in anchors {
            if let Some(s) = start {
                min = Some(min.map_or(s, |m| m.min(s)));
            }
            if let Some(e) = end {
                max = Some(max.map_or(e, |m| m.max(e)));
            }
        }

        let (Some(min), Some(max)) = (min, max) else {
            return Err(InsufficientData);
        };
        let (lo, hi) = (min.min(max), min.max(max));
        Self {
            start: lo.checked_sub_days(Days::new(LOOKBACK_DAYS)).ok_or(InsufficientData)?,
            end: hi.checked_add_days(Days::new(LOOKAHEAD_DAYS)).ok_or(InsufficientData)?,
            granularity,
        }
        .within_limit()
    }

    /// Use externally supplied project bounds as-is.
    pub fn from_bounds(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            granularity,
        }
    }

    /// Grow the range so that `date` falls inside it.
    pub fn covering(self, date: NaiveDate) -> Self {
        Self {
            start: self.start.min(date),
            end: self.end.max(date),
            ..self
        }
    }

    /// Number of cells this range produces.
    pub fn cell_count(&self) -> i64 {
        match self.granularity {
            Granularity::Day => (self.end - self.start).num_days() + 1,
            Granularity::Month => month_index(self.end) - month_index(self.start) + 1,
        }
    }

    /// Reject ranges too wide to draw.
    pub fn within_limit(self) -> Result<Self, InsufficientData> {
        if self.cell_count() > MAX_CELLS {
            tracing::debug!(start = %self.start, end = %self.end, "timeline range too wide");
            return Err(InsufficientData);
        }
        Ok(self)
    }

    /// Date that sits at pixel zero. For month timelines this is the first of the start month.
    pub fn origin(&self) -> NaiveDate {
        match self.granularity {
            Granularity::Day => self.start,
            Granularity::Month => first_of_month(self.start),
        }
    }

    /// Build the ordered cell sequence for this range.
    pub fn cells(&self, today: NaiveDate) -> Vec<TimelineCell> {
        match self.granularity {
            Granularity::Day => day_cells(self.start, self.end, today),
            Granularity::Month => month_cells(self.start, self.end, today),
        }
    }
}

/// One column of the timeline header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineCell {
    pub date: NaiveDate,
    pub label: String,
    /// Short weekday name on day timelines.
    pub sublabel: Option<&'static str>,
    pub is_today: bool,
    pub is_weekend: bool,
}

fn day_cells(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Vec<TimelineCell> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let weekday = date.weekday().num_days_from_sunday() as usize;
            TimelineCell {
                date,
                label: date.day().to_string(),
                sublabel: Some(WEEKDAY_SHORT[weekday]),
                is_today: date == today,
                is_weekend: weekday == 0 || weekday == 6,
            }
        })
        .collect()
}

fn month_cells(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Vec<TimelineCell> {
    let first = month_index(start);
    let last = month_index(end);
    (first..=last)
        .filter_map(month_start)
        .map(|date| TimelineCell {
            date,
            label: MONTH_SHORT[date.month0() as usize].to_string(),
            sublabel: None,
            is_today: date.year() == today.year() && date.month() == today.month(),
            is_weekend: false,
        })
        .collect()
}

// ── Month arithmetic ────────────────────────────────────────────────────────

/// Months since year 0, so that consecutive months differ by one.
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// First day of the month with the given index.
pub fn month_start(index: i64) -> Option<NaiveDate> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    NaiveDate::from_ymd_opt(year, index.rem_euclid(12) as u32 + 1, 1)
}

/// Last day of the month with the given index.
pub fn month_end(index: i64) -> Option<NaiveDate> {
    month_start(index + 1)?.pred_opt()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
