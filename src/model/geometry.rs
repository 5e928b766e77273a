use chrono::{Days, NaiveDate};

use super::timeline::{month_end, month_index, month_start, Granularity};

/// Horizontal placement of a bar, in whole pixels relative to the timeline origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarGeometry {
    pub offset: i32,
    pub width: i32,
}

/// Whole timeline units from `from` to `to` (negative when `to` is earlier).
pub fn units_between(from: NaiveDate, to: NaiveDate, granularity: Granularity) -> i64 {
    match granularity {
        Granularity::Day => (to - from).num_days(),
        Granularity::Month => month_index(to) - month_index(from),
    }
}

/// Round `px` to the nearest multiple of `cell_width`, halves rounding up.
pub fn snap(px: i32, cell_width: i32) -> i32 {
    let cw = cell_width.max(1) as i64;
    let px = px as i64;
    ((2 * px + cw).div_euclid(2 * cw) * cw) as i32
}

/// Place a task on the timeline.
///
/// A single-unit task covers exactly one cell; inverted or zero-length
/// intervals still get one cell.
pub fn to_geometry(
    start: NaiveDate,
    end: NaiveDate,
    origin: NaiveDate,
    cell_width: i32,
    granularity: Granularity,
) -> BarGeometry {
    let offset = units_between(origin, start, granularity) * cell_width as i64;
    let span = units_between(start, end, granularity) + 1;
    let width = (span * cell_width as i64).max(cell_width as i64);
    BarGeometry {
        offset: clamp_px(offset),
        width: clamp_px(width),
    }
}

/// Convert bar geometry back to a `(start, end)` date pair.
///
/// Offset and width are snapped first, so any pixel position maps to whole
/// cells. Month timelines yield first-of-month / last-of-month dates.
pub fn to_dates(
    geometry: BarGeometry,
    origin: NaiveDate,
    cell_width: i32,
    granularity: Granularity,
) -> (NaiveDate, NaiveDate) {
    let cw = cell_width.max(1);
    let start_units = (snap(geometry.offset, cw) / cw) as i64;
    let cells = (snap(geometry.width, cw) / cw).max(1) as i64;

    match granularity {
        Granularity::Day => {
            let start = shift_days(origin, start_units);
            (start, shift_days(start, cells - 1))
        }
        Granularity::Month => {
            let first = month_index(origin) + start_units;
            let start = month_start(first).unwrap_or(origin);
            let end = month_end(first + cells - 1).unwrap_or(start);
            (start, end)
        }
    }
}

/// Move `date` by `days`, saturating at the ends of the calendar.
fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let step = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(step).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(step).unwrap_or(NaiveDate::MIN)
    }
}

fn clamp_px(px: i64) -> i32 {
    px.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn snap_rounds_to_nearest_cell() {
        assert_eq!(snap(110, 35), 105);
        assert_eq!(snap(122, 35), 105);
        assert_eq!(snap(123, 35), 140);
        assert_eq!(snap(-10, 35), 0);
        assert_eq!(snap(-20, 35), -35);
        // exact half rounds up
        assert_eq!(snap(10, 20), 20);
        assert_eq!(snap(-10, 20), 0);
    }

    #[test]
    fn single_day_task_is_one_cell_wide() {
        let origin = ymd(2023, 12, 29);
        let g = to_geometry(ymd(2024, 1, 1), ymd(2024, 1, 1), origin, 35, Granularity::Day);
        assert_eq!(g.width, 35);
        assert_eq!(g.offset, 3 * 35);
    }

    #[test]
    fn inverted_interval_floors_at_one_cell() {
        for cw in [20, 35, 40, 60] {
            let g = to_geometry(ymd(2024, 3, 10), ymd(2024, 3, 1), ymd(2024, 3, 1), cw, Granularity::Day);
            assert_eq!(g.width, cw);
            let g = to_geometry(ymd(2024, 6, 1), ymd(2024, 1, 1), ymd(2024, 1, 1), cw, Granularity::Month);
            assert_eq!(g.width, cw);
        }
    }

    #[test]
    fn month_geometry_counts_calendar_months() {
        let g = to_geometry(ymd(2024, 2, 15), ymd(2024, 4, 2), ymd(2024, 1, 1), 60, Granularity::Month);
        assert_eq!(g, BarGeometry { offset: 60, width: 180 });
    }

    #[test]
    fn day_round_trip_on_cell_boundaries() {
        let origin = ymd(2024, 2, 20);
        for cw in [20, 35, 40] {
            for start_off in 0..40 {
                for len in 0..15 {
                    let s = origin + Duration::days(start_off);
                    let e = s + Duration::days(len);
                    let g = to_geometry(s, e, origin, cw, Granularity::Day);
                    assert_eq!(to_dates(g, origin, cw, Granularity::Day), (s, e));
                }
            }
        }
    }

    #[test]
    fn month_round_trip_on_month_boundaries() {
        let origin = ymd(2023, 10, 1);
        for start_off in 0..18 {
            for len in 0..6 {
                let idx = month_index(origin) + start_off;
                let s = month_start(idx).unwrap();
                let e = month_end(idx + len).unwrap();
                let g = to_geometry(s, e, origin, 60, Granularity::Month);
                assert_eq!(to_dates(g, origin, 60, Granularity::Month), (s, e));
            }
        }
    }

    #[test]
    fn to_dates_snaps_unaligned_pixels() {
        let origin = ymd(2024, 1, 1);
        let (s, e) = to_dates(BarGeometry { offset: 110, width: 80 }, origin, 35, Granularity::Day);
        assert_eq!(s, ymd(2024, 1, 4));
        assert_eq!(e, ymd(2024, 1, 5));
    }

    #[test]
    fn to_dates_saturates_at_calendar_edges() {
        let far = BarGeometry { offset: 35 * 10, width: 35 * 3 };
        assert_eq!(to_dates(far, NaiveDate::MAX, 35, Granularity::Day), (NaiveDate::MAX, NaiveDate::MAX));
        let before = BarGeometry { offset: -35 * 10, width: 35 };
        assert_eq!(to_dates(before, NaiveDate::MIN, 35, Granularity::Day), (NaiveDate::MIN, NaiveDate::MIN));
    }

    #[test]
    fn to_dates_never_produces_end_before_start() {
        let origin = ymd(2024, 1, 1);
        let (s, e) = to_dates(BarGeometry { offset: 0, width: 3 }, origin, 35, Granularity::Day);
        assert_eq!(s, e);
        let (s, e) = to_dates(BarGeometry { offset: 0, width: 0 }, origin, 60, Granularity::Month);
        assert_eq!(s.day(), 1);
        assert_eq!(e, ymd(2024, 1, 31));
    }
}
