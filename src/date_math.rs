//! Date arithmetic used by the layout engine.
//!
//! All engine dates are local `NaiveDateTime` values. Differences are floored
//! to whole units, months are a nominal 30 days and years 360 days when
//! measuring distances; adding months or years is calendar aware.

use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Units understood by [`DateMath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl DateUnit {
    fn nominal_seconds(self) -> i64 {
        match self {
            DateUnit::Second => 1,
            DateUnit::Minute => 60,
            DateUnit::Hour => 3_600,
            DateUnit::Day => 86_400,
            DateUnit::Month => 86_400 * 30,
            DateUnit::Year => 86_400 * 360,
        }
    }
}

/// Formats accepted by [`DateMath::parse`], tried in order.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d",
];

/// Date arithmetic contract consumed by the engine.
///
/// Only [`DateMath::now`] is required; everything else is pure calendar math
/// over `chrono`.
pub trait DateMath {
    /// Current local date-time.
    fn now(&self) -> NaiveDateTime;

    /// Midnight of the current day.
    fn today(&self) -> NaiveDateTime {
        self.start_of(self.now(), DateUnit::Day)
    }

    /// `floor((a - b) / unit)`.
    fn diff(&self, a: NaiveDateTime, b: NaiveDateTime, unit: DateUnit) -> i64 {
        let millis = (a - b).num_milliseconds();
        millis.div_euclid(unit.nominal_seconds() * 1_000)
    }

    fn add(&self, date: NaiveDateTime, amount: i64, unit: DateUnit) -> NaiveDateTime {
        match unit {
            DateUnit::Month => add_months(date, amount),
            DateUnit::Year => add_months(date, amount.saturating_mul(12)),
            _ => date + Duration::seconds(amount.saturating_mul(unit.nominal_seconds())),
        }
    }

    /// Adds a fractional number of hours, rounded to the millisecond.
    fn add_hours(&self, date: NaiveDateTime, hours: f64) -> NaiveDateTime {
        let millis = (hours * 3_600_000.0).round() as i64;
        date + Duration::milliseconds(millis)
    }

    fn start_of(&self, date: NaiveDateTime, unit: DateUnit) -> NaiveDateTime {
        let day = date.date();
        let time = match unit {
            DateUnit::Second => NaiveTime::from_hms_opt(date.hour(), date.minute(), date.second()),
            DateUnit::Minute => NaiveTime::from_hms_opt(date.hour(), date.minute(), 0),
            DateUnit::Hour => NaiveTime::from_hms_opt(date.hour(), 0, 0),
            DateUnit::Day => Some(NaiveTime::MIN),
            DateUnit::Month => {
                return day.with_day(1).unwrap_or(day).and_time(NaiveTime::MIN);
            }
            DateUnit::Year => {
                return NaiveDate::from_ymd_opt(day.year(), 1, 1)
                    .unwrap_or(day)
                    .and_time(NaiveTime::MIN);
            }
        };
        day.and_time(time.unwrap_or(NaiveTime::MIN))
    }

    fn days_in_month(&self, date: NaiveDateTime) -> u32 {
        let first = self.start_of(date, DateUnit::Month);
        let next = add_months(first, 1);
        (next - first).num_days() as u32
    }

    /// Parses a date or date-time string. Date-only inputs resolve to midnight.
    fn parse(&self, input: &str) -> Option<NaiveDateTime> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        for fmt in DATE_TIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt);
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Some(d.and_time(NaiveTime::MIN));
            }
        }
        None
    }

    /// Formats with a `chrono` strftime pattern.
    fn format(&self, date: NaiveDateTime, pattern: &str) -> String {
        date.format(pattern).to_string()
    }
}

fn add_months(date: NaiveDateTime, amount: i64) -> NaiveDateTime {
    let months = Months::new(amount.unsigned_abs().min(u32::MAX as u64) as u32);
    let shifted = if amount >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    };
    shifted.unwrap_or(date)
}

/// Reads the local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDateMath;

impl DateMath for SystemDateMath {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Pins "now" to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedDateMath {
    now: NaiveDateTime,
}

impl FixedDateMath {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    pub fn set_now(&mut self, now: NaiveDateTime) {
        self.now = now;
    }
}

impl DateMath for FixedDateMath {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        SystemDateMath.parse(s).expect("valid date")
    }

    #[test]
    fn diff_floors_towards_negative_infinity() {
        let dm = SystemDateMath;
        assert_eq!(dm.diff(dt("2024-01-03"), dt("2024-01-01"), DateUnit::Hour), 48);
        assert_eq!(dm.diff(dt("2024-01-01"), dt("2024-01-03"), DateUnit::Day), -2);
        assert_eq!(
            dm.diff(dt("2024-01-01 00:30:00"), dt("2024-01-01"), DateUnit::Hour),
            0
        );
        assert_eq!(
            dm.diff(dt("2023-12-31 23:30:00"), dt("2024-01-01"), DateUnit::Hour),
            -1
        );
    }

    #[test]
    fn add_months_is_calendar_aware() {
        let dm = SystemDateMath;
        assert_eq!(dm.add(dt("2024-01-31"), 1, DateUnit::Month), dt("2024-02-29"));
        assert_eq!(dm.add(dt("2024-03-15"), -13, DateUnit::Month), dt("2023-02-15"));
        assert_eq!(dm.add(dt("2024-03-15"), 2, DateUnit::Day), dt("2024-03-17"));
    }

    #[test]
    fn start_of_truncates() {
        let dm = SystemDateMath;
        let d = dt("2024-05-24 13:45:12");
        assert_eq!(dm.start_of(d, DateUnit::Hour), dt("2024-05-24 13:00:00"));
        assert_eq!(dm.start_of(d, DateUnit::Day), dt("2024-05-24"));
        assert_eq!(dm.start_of(d, DateUnit::Month), dt("2024-05-01"));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        let dm = SystemDateMath;
        assert_eq!(dm.days_in_month(dt("2024-02-10")), 29);
        assert_eq!(dm.days_in_month(dt("2023-02-10")), 28);
        assert_eq!(dm.days_in_month(dt("2023-12-01")), 31);
    }

    #[test]
    fn parse_accepts_dates_and_date_times() {
        let dm = SystemDateMath;
        assert_eq!(dm.parse("24/05/2024"), Some(dt("2024-05-24")));
        assert_eq!(dm.parse("2024-05-24T08:30"), Some(dt("2024-05-24 08:30:00")));
        assert_eq!(dm.parse("not a date"), None);
        assert_eq!(dm.parse("   "), None);
    }

    #[test]
    fn fixed_clock_drives_today() {
        let dm = FixedDateMath::new(dt("2024-02-10 17:20:00"));
        assert_eq!(dm.today(), dt("2024-02-10"));
    }
}
