//! Rolling time and counter windows.
//!
//! Every window is a [`PeriodWindow`]: a bucket key plus the UTC instant
//! the key last changed. Calendar windows (year/month/week/day/hour) key
//! on a formatted calendar bucket in the host's time zone; counter windows
//! (session/game) key on a zero-padded monotonic count; the global window
//! keeps a sentinel key and never moves.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use emblem_types::{Period, PeriodWindow};

/// Sentinel key for the global window.
pub const GLOBAL_KEY: &str = "GLOBAL";

/// Fixed width of counter window keys.
const COUNTER_PAD: usize = 10;

/// Which calendar periods rolled over during one refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RolloverFlags {
    pub is_new_year: bool,
    pub is_new_month: bool,
    pub is_new_week: bool,
    pub is_new_day: bool,
    pub is_new_hour: bool,
}

impl RolloverFlags {
    pub fn any(&self) -> bool {
        self.is_new_year
            || self.is_new_month
            || self.is_new_week
            || self.is_new_day
            || self.is_new_hour
    }

    fn set(&mut self, period: Period) {
        match period {
            Period::Year => self.is_new_year = true,
            Period::Month => self.is_new_month = true,
            Period::Week => self.is_new_week = true,
            Period::Day => self.is_new_day = true,
            Period::Hour => self.is_new_hour = true,
            Period::Global | Period::Session | Period::Game => {}
        }
    }
}

/// Format the calendar bucket key for a period at a zoned instant.
///
/// Key formats are fixed for interoperability with persisted state:
/// year `2022`, month `2022-07`, day `2022-07-16`, hour `2022-07-16-H08`,
/// week `2022-W28` (ISO week-based year and week number).
///
/// Returns `None` for non-calendar periods.
pub fn calendar_key(period: Period, at: DateTime<FixedOffset>) -> Option<String> {
    let key = match period {
        Period::Year => at.format("%Y").to_string(),
        Period::Month => at.format("%Y-%m").to_string(),
        Period::Day => at.format("%Y-%m-%d").to_string(),
        Period::Hour => at.format("%Y-%m-%d-H%H").to_string(),
        Period::Week => {
            let week = at.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        Period::Global | Period::Session | Period::Game => return None,
    };
    Some(key)
}

/// ISO weekday: Monday = 1 .. Sunday = 7.
pub fn iso_weekday(at: DateTime<FixedOffset>) -> u32 {
    at.weekday().number_from_monday()
}

fn initial_window(period: Period) -> PeriodWindow {
    let epoch = DateTime::UNIX_EPOCH;
    let key = match period {
        Period::Global => GLOBAL_KEY.to_string(),
        Period::Session | Period::Game => format!("{:0COUNTER_PAD$}", 0),
        calendar => calendar_key(calendar, epoch.fixed_offset())
            .unwrap_or_else(|| GLOBAL_KEY.to_string()),
    };
    PeriodWindow {
        key,
        last_timestamp: epoch,
    }
}

/// Create every missing window with its epoch-initial key. Idempotent:
/// existing windows are never overwritten.
pub fn ensure_initialized(periods: &mut BTreeMap<Period, PeriodWindow>) {
    for period in [
        Period::Global,
        Period::Session,
        Period::Game,
        Period::Hour,
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Year,
    ] {
        periods
            .entry(period)
            .or_insert_with(|| initial_window(period));
    }
}

/// Recompute calendar keys at `now_local` and roll over every window whose
/// key changed, stamping it with `now_utc`. Missing windows are
/// auto-initialized first (and then roll, since the epoch key differs).
pub fn refresh(
    periods: &mut BTreeMap<Period, PeriodWindow>,
    now_local: DateTime<FixedOffset>,
    now_utc: DateTime<Utc>,
) -> RolloverFlags {
    let mut flags = RolloverFlags::default();

    for period in Period::CALENDAR {
        let Some(key) = calendar_key(period, now_local) else {
            continue;
        };
        let window = periods
            .entry(period)
            .or_insert_with(|| initial_window(period));
        if window.key != key {
            window.key = key;
            window.last_timestamp = now_utc;
            flags.set(period);
        }
    }

    flags
}

/// Advance a counter window (session/game): increment its numeric key,
/// stamp it with `now_utc`, and return the new count.
///
/// A malformed persisted key restarts the count from zero.
pub fn advance_counter(
    periods: &mut BTreeMap<Period, PeriodWindow>,
    period: Period,
    now_utc: DateTime<Utc>,
) -> i64 {
    debug_assert!(period.is_counter());

    let window = periods
        .entry(period)
        .or_insert_with(|| initial_window(period));
    let count = window.key.trim().parse::<i64>().unwrap_or_else(|_| {
        tracing::warn!(period = ?period, key = %window.key, "malformed counter key, restarting at zero");
        0
    }) + 1;
    window.key = format!("{count:0COUNTER_PAD$}");
    window.last_timestamp = now_utc;
    count
}
