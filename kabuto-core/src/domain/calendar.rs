//! Japanese market calendar: weekends and national holidays are closed days.
//!
//! The holiday table is fixed by law and not configurable. Rules cover the
//! fixed-date holidays, the Happy Monday system, the equinox days (astronomical
//! approximation valid 1980..=2099), substitute holidays, citizen's holidays
//! sandwiched between two holidays, and the one-off dates of 2019-2021.

use crate::error::EntityError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

const SEARCH_MULTIPLIERS: [usize; 4] = [2, 4, 8, 16];

/// True when the market is open on `date`.
pub fn is_business_day(date: NaiveDate) -> bool {
    !is_weekend(date) && !is_holiday(date)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// True when `date` is a national holiday (including substitute and citizen's holidays).
pub fn is_holiday(date: NaiveDate) -> bool {
    holiday_name(date).is_some()
}

/// Name of the holiday falling on `date`, if any.
pub fn holiday_name(date: NaiveDate) -> Option<&'static str> {
    if let Some(name) = named_holiday(date) {
        return Some(name);
    }
    if is_substitute_holiday(date) {
        return Some("substitute holiday");
    }
    if is_citizens_holiday(date) {
        return Some("citizen's holiday");
    }
    None
}

/// `n` consecutive business days starting at `start` (inclusive when `start` is open).
pub fn business_days_from(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(n);
    let mut current = start;
    while days.len() < n {
        if is_business_day(current) {
            days.push(current);
        }
        current += Duration::days(1);
    }
    days
}

/// The `n` most recent business days up to and including `end`, newest first.
///
/// Candidates are drawn from `n * m` calendar days back for growing multipliers
/// `m`, so long holiday runs never cut the list short.
pub fn get_past_n_days(end: NaiveDate, n: usize) -> Result<Vec<NaiveDate>, EntityError> {
    for multiplier in SEARCH_MULTIPLIERS {
        let candidates: Vec<NaiveDate> = (0..n * multiplier)
            .map(|back| end - Duration::days(back as i64))
            .filter(|d| is_business_day(*d))
            .take(n)
            .collect();
        if candidates.len() == n {
            return Ok(candidates);
        }
    }
    Err(EntityError::CalendarExhausted { end, n })
}

// ─── Holiday rules ──────────────────────────────────────────────────

fn named_holiday(date: NaiveDate) -> Option<&'static str> {
    let (year, month, day) = (date.year(), date.month(), date.day());

    match (month, day) {
        (1, 1) => return Some("New Year's Day"),
        (2, 11) => return Some("National Foundation Day"),
        (4, 29) => return Some("Showa Day"),
        (5, 3) => return Some("Constitution Memorial Day"),
        (5, 5) => return Some("Children's Day"),
        (11, 3) => return Some("Culture Day"),
        (11, 23) => return Some("Labor Thanksgiving Day"),
        _ => {}
    }

    if year >= 2007 && (month, day) == (5, 4) {
        return Some("Greenery Day");
    }
    if year >= 2020 && (month, day) == (2, 23) {
        return Some("Emperor's Birthday");
    }
    if (1989..=2018).contains(&year) && (month, day) == (12, 23) {
        return Some("Emperor's Birthday");
    }

    if year == 2019 {
        match (month, day) {
            (5, 1) => return Some("Enthronement Day"),
            (10, 22) => return Some("Enthronement Ceremony Day"),
            _ => {}
        }
    }

    if month == 1 {
        let coming_of_age = if year >= 2000 {
            nth_weekday(year, 1, Weekday::Mon, 2)
        } else {
            NaiveDate::from_ymd_opt(year, 1, 15)
        };
        if coming_of_age == Some(date) {
            return Some("Coming of Age Day");
        }
    }

    if month == 3 && vernal_equinox_day(year) == Some(day) {
        return Some("Vernal Equinox Day");
    }
    if month == 9 && autumnal_equinox_day(year) == Some(day) {
        return Some("Autumnal Equinox Day");
    }

    if marine_day(year) == Some(date) {
        return Some("Marine Day");
    }
    if mountain_day(year) == Some(date) {
        return Some("Mountain Day");
    }
    if sports_day(year) == Some(date) {
        return Some("Sports Day");
    }
    if month == 9 {
        let respect_for_aged = if year >= 2003 {
            nth_weekday(year, 9, Weekday::Mon, 3)
        } else {
            NaiveDate::from_ymd_opt(year, 9, 15)
        };
        if respect_for_aged == Some(date) {
            return Some("Respect for the Aged Day");
        }
    }

    None
}

fn marine_day(year: i32) -> Option<NaiveDate> {
    match year {
        2020 => NaiveDate::from_ymd_opt(2020, 7, 23),
        2021 => NaiveDate::from_ymd_opt(2021, 7, 22),
        y if y >= 2003 => nth_weekday(y, 7, Weekday::Mon, 3),
        y if y >= 1996 => NaiveDate::from_ymd_opt(y, 7, 20),
        _ => None,
    }
}

fn mountain_day(year: i32) -> Option<NaiveDate> {
    match year {
        2020 => NaiveDate::from_ymd_opt(2020, 8, 10),
        2021 => NaiveDate::from_ymd_opt(2021, 8, 8),
        y if y >= 2016 => NaiveDate::from_ymd_opt(y, 8, 11),
        _ => None,
    }
}

fn sports_day(year: i32) -> Option<NaiveDate> {
    match year {
        2020 => NaiveDate::from_ymd_opt(2020, 7, 24),
        2021 => NaiveDate::from_ymd_opt(2021, 7, 23),
        y if y >= 2000 => nth_weekday(y, 10, Weekday::Mon, 2),
        y => NaiveDate::from_ymd_opt(y, 10, 10),
    }
}

fn vernal_equinox_day(year: i32) -> Option<u32> {
    equinox_day(year, 20.8431)
}

fn autumnal_equinox_day(year: i32) -> Option<u32> {
    equinox_day(year, 23.2488)
}

fn equinox_day(year: i32, base: f64) -> Option<u32> {
    if !(1980..=2099).contains(&year) {
        return None;
    }
    let elapsed = f64::from(year - 1980);
    let day = base + 0.242194 * elapsed - (elapsed / 4.0).floor();
    Some(day.floor() as u32)
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// A weekday following a run of named holidays that contains a Sunday.
fn is_substitute_holiday(date: NaiveDate) -> bool {
    if named_holiday(date).is_some() || date.year() < 1973 {
        return false;
    }
    let mut previous = date - Duration::days(1);
    if date.year() < 2007 {
        return previous.weekday() == Weekday::Sun && named_holiday(previous).is_some();
    }
    while named_holiday(previous).is_some() {
        if previous.weekday() == Weekday::Sun {
            return true;
        }
        previous -= Duration::days(1);
    }
    false
}

/// A non-holiday sandwiched between two named holidays.
fn is_citizens_holiday(date: NaiveDate) -> bool {
    if date.year() < 1988 || named_holiday(date).is_some() || date.weekday() == Weekday::Sun {
        return false;
    }
    named_holiday(date - Duration::days(1)).is_some()
        && named_holiday(date + Duration::days(1)).is_some()
}
