#![forbid(unsafe_code)]

use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::core::record::Frequency;
use crate::error::ImportError;

pub const DEFAULT_STAGGER_WINDOW: u32 = 30;

pub fn parse_iso_date(input: &str) -> Result<Date, ImportError> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(input.trim(), &fmt).map_err(|_| ImportError::InvalidDate(input.to_owned()))
}

#[must_use]
pub fn format_iso_date(date: Date) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    date.format(&fmt).unwrap_or_else(|_| date.to_string())
}

/// Today in the local timezone, or UTC when the offset cannot be determined.
#[must_use]
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Due date for the `ordinal_index`-th occurrence after `start`.
#[must_use]
pub fn due_date(start: Date, ordinal_index: u32, frequency: Frequency) -> Date {
    let days = i64::from(ordinal_index).saturating_mul(frequency.interval_days());
    start.saturating_add(Duration::days(days))
}

/// Position inside the repeating stagger window. Every `window` rows the
/// due dates start over from the first slot.
#[must_use]
pub fn stagger_index(position: usize, window: u32) -> u32 {
    let window = window.max(1);
    // The remainder is < window, so it always fits.
    u32::try_from(position % window as usize).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn monthly_is_thirty_day_steps() {
        assert_eq!(
            due_date(date!(2024 - 01 - 01), 2, Frequency::Monthly),
            date!(2024 - 03 - 01)
        );
    }

    #[test]
    fn each_frequency_offsets_by_its_interval() {
        let start = date!(2023 - 12 - 30);
        assert_eq!(due_date(start, 3, Frequency::Daily), date!(2024 - 01 - 02));
        assert_eq!(due_date(start, 1, Frequency::Weekly), date!(2024 - 01 - 06));
        assert_eq!(due_date(start, 1, Frequency::Quarterly), date!(2024 - 03 - 29));
        // 2024 is a leap year; the yearly step ignores it.
        assert_eq!(due_date(start, 1, Frequency::Yearly), date!(2024 - 12 - 29));
    }

    #[test]
    fn index_zero_is_the_start_date() {
        let start = date!(2025 - 06 - 15);
        for f in Frequency::ALL {
            assert_eq!(due_date(start, 0, f), start);
        }
    }

    #[test]
    fn weekly_steps_by_seven_days() {
        let start = date!(2024 - 01 - 01);
        assert_eq!(due_date(start, 2, Frequency::Weekly), date!(2024 - 01 - 15));
    }

    #[test]
    fn stagger_wraps_at_window() {
        assert_eq!(stagger_index(0, 30), 0);
        assert_eq!(stagger_index(29, 30), 29);
        assert_eq!(stagger_index(30, 30), 0);
        assert_eq!(stagger_index(61, 30), 1);
        assert_eq!(stagger_index(5, 0), 0);
    }

    #[test]
    fn parses_and_formats_iso_dates() {
        let d = parse_iso_date(" 2024-02-29 ").unwrap();
        assert_eq!(d, date!(2024 - 02 - 29));
        assert_eq!(format_iso_date(d), "2024-02-29");
        assert!(parse_iso_date("2023-02-29").is_err());
        assert!(parse_iso_date("01/02/2024").is_err());
    }

    #[test]
    fn far_future_saturates_instead_of_panicking() {
        let start = date!(9999 - 12 - 01);
        assert_eq!(due_date(start, u32::MAX, Frequency::Yearly), Date::MAX);
    }
}
