//! Booking slot time handling.
//!
//! The UI collects 12-hour slot strings ("10:00 AM"); bookings are stamped
//! with a combined 24-hour date-time. Cart checkout collects no per-item
//! schedule and falls back to [`DEFAULT_SLOT`] on today's date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::Error;

/// Slot used when the flow does not collect one.
pub const DEFAULT_SLOT: &str = "10:00 AM";

/// Parse a 12-hour slot string into a time of day.
///
/// "12:00 AM" is midnight (hour 0) and "12:00 PM" is noon (hour 12).
pub fn parse_twelve_hour(slot: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(slot.trim(), "%I:%M %p")
        .map_err(|_| Error::validation(format!("invalid time slot: {slot:?}")))
}

/// Combine a calendar date with a parsed slot into the booking date-time.
pub fn combine(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn test_midnight_and_noon_edge_cases() {
        assert_eq!(parse_twelve_hour("12:00 AM").unwrap().hour(), 0);
        assert_eq!(parse_twelve_hour("12:00 PM").unwrap().hour(), 12);
    }

    #[test]
    fn test_afternoon_hours_shift_by_twelve() {
        let time = parse_twelve_hour("02:00 PM").unwrap();
        assert_eq!(time.hour(), 14);
        assert_eq!(time.minute(), 0);
    }

    #[test]
    fn test_morning_hours_pass_through() {
        assert_eq!(parse_twelve_hour("10:00 AM").unwrap().hour(), 10);
        assert_eq!(parse_twelve_hour(" 10:30 AM ").unwrap().minute(), 30);
    }

    #[test]
    fn test_garbage_slot_is_a_validation_error() {
        let err = parse_twelve_hour("half past ten").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_combine_stamps_date_and_time() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let stamped = combine(date, parse_twelve_hour("02:00 PM").unwrap());
        assert_eq!(stamped.to_string(), "2026-03-14 14:00:00");
    }
}
