//! Converts a symbolic day/time selection into a UTC window.

use chrono::{DateTime, Duration, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use shared_types::{Day, ReviewDuration, ScheduledWindow};

use crate::error::PipelineError;

/// Resolve the review window relative to `reference`.
///
/// The calendar date is taken in `tz`. A `Today` slot that has already passed
/// stays on today's date.
pub fn resolve_window(
    day: Day,
    time: &str,
    duration: ReviewDuration,
    reference: DateTime<Utc>,
    tz: Tz,
) -> Result<ScheduledWindow, PipelineError> {
    let invalid = || PipelineError::InvalidTime(time.to_string());

    let clock = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| invalid())?;
    let date = reference.with_timezone(&tz).date_naive() + Duration::days(day.offset_days() as i64);
    let local = date.and_time(clock);

    let start = match tz.from_local_datetime(&local) {
        LocalResult::Single(start) => start,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => return Err(invalid()),
    }
    .with_timezone(&Utc);

    Ok(ScheduledWindow {
        start_utc: start,
        end_utc: start + Duration::minutes(duration.minutes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn test_today_afternoon_in_kolkata() {
        let window = resolve_window(
            Day::Today,
            "14:00",
            ReviewDuration::ThirtyMinutes,
            reference(3, 0),
            chrono_tz::Asia::Kolkata,
        )
        .unwrap();

        assert_eq!(window.start_utc, Utc.with_ymd_and_hms(2024, 3, 4, 8, 30, 0).unwrap());
        assert_eq!(window.end_utc, Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_tomorrow_adds_one_day() {
        let window = resolve_window(
            Day::Tomorrow,
            "10:00",
            ReviewDuration::SixtyMinutes,
            reference(3, 0),
            chrono_tz::Asia::Kolkata,
        )
        .unwrap();

        assert_eq!(window.start_utc, Utc.with_ymd_and_hms(2024, 3, 5, 4, 30, 0).unwrap());
        assert_eq!(window.length(), Duration::minutes(60));
    }

    #[test]
    fn test_passed_time_today_does_not_roll_over() {
        // 12:00 UTC is 17:30 in Kolkata, after the 10:00 slot
        let window = resolve_window(
            Day::Today,
            "10:00",
            ReviewDuration::ThirtyMinutes,
            reference(12, 0),
            chrono_tz::Asia::Kolkata,
        )
        .unwrap();

        assert_eq!(window.start_utc, Utc.with_ymd_and_hms(2024, 3, 4, 4, 30, 0).unwrap());
        assert!(window.start_utc < reference(12, 0));
    }

    #[test]
    fn test_local_date_used_near_midnight() {
        // 20:00 UTC on the 4th is already the 5th in Kolkata
        let window = resolve_window(
            Day::Today,
            "12:00",
            ReviewDuration::ThirtyMinutes,
            reference(20, 0),
            chrono_tz::Asia::Kolkata,
        )
        .unwrap();

        assert_eq!(window.start_utc, Utc.with_ymd_and_hms(2024, 3, 5, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_window_length_matches_duration() {
        for duration in ReviewDuration::ALL {
            let window = resolve_window(
                Day::Today,
                "16:00",
                duration,
                reference(0, 0),
                chrono_tz::Asia::Kolkata,
            )
            .unwrap();
            assert_eq!(window.length(), Duration::minutes(duration.minutes()));
        }
    }

    #[test]
    fn test_malformed_time_rejected() {
        for time in ["", "2pm", "25:00", "14-00"] {
            let err = resolve_window(
                Day::Today,
                time,
                ReviewDuration::ThirtyMinutes,
                reference(0, 0),
                chrono_tz::Asia::Kolkata,
            )
            .unwrap_err();
            assert!(matches!(err, PipelineError::InvalidTime(t) if t == time));
        }
    }

    #[test]
    fn test_dst_gap_rejected() {
        // 2024-03-10 02:30 does not exist in New York
        let reference = Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap();
        let err = resolve_window(
            Day::Today,
            "02:30",
            ReviewDuration::ThirtyMinutes,
            reference,
            chrono_tz::America::New_York,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTime(_)));
    }

    #[test]
    fn test_ambiguous_time_takes_earlier_instant() {
        // 2024-11-03 01:30 occurs twice in New York; the EDT one is 05:30 UTC
        let reference = Utc.with_ymd_and_hms(2024, 11, 3, 4, 0, 0).unwrap();
        let window = resolve_window(
            Day::Today,
            "01:30",
            ReviewDuration::ThirtyMinutes,
            reference,
            chrono_tz::America::New_York,
        )
        .unwrap();
        assert_eq!(window.start_utc, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());
    }
}
