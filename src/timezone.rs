//! Offset resolution for the naive timestamps printed by the legacy blog.
//!
//! The blog ran in Central European time.  Summer time starts at 02:00 local
//! time on the start day and ends at 03:00 local time on the end day; the
//! dates come from a fixed table, so only the years the blog was online are
//! known.

use crate::error::TimezoneError;
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};

const WINTER_OFFSET_SECONDS: i32 = 3600;
const SUMMER_OFFSET_SECONDS: i32 = 2 * 3600;
const SWITCH_TO_SUMMER_HOUR: u32 = 2;
const SWITCH_TO_WINTER_HOUR: u32 = 3;

/// (year, March start day, October end day)
const SUMMER_TIME: &[(i32, u32, u32)] = &[
    (2009, 29, 25),
    (2010, 28, 31),
    (2011, 27, 30),
    (2012, 25, 28),
    (2013, 31, 27),
    (2014, 30, 26),
    (2015, 29, 25),
    (2016, 27, 30),
    (2017, 26, 29),
    (2018, 25, 28),
];

fn switch_days(year: i32) -> Result<(NaiveDate, NaiveDate), TimezoneError> {
    SUMMER_TIME
        .iter()
        .find(|(y, _, _)| *y == year)
        .and_then(|&(_, start, end)| {
            Some((
                NaiveDate::from_ymd_opt(year, 3, start)?,
                NaiveDate::from_ymd_opt(year, 10, end)?,
            ))
        })
        .ok_or(TimezoneError::UnknownYear(year))
}

fn is_summer_time(local: &NaiveDateTime) -> Result<bool, TimezoneError> {
    let (start, end) = switch_days(local.year())?;
    let start = start.and_hms_opt(SWITCH_TO_SUMMER_HOUR, 0, 0);
    let end = end.and_hms_opt(SWITCH_TO_WINTER_HOUR, 0, 0);
    Ok(match (start, end) {
        (Some(start), Some(end)) => *local >= start && *local < end,
        _ => false,
    })
}

/// The UTC offset in force at the given local date and time.
pub fn offset_for(date: NaiveDate, time: NaiveTime) -> Result<FixedOffset, TimezoneError> {
    let seconds = if is_summer_time(&date.and_time(time))? {
        SUMMER_OFFSET_SECONDS
    } else {
        WINTER_OFFSET_SECONDS
    };
    Ok(FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix()))
}

/// Attach the resolved offset to a naive local timestamp.
pub fn localize(local: NaiveDateTime) -> Result<DateTime<FixedOffset>, TimezoneError> {
    let offset = offset_for(local.date(), local.time())?;
    Ok(offset
        .from_local_datetime(&local)
        .single()
        .unwrap_or_else(|| offset.from_utc_datetime(&local)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        localize(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn winter_and_summer_offsets() {
        assert_eq!(at(2010, 1, 15, 12, 0).offset().local_minus_utc(), 3600);
        assert_eq!(at(2010, 7, 15, 12, 0).offset().local_minus_utc(), 7200);
        assert_eq!(at(2010, 12, 24, 18, 0).offset().local_minus_utc(), 3600);
    }

    #[test]
    fn switch_boundaries() {
        // 2010: summer time from March 28 02:00 to October 31 03:00
        assert_eq!(at(2010, 3, 28, 1, 59).offset().local_minus_utc(), 3600);
        assert_eq!(at(2010, 3, 28, 2, 0).offset().local_minus_utc(), 7200);
        assert_eq!(at(2010, 3, 29, 0, 30).offset().local_minus_utc(), 7200);
        assert_eq!(at(2010, 10, 31, 2, 59).offset().local_minus_utc(), 7200);
        assert_eq!(at(2010, 10, 31, 3, 0).offset().local_minus_utc(), 3600);
    }

    #[test]
    fn rendered_with_offset() {
        assert_eq!(at(2012, 6, 1, 20, 15).to_rfc3339(), "2012-06-01T20:15:00+02:00");
    }

    #[test]
    fn unknown_year_is_an_error() {
        let local = NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(localize(local), Err(TimezoneError::UnknownYear(2020)));
    }
}
