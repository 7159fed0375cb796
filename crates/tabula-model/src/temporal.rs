//! Resolution-gated time values and durations.
//!
//! A [`Time`] carries milliseconds since the Unix epoch (UTC) plus the
//! [`Resolution`] it was observed at. Every calendar accessor is tagged with
//! the minimum resolution it requires; asking a day-resolution value for its
//! hour fails with [`ValueError::Resolution`] instead of fabricating one.
//! Durations are [`Quantity`] values over the built-in time unit table.

use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::unit::{Quantity, UnitTable};

/// Coarseness of a temporal observation, ordered finest to coarsest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    Decade,
    Century,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Millisecond => "millisecond",
            Resolution::Second => "second",
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
            Resolution::Day => "day",
            Resolution::Week => "week",
            Resolution::Month => "month",
            Resolution::Quarter => "quarter",
            Resolution::Year => "year",
            Resolution::Decade => "decade",
            Resolution::Century => "century",
        }
    }

    /// Resolves a time-table unit name back to its resolution.
    pub fn from_unit(unit: &str) -> Option<Resolution> {
        match unit {
            "millisecond" => Some(Resolution::Millisecond),
            "second" => Some(Resolution::Second),
            "minute" => Some(Resolution::Minute),
            "hour" => Some(Resolution::Hour),
            "day" => Some(Resolution::Day),
            "week" => Some(Resolution::Week),
            "month" => Some(Resolution::Month),
            "quarter" => Some(Resolution::Quarter),
            "year" => Some(Resolution::Year),
            "decade" => Some(Resolution::Decade),
            "century" => Some(Resolution::Century),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The process-wide table every duration converts through.
///
/// Units are named after the resolutions; a month is the mean Gregorian month
/// (30.4375 days), which makes a year exactly 365.25 days.
pub fn time_unit_table() -> &'static Arc<UnitTable> {
    static TABLE: OnceLock<Arc<UnitTable>> = OnceLock::new();
    TABLE.get_or_init(|| {
        UnitTable::new([
            ("second", 1000.0, "millisecond"),
            ("minute", 60.0, "second"),
            ("hour", 60.0, "minute"),
            ("day", 24.0, "hour"),
            ("week", 7.0, "day"),
            ("month", 30.4375, "day"),
            ("quarter", 3.0, "month"),
            ("year", 12.0, "month"),
            ("decade", 10.0, "year"),
            ("century", 10.0, "decade"),
        ])
    })
}

/// Constructs a duration over the built-in time unit table.
pub fn duration(amount: f64, unit: &str) -> Result<Quantity, ValueError> {
    time_unit_table().value(amount, unit)
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A UTC instant observed at a fixed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    epoch_ms: i64,
    resolution: Resolution,
}

impl Time {
    pub fn new(epoch_ms: i64, resolution: Resolution) -> Self {
        Self {
            epoch_ms,
            resolution,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub(crate) fn raw_millis(&self) -> i64 {
        self.epoch_ms
    }

    fn enforce(&self, required: Resolution) -> Result<(), ValueError> {
        if self.resolution > required {
            return Err(ValueError::Resolution {
                required: required.as_str(),
                actual: self.resolution.as_str(),
            });
        }
        Ok(())
    }

    fn date_time(&self) -> Result<DateTime<Utc>, ValueError> {
        DateTime::from_timestamp_millis(self.epoch_ms).ok_or_else(|| {
            ValueError::invalid(format!(
                "{} ms is outside the supported calendar range",
                self.epoch_ms
            ))
        })
    }

    pub fn epoch_ms(&self) -> Result<i64, ValueError> {
        self.enforce(Resolution::Millisecond)?;
        Ok(self.epoch_ms)
    }

    pub fn millisecond(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Millisecond)?;
        Ok(self.date_time()?.timestamp_subsec_millis())
    }

    pub fn second(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Second)?;
        Ok(self.date_time()?.second())
    }

    pub fn minute(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Minute)?;
        Ok(self.date_time()?.minute())
    }

    pub fn hour(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Hour)?;
        Ok(self.date_time()?.hour())
    }

    /// Day of the month, 1-based.
    pub fn day_of_month(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Day)?;
        Ok(self.date_time()?.day())
    }

    /// Day of the week, 0-6 with Sunday = 0.
    pub fn day_of_week(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Day)?;
        Ok(self.date_time()?.weekday().num_days_from_sunday())
    }

    /// Day of the year, 1-based.
    pub fn day_of_year(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Day)?;
        Ok(self.date_time()?.ordinal())
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Month)?;
        Ok(self.date_time()?.month())
    }

    /// Calendar quarter, 1-4.
    pub fn quarter(&self) -> Result<u32, ValueError> {
        self.enforce(Resolution::Quarter)?;
        Ok(self.date_time()?.month0() / 3 + 1)
    }

    pub fn year(&self) -> Result<i32, ValueError> {
        self.enforce(Resolution::Year)?;
        Ok(self.date_time()?.year())
    }

    /// Decade, e.g. 2010 for any year 2010-2019. Reads the raw calendar year
    /// so decade-resolution values can report their own field.
    pub fn decade(&self) -> Result<i32, ValueError> {
        self.enforce(Resolution::Decade)?;
        Ok(self.date_time()?.year().div_euclid(10) * 10)
    }

    pub fn century(&self) -> Result<i32, ValueError> {
        self.enforce(Resolution::Century)?;
        Ok(self.date_time()?.year().div_euclid(100) * 100)
    }

    /// Shifts the instant by a duration whose unit must be at least as coarse
    /// as this value's resolution; the result keeps the resolution.
    pub fn add_duration(&self, duration: &Quantity) -> Result<Time, ValueError> {
        let unit_resolution = Resolution::from_unit(duration.unit())
            .ok_or_else(|| ValueError::invalid(format!("{:?} is not a time unit", duration.unit())))?;
        if unit_resolution < self.resolution {
            return Err(ValueError::Resolution {
                required: self.resolution.as_str(),
                actual: unit_resolution.as_str(),
            });
        }
        let delta = duration.get("millisecond")?.round();
        if !delta.is_finite() || delta < i64::MIN as f64 || delta > i64::MAX as f64 {
            return Err(ValueError::invalid(
                "duration does not convert to a representable millisecond count",
            ));
        }
        let shifted = self
            .epoch_ms
            .checked_add(delta as i64)
            .ok_or_else(|| ValueError::invalid("time shift overflows the epoch range"))?;
        Ok(Time::new(shifted, self.resolution))
    }

    /// Difference of two same-resolution instants, as a duration expressed in
    /// that resolution's unit.
    pub fn sub_time(&self, other: &Time) -> Result<Quantity, ValueError> {
        if self.resolution != other.resolution {
            return Err(ValueError::Resolution {
                required: other.resolution.as_str(),
                actual: self.resolution.as_str(),
            });
        }
        let diff_ms = (self.epoch_ms - other.epoch_ms) as f64;
        let unit = self.resolution.as_str();
        let amount = time_unit_table().convert(diff_ms, "millisecond", unit)?;
        time_unit_table().value(amount, unit)
    }

    /// "2009-04-09"
    pub fn iso_date(&self) -> Result<String, ValueError> {
        self.enforce(Resolution::Day)?;
        let dt = self.date_time()?;
        Ok(format!("{:04}-{:02}-{:02}", dt.year(), dt.month(), dt.day()))
    }

    /// "1993-10-02 02:15:15"
    pub fn iso_date_time(&self) -> Result<String, ValueError> {
        self.enforce(Resolution::Second)?;
        let dt = self.date_time()?;
        Ok(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ))
    }

    /// "July 4, 1776"
    pub fn medium_date(&self) -> Result<String, ValueError> {
        self.enforce(Resolution::Day)?;
        let dt = self.date_time()?;
        Ok(format!(
            "{} {}, {}",
            MONTH_NAMES[dt.month0() as usize],
            dt.day(),
            dt.year()
        ))
    }

    /// "January 1, 2015 1:01:01 p.m."
    pub fn medium_date_time(&self) -> Result<String, ValueError> {
        self.enforce(Resolution::Second)?;
        let dt = self.date_time()?;
        Ok(format!("{} {}", self.medium_date()?, twelve_hour(&dt)))
    }

    /// "Friday, December 31, 1999"
    pub fn long_date(&self) -> Result<String, ValueError> {
        self.enforce(Resolution::Day)?;
        let dt = self.date_time()?;
        Ok(format!(
            "{}, {}",
            WEEKDAY_NAMES[dt.weekday().num_days_from_sunday() as usize],
            self.medium_date()?
        ))
    }

    /// "Wednesday, May 4, 2011 10:59:59 a.m."
    pub fn long_date_time(&self) -> Result<String, ValueError> {
        self.enforce(Resolution::Second)?;
        let dt = self.date_time()?;
        Ok(format!("{} {}", self.long_date()?, twelve_hour(&dt)))
    }
}

fn twelve_hour(dt: &DateTime<Utc>) -> String {
    let suffix = if dt.hour() < 12 { "a.m." } else { "p.m." };
    let mut hour = dt.hour() % 12;
    if hour == 0 {
        hour = 12;
    }
    format!("{hour}:{:02}:{:02} {suffix}", dt.minute(), dt.second())
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(dt) = self.date_time() else {
            return write!(f, "{} ms", self.epoch_ms);
        };
        match self.resolution {
            Resolution::Millisecond | Resolution::Second | Resolution::Minute | Resolution::Hour => {
                write!(
                    f,
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    dt.year(),
                    dt.month(),
                    dt.day(),
                    dt.hour(),
                    dt.minute(),
                    dt.second()
                )
            }
            Resolution::Day | Resolution::Week => {
                write!(f, "{:04}-{:02}-{:02}", dt.year(), dt.month(), dt.day())
            }
            Resolution::Month | Resolution::Quarter => {
                write!(f, "{:04}-{:02}", dt.year(), dt.month())
            }
            Resolution::Year | Resolution::Decade | Resolution::Century => {
                write!(f, "{:04}", dt.year())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::approx_eq;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn utc_ms(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> i64 {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    fn day(year: i32, month: u32, day_of_month: u32) -> Time {
        Time::new(utc_ms(year, month, day_of_month, 0, 0, 0), Resolution::Day)
    }

    #[test]
    fn calendar_fields() {
        let time = day(2015, 3, 1);
        assert_eq!(time.year().unwrap(), 2015);
        assert_eq!(time.month().unwrap(), 3);
        assert_eq!(time.quarter().unwrap(), 1);
        assert_eq!(time.day_of_month().unwrap(), 1);
        assert_eq!(time.day_of_year().unwrap(), 60);
        assert_eq!(time.day_of_week().unwrap(), 0);
        assert_eq!(time.decade().unwrap(), 2010);
        assert_eq!(time.century().unwrap(), 2000);
    }

    #[test]
    fn leap_year_day_of_year() {
        let time = day(2016, 3, 1);
        assert_eq!(time.year().unwrap(), 2016);
        assert_eq!(time.day_of_year().unwrap(), 61);
        assert_eq!(time.day_of_week().unwrap(), 2);
    }

    #[test]
    fn day_resolution_refuses_finer_fields() {
        let time = day(2015, 1, 1);
        assert_eq!(
            time.hour().unwrap_err(),
            ValueError::Resolution {
                required: "hour",
                actual: "day",
            }
        );
        assert!(time.minute().is_err());
        assert!(time.epoch_ms().is_err());
        assert!(time.year().is_ok());
        assert!(time.month().is_ok());
        assert!(time.day_of_month().is_ok());
    }

    #[test]
    fn decade_resolution_reports_its_own_field() {
        let time = Time::new(utc_ms(2015, 1, 1, 0, 0, 0), Resolution::Decade);
        assert_eq!(time.decade().unwrap(), 2010);
        assert!(time.year().is_err());
    }

    #[test]
    fn three_months_is_a_quarter_year() {
        let quarter = duration(3.0, "month").unwrap();
        assert!(approx_eq(quarter.get("year").unwrap(), 0.25));
    }

    #[test]
    fn adding_a_week_lands_seven_days_later() {
        let start = day(2015, 1, 1);
        let end = start.add_duration(&duration(1.0, "week").unwrap()).unwrap();
        assert_eq!(end, day(2015, 1, 8));
    }

    #[test]
    fn adding_finer_than_resolution_fails() {
        let start = day(2015, 1, 1);
        let err = start
            .add_duration(&duration(1.0, "hour").unwrap())
            .unwrap_err();
        assert!(matches!(err, ValueError::Resolution { .. }));
    }

    #[test]
    fn second_resolution_difference() {
        let start = Time::new(utc_ms(2014, 12, 31, 16, 32, 18), Resolution::Second);
        let end = Time::new(utc_ms(2015, 1, 1, 1, 32, 19), Resolution::Second);
        let difference = end.sub_time(&start).unwrap();
        assert_eq!(difference.unit(), "second");
        let expected = duration(9.0, "hour").unwrap().get("second").unwrap() + 1.0;
        assert!(approx_eq(difference.amount(), expected));
    }

    #[test]
    fn mixed_resolution_difference_fails() {
        let fine = Time::new(utc_ms(2015, 1, 1, 1, 2, 3), Resolution::Second);
        let coarse = day(2015, 1, 1);
        assert!(matches!(
            fine.sub_time(&coarse),
            Err(ValueError::Resolution { .. })
        ));
    }

    #[test]
    fn format_accessors() {
        assert_eq!(day(2009, 4, 9).iso_date().unwrap(), "2009-04-09");
        assert_eq!(
            Time::new(utc_ms(1993, 10, 2, 2, 15, 15), Resolution::Second)
                .iso_date_time()
                .unwrap(),
            "1993-10-02 02:15:15"
        );
        assert_eq!(day(1776, 7, 4).medium_date().unwrap(), "July 4, 1776");
        assert_eq!(
            Time::new(utc_ms(2015, 1, 1, 13, 1, 1), Resolution::Second)
                .medium_date_time()
                .unwrap(),
            "January 1, 2015 1:01:01 p.m."
        );
        assert_eq!(
            day(1999, 12, 31).long_date().unwrap(),
            "Friday, December 31, 1999"
        );
        assert_eq!(
            Time::new(utc_ms(2011, 5, 4, 10, 59, 59), Resolution::Second)
                .long_date_time()
                .unwrap(),
            "Wednesday, May 4, 2011 10:59:59 a.m."
        );
    }

    #[test]
    fn format_needs_enough_resolution() {
        assert!(matches!(
            day(2000, 1, 1).iso_date_time(),
            Err(ValueError::Resolution { .. })
        ));
    }
}
