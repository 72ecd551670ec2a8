use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Layout OFX uses for every date-time value, with an explicit zero offset.
pub const OFX_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S%.3f[0:GMT]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {value:?} with layout {layout:?}: {source}")]
pub struct DateError {
    pub value: String,
    pub layout: String,
    pub source: chrono::ParseError,
}

/// A point in time normalized to UTC; displays in OFX form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(Utc::now())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Timestamp(date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Parses `raw` with a chrono `strftime` layout.
    ///
    /// Layouts carrying an offset are converted to UTC; layouts with a time but
    /// no offset are read as UTC; date-only layouts land on midnight UTC.
    pub fn parse(raw: &str, layout: &str) -> Result<Self, DateError> {
        let value = raw.trim();

        if let Ok(at) = DateTime::parse_from_str(value, layout) {
            return Ok(Timestamp(at.with_timezone(&Utc)));
        }
        if let Ok(at) = NaiveDateTime::parse_from_str(value, layout) {
            return Ok(Timestamp(at.and_utc()));
        }
        NaiveDate::parse_from_str(value, layout)
            .map(Timestamp::from_date)
            .map_err(|source| DateError {
                value: raw.to_string(),
                layout: layout.to_string(),
                source,
            })
    }

}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(OFX_DATETIME_FORMAT))
    }
}

/// The window a statement covers and the instant its balances are taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
    pub as_of: Timestamp,
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.0.format("%Y-%m-%d"),
            self.end.0.format("%Y-%m-%d")
        )
    }
}

impl StatementPeriod {
    /// Inclusive on both ends.
    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn parse_date_only_layout() {
        let ts = Timestamp::parse("2024/01/15", "%Y/%m/%d").unwrap();
        assert_eq!(ts, date(2024, 1, 15));
        assert_eq!(ts.to_string(), "20240115000000.000[0:GMT]");
    }

    #[test]
    fn parse_layout_with_time() {
        let ts = Timestamp::parse("01/15/2024 13:45:10", "%m/%d/%Y %H:%M:%S").unwrap();
        assert_eq!(ts.to_string(), "20240115134510.000[0:GMT]");
    }

    #[test]
    fn parse_layout_with_offset_converts_to_utc() {
        let ts = Timestamp::parse("2024-01-15 20:00:00 -0500", "%Y-%m-%d %H:%M:%S %z").unwrap();
        assert_eq!(ts.to_string(), "20240116010000.000[0:GMT]");
    }

    #[test]
    fn parse_trims_surrounding_space() {
        assert_eq!(Timestamp::parse(" 2024/03/01 ", "%Y/%m/%d").unwrap(), date(2024, 3, 1));
    }

    #[test]
    fn parse_mismatched_layout_reports_value_and_layout() {
        let err = Timestamp::parse("15-01-2024", "%Y/%m/%d").unwrap_err();
        assert_eq!(err.value, "15-01-2024");
        let msg = err.to_string();
        assert!(msg.contains("15-01-2024"));
        assert!(msg.contains("%Y/%m/%d"));
    }

    #[test]
    fn period_contains_is_inclusive() {
        let period = StatementPeriod {
            start: date(2024, 1, 1),
            end: date(2024, 1, 31),
            as_of: date(2024, 1, 31),
        };
        assert!(period.contains(date(2024, 1, 1)));
        assert!(period.contains(date(2024, 1, 31)));
        assert!(!period.contains(date(2024, 2, 1)));
        assert_eq!(period.to_string(), "2024-01-01 to 2024-01-31");
    }
}
