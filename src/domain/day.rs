use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month};

/// A calendar date without time or zone. `Day::MIN` stands for the
/// "0000-00-00" default stored in the flags table and sorts before every
/// real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Day {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl Day {
    pub const MIN: Day = Day {
        year: 0,
        month: 0,
        day: 0,
    };

    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, ParseDayError> {
        let invalid = || ParseDayError {
            value: format!("{year:04}-{month:02}-{day:02}"),
        };
        let month_value = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month_value, day).map_err(|_| invalid())?;
        Ok(Self { year, month, day })
    }

    /// First day of a month; used where only (year, month) matters.
    pub fn month_start(year: i32, month: u8) -> Result<Self, ParseDayError> {
        Self::new(year, month, 1)
    }

    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
            day: date.day(),
        }
    }

    pub fn to_date(self) -> Option<Date> {
        let month = Month::try_from(self.month).ok()?;
        Date::from_calendar_date(self.year, month, self.day).ok()
    }

    pub fn previous(self) -> Self {
        self.to_date()
            .and_then(Date::previous_day)
            .map(Self::from_date)
            .unwrap_or(Self::MIN)
    }

    pub fn next(self) -> Self {
        self.to_date()
            .and_then(Date::next_day)
            .map(Self::from_date)
            .unwrap_or(Self::MIN)
    }

    pub fn is_same_month(self, other: Day) -> bool {
        self.year == other.year && self.month == other.month
    }

    pub fn yyyymmdd(self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    pub fn last_day_of_month(year: i32, month: u8) -> u8 {
        Month::try_from(month)
            .map(|month| time::util::days_in_year_month(year, month))
            .unwrap_or(0)
    }

    pub fn last_days_of_months(year: i32) -> BTreeMap<u8, u8> {
        (1..=12)
            .map(|month| (month, Self::last_day_of_month(year, month)))
            .collect()
    }

    /// Every day of a month in ascending order.
    pub fn days_of_month(year: i32, month: u8) -> Vec<Day> {
        (1..=Self::last_day_of_month(year, month))
            .map(|day| Day { year, month, day })
            .collect()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.yyyymmdd())
    }
}

impl FromStr for Day {
    type Err = ParseDayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let err = || ParseDayError {
            value: value.to_string(),
        };
        let mut parts = trimmed.split('-');
        let (Some(year), Some(month), Some(day), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u8 = month.parse().map_err(|_| err())?;
        let day: u8 = day.parse().map_err(|_| err())?;
        if (year, month, day) == (0, 0, 0) {
            return Ok(Day::MIN);
        }
        Day::new(year, month, day).map_err(|_| err())
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.yyyymmdd())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Day::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDayError {
    value: String,
}

impl fmt::Display for ParseDayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid day '{}': expected YYYY-MM-DD", self.value)
    }
}

impl Error for ParseDayError {}

/// Which day the entry flow is writing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Today,
    Yesterday,
}

impl DayType {
    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Today => "today",
            DayType::Yesterday => "yesterday",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DayType::Today => "오늘",
            DayType::Yesterday => "어제",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DayType::Today => DayType::Yesterday,
            DayType::Yesterday => DayType::Today,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayType {
    type Err = ParseDayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DayType::Today),
            "yesterday" => Ok(DayType::Yesterday),
            _ => Err(ParseDayError {
                value: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Day, DayType};
    use std::str::FromStr;

    #[test]
    fn parses_and_formats_calendar_days() {
        let day = Day::from_str("2025-02-28").unwrap();
        assert_eq!(day, Day::new(2025, 2, 28).unwrap());
        assert_eq!(day.to_string(), "2025-02-28");
        assert_eq!(day.next().yyyymmdd(), "2025-03-01");
        assert_eq!(Day::new(2025, 3, 1).unwrap().previous(), day);
    }

    #[test]
    fn default_sentinel_precedes_real_days() {
        let sentinel = Day::from_str("0000-00-00").unwrap();
        assert_eq!(sentinel, Day::MIN);
        assert!(sentinel < Day::new(1, 1, 1).unwrap());
        assert_eq!(sentinel.to_date(), None);
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(Day::from_str("2025-02-30").is_err());
        assert!(Day::from_str("2025-13-01").is_err());
        assert!(Day::from_str("20250101").is_err());
        assert!(Day::from_str("2025-01-01-01").is_err());
    }

    #[test]
    fn orders_by_year_month_day() {
        let a = Day::new(2024, 12, 31).unwrap();
        let b = Day::new(2025, 1, 1).unwrap();
        assert!(a < b);
        assert!(!a.is_same_month(b));
        assert!(b.is_same_month(Day::new(2025, 1, 20).unwrap()));
    }

    #[test]
    fn month_lengths_respect_leap_years() {
        assert_eq!(Day::last_day_of_month(2024, 2), 29);
        assert_eq!(Day::last_day_of_month(2025, 2), 28);
        let lasts = Day::last_days_of_months(2025);
        assert_eq!(lasts.len(), 12);
        assert_eq!(lasts[&4], 30);
        assert_eq!(Day::days_of_month(2025, 4).len(), 30);
    }

    #[test]
    fn day_type_toggles_and_parses() {
        assert_eq!(DayType::Today.toggled(), DayType::Yesterday);
        assert_eq!(DayType::from_str("Yesterday").unwrap(), DayType::Yesterday);
        assert_eq!(DayType::Yesterday.title(), "어제");
        assert!(DayType::from_str("tomorrow").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let day = Day::new(2025, 7, 9).unwrap();
        let json = serde_json::to_string(&day).unwrap();
        assert_eq!(json, "\"2025-07-09\"");
        let back: Day = serde_json::from_str(&json).unwrap();
        assert_eq!(back, day);
    }
}
