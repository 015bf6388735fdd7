//! Period (year, month) identifying one schedule document.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::RosterError;

/// A calendar month.
///
/// The canonical string form is `"{year}-{month}"` without zero padding,
/// which is also the id of the persisted schedule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, RosterError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(RosterError::InvalidPeriod(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Number of days in the month under the Gregorian calendar.
    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        match first.checked_add_months(chrono::Months::new(1)) {
            Some(next) => (next - first).num_days() as u32,
            None => 31,
        }
    }

    /// Calendar date of a 1-based day.
    ///
    /// Days past the end of the month roll over into the following month.
    pub fn date(&self, day: u32) -> NaiveDate {
        let offset = u64::from(day.saturating_sub(1));
        self.first_day()
            .checked_add_days(Days::new(offset))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Day of week of a 1-based day.
    pub fn weekday(&self, day: u32) -> Weekday {
        self.date(day).weekday()
    }

    /// Id of the schedule document for this period.
    pub fn document_id(&self) -> String {
        self.to_string()
    }

    /// Parses the canonical form. Zero-padded months are accepted.
    pub fn parse(s: &str) -> Result<Self, RosterError> {
        let invalid = || RosterError::InvalidPeriod(s.to_string());

        let (year, month) = s.trim().rsplit_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

impl std::str::FromStr for Period {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
