//! Calendar month, 1 through 12

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, TempcastError};

const NAMES: [&str; 12] = [
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

/// A validated calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Month(u8);

impl Month {
    /// Month preselected in the dashboard
    pub const DEFAULT: Month = Month(7);

    pub fn new(number: u32) -> Result<Self> {
        if (1..=12).contains(&number) {
            Ok(Self(number as u8))
        } else {
            Err(TempcastError::validation(format!(
                "Month must be between 1 and 12, got: {number}"
            )))
        }
    }

    /// All twelve months in calendar order
    pub fn all() -> impl Iterator<Item = Month> {
        (1..=12).map(Month)
    }

    #[must_use]
    pub fn number(self) -> u32 {
        u32::from(self.0)
    }

    /// Full English name, e.g. "January"
    #[must_use]
    pub fn name(self) -> &'static str {
        NAMES[usize::from(self.0 - 1)]
    }

    /// Three-letter abbreviation, e.g. "Jan"
    #[must_use]
    pub fn short_name(self) -> &'static str {
        &self.name()[..3]
    }
}

impl Default for Month {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Month {
    type Error = TempcastError;

    fn try_from(value: u32) -> Result<Self> {
        Month::new(value)
    }
}

impl From<Month> for u32 {
    fn from(month: Month) -> Self {
        month.number()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "January", "Jan")]
    #[case(5, "May", "May")]
    #[case(7, "July", "Jul")]
    #[case(9, "September", "Sep")]
    #[case(12, "December", "Dec")]
    fn test_month_names(#[case] number: u32, #[case] name: &str, #[case] short: &str) {
        let month = Month::new(number).unwrap();
        assert_eq!(month.name(), name);
        assert_eq!(month.short_name(), short);
        assert_eq!(month.number(), number);
    }

    #[rstest]
    #[case(0)]
    #[case(13)]
    #[case(u32::MAX)]
    fn test_month_out_of_range(#[case] number: u32) {
        assert!(matches!(
            Month::new(number),
            Err(TempcastError::Validation { .. })
        ));
    }

    #[test]
    fn test_all_months_in_calendar_order() {
        let numbers: Vec<u32> = Month::all().map(Month::number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_default_is_july() {
        assert_eq!(Month::default().name(), "July");
    }

    #[test]
    fn test_month_serde() {
        let month: Month = serde_json::from_str("3").unwrap();
        assert_eq!(month.name(), "March");
        assert_eq!(serde_json::to_string(&month).unwrap(), "3");
        assert!(serde_json::from_str::<Month>("14").is_err());
    }
}
