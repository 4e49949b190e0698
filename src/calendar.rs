// src/calendar.rs
//! Calendar periods backing the day/week/month/year relation databases.
//!
//! Everything here is pure date arithmetic: the page title a date maps to in
//! each database, the date range that page covers, and its icon.

use crate::constants::{
    DATE_ICON_BASE_URL, DAY_PROPERTY, MONTH_PROPERTY, WEEK_PROPERTY, YEAR_PROPERTY,
};
use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;

/// One level of the calendar hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl CalendarPeriod {
    pub const ALL: [CalendarPeriod; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    /// Name used by the icon service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Relation property on the episode database pointing at this period's database.
    pub fn relation_property(&self) -> &'static str {
        match self {
            Self::Day => DAY_PROPERTY,
            Self::Week => WEEK_PROPERTY,
            Self::Month => MONTH_PROPERTY,
            Self::Year => YEAR_PROPERTY,
        }
    }

    /// Page title for the period containing `date`.
    ///
    /// Weeks follow ISO 8601, so early January can belong to the previous
    /// year's last week: 2021-01-01 is `2020年第53周`.
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y年%m月%d日").to_string(),
            Self::Week => {
                let week = date.iso_week();
                format!("{}年第{}周", week.year(), week.week())
            }
            Self::Month => date.format("%Y年%m月").to_string(),
            Self::Year => date.format("%Y").to_string(),
        }
    }

    /// First and last day (inclusive) of the period containing `date`.
    pub fn range(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Day => (date, date),
            Self::Week => {
                let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
                (monday, monday + Days::new(6))
            }
            Self::Month => {
                let first = date - Days::new(u64::from(date.day0()));
                (first, first + Months::new(1) - Days::new(1))
            }
            Self::Year => {
                let first = date - Days::new(u64::from(date.ordinal0()));
                (first, first + Months::new(12) - Days::new(1))
            }
        }
    }

    /// Icon URL rendered by the date-icon service.
    pub fn icon_url(&self, date: NaiveDate) -> String {
        format!(
            "{}?type={}&date={}",
            DATE_ICON_BASE_URL,
            self.as_str(),
            date.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for CalendarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
