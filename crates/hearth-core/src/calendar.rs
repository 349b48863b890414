#![forbid(unsafe_code)]

//! Local-date arithmetic for calendar views.
//!
//! Dates are plain [`NaiveDate`] values in the household's local calendar.
//! There is no time-zone handling beyond reading "today" from the local
//! clock.
//!
//! # Edge Cases
//!
//! | Case | Behavior |
//! |------|----------|
//! | Jan 31 + 1 month | Clamped to the last day of February |
//! | Step past `NaiveDate::MAX` / before `MIN` | Saturates at the bound |

use std::fmt;

use chrono::{Datelike, Days, Local, Months, NaiveDate};

/// Today's date on the local clock.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(NaiveDate::MIN)
}

/// First and last day of the month containing `date`.
#[must_use]
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

/// A navigation step in a calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarStep {
    NextDay,
    PrevDay,
    NextWeek,
    PrevWeek,
    NextMonth,
    PrevMonth,
    Today,
}

impl CalendarStep {
    /// Parse the names used by the command surface: `next`, `prev`,
    /// `next-week`, `prev-week`, `next-month`, `prev-month`, `today`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "next" | "next-day" => Some(Self::NextDay),
            "prev" | "prev-day" => Some(Self::PrevDay),
            "next-week" => Some(Self::NextWeek),
            "prev-week" => Some(Self::PrevWeek),
            "next-month" => Some(Self::NextMonth),
            "prev-month" => Some(Self::PrevMonth),
            "today" => Some(Self::Today),
            _ => None,
        }
    }

    /// Step `date`, reading the local clock for [`CalendarStep::Today`].
    #[must_use]
    pub fn apply(self, date: NaiveDate) -> NaiveDate {
        self.apply_from(date, today())
    }

    /// Step `date` with an explicit "today".
    #[must_use]
    pub fn apply_from(self, date: NaiveDate, today: NaiveDate) -> NaiveDate {
        let forward = |stepped: Option<NaiveDate>| stepped.unwrap_or(NaiveDate::MAX);
        let backward = |stepped: Option<NaiveDate>| stepped.unwrap_or(NaiveDate::MIN);
        match self {
            Self::NextDay => forward(date.checked_add_days(Days::new(1))),
            Self::PrevDay => backward(date.checked_sub_days(Days::new(1))),
            Self::NextWeek => forward(date.checked_add_days(Days::new(7))),
            Self::PrevWeek => backward(date.checked_sub_days(Days::new(7))),
            Self::NextMonth => forward(date.checked_add_months(Months::new(1))),
            Self::PrevMonth => backward(date.checked_sub_months(Months::new(1))),
            Self::Today => today,
        }
    }
}

impl fmt::Display for CalendarStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NextDay => "next",
            Self::PrevDay => "prev",
            Self::NextWeek => "next-week",
            Self::PrevWeek => "prev-week",
            Self::NextMonth => "next-month",
            Self::PrevMonth => "prev-month",
            Self::Today => "today",
        };
        f.write_str(name)
    }
}
