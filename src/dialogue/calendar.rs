//! Bounded date picker used for the birthdate step.
//!
//! A small state machine of its own: year, then month, then day. Each pick
//! either narrows the selection ([`CalendarProgress::Pending`]) or finishes it
//! ([`CalendarProgress::Resolved`]). The outer dialogue only advances on
//! `Resolved`.

use crate::error::FieldError;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// One pick from the calendar keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarInput {
    Year(i32),
    Month(u32),
    Day(u32),
    Back,
}

/// Which part of the date is being picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarStep {
    Year,
    Month,
    Day,
}

impl CalendarStep {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
        }
    }
}

/// What the host should render for the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub step: CalendarStep,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Selectable values for `step`, ascending.
    pub options: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarProgress {
    Pending(CalendarView),
    Resolved(NaiveDate),
}

/// Year/month/day stepper bounded to `[min, max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarStepper {
    min: NaiveDate,
    max: NaiveDate,
    year: Option<i32>,
    month: Option<u32>,
}

impl CalendarStepper {
    pub fn new(min: NaiveDate, max: NaiveDate) -> Self {
        Self {
            min,
            max,
            year: None,
            month: None,
        }
    }

    pub fn step(&self) -> CalendarStep {
        match (self.year, self.month) {
            (None, _) => CalendarStep::Year,
            (Some(_), None) => CalendarStep::Month,
            (Some(_), Some(_)) => CalendarStep::Day,
        }
    }

    /// Render the current step.
    pub fn view(&self) -> CalendarView {
        let options = match (self.year, self.month) {
            (None, _) => (self.min.year()..=self.max.year()).map(i64::from).collect(),
            (Some(year), None) => (1..=12u32)
                .filter(|&m| self.month_in_range(year, m))
                .map(i64::from)
                .collect(),
            (Some(year), Some(month)) => (1..=31u32)
                .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
                .filter(|date| self.contains(*date))
                .map(|date| i64::from(date.day()))
                .collect(),
        };
        CalendarView {
            step: self.step(),
            year: self.year,
            month: self.month,
            options,
        }
    }

    /// Apply one pick. On error the selection is left unchanged.
    pub fn apply(&mut self, input: CalendarInput) -> Result<CalendarProgress, FieldError> {
        match input {
            CalendarInput::Year(year) => {
                if year < self.min.year() || year > self.max.year() {
                    return Err(FieldError::CalendarOutOfRange {
                        step: "year",
                        value: i64::from(year),
                    });
                }
                self.year = Some(year);
                self.month = None;
            }
            CalendarInput::Month(month) => {
                let Some(year) = self.year else {
                    return Err(FieldError::UnexpectedInput);
                };
                if !(1..=12).contains(&month) || !self.month_in_range(year, month) {
                    return Err(FieldError::CalendarOutOfRange {
                        step: "month",
                        value: i64::from(month),
                    });
                }
                self.month = Some(month);
            }
            CalendarInput::Day(day) => {
                let (Some(year), Some(month)) = (self.year, self.month) else {
                    return Err(FieldError::UnexpectedInput);
                };
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                    FieldError::MalformedDate(format!("{year:04}-{month:02}-{day:02}"))
                })?;
                if !self.contains(date) {
                    return Err(FieldError::DateOutOfRange(date));
                }
                return Ok(CalendarProgress::Resolved(date));
            }
            CalendarInput::Back => match self.step() {
                CalendarStep::Day => self.month = None,
                CalendarStep::Month => self.year = None,
                CalendarStep::Year => {}
            },
        }
        Ok(CalendarProgress::Pending(self.view()))
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.min && date <= self.max
    }

    fn month_in_range(&self, year: i32, month: u32) -> bool {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return false;
        };
        let last = first
            .checked_add_months(chrono::Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(first);
        last >= self.min && first <= self.max
    }
}
