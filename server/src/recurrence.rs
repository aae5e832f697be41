//! Expansion of recurring event series into individual event dates
//!
//! All computations work on calendar dates ([NaiveDate]), never on instants, so the result does
//! not depend on the time zone of server or client.

use crate::data_store::models::NewEvent;
use crate::data_store::GroupId;
use chrono::{Datelike, Days, NaiveDate};
use groupplan_api_types::{Frequency, RecurringEventsRequest};

/// Maximum number of events a single series may expand to
pub const MAX_SERIES_LENGTH: usize = 1000;

#[derive(Debug, PartialEq)]
pub enum RecurrenceError {
    /// A daily or weekly series with an empty set of weekdays
    EmptyDayFilter,
    /// A weekday index outside of 0 (Sunday) to 6 (Saturday)
    InvalidWeekday(u8),
    TooManyEvents,
}

impl std::fmt::Display for RecurrenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDayFilter => f.write_str("At least one day of the week must be selected."),
            Self::InvalidWeekday(day) => write!(
                f,
                "{} is not a valid day of the week. Expected 0 (Sunday) to 6 (Saturday).",
                day
            ),
            Self::TooManyEvents => write!(
                f,
                "The series would contain more than {} events.",
                MAX_SERIES_LENGTH
            ),
        }
    }
}

impl std::error::Error for RecurrenceError {}

/// Calculate the dates of a recurring series between `start` and `end` (both inclusive).
///
/// For daily and weekly series with a day filter, every day in the range with a selected weekday
/// (Sunday = 0) is included. Otherwise, the series steps from `start` by one day, 7 days, 14 days
/// or one calendar month, depending on the frequency. The day filter is ignored for biweekly and
/// monthly series.
///
/// If `start` is after `end`, the result is empty.
pub fn series_dates(
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
    days_of_week: Option<&[u8]>,
) -> Result<Vec<NaiveDate>, RecurrenceError> {
    let day_filter = match (frequency, days_of_week) {
        (Frequency::Daily | Frequency::Weekly, Some(days)) => Some(weekday_mask(days)?),
        _ => None,
    };

    let mut result = Vec::new();
    let mut push = |date: NaiveDate| {
        if result.len() >= MAX_SERIES_LENGTH {
            return Err(RecurrenceError::TooManyEvents);
        }
        result.push(date);
        Ok(())
    };

    if let Some(mask) = day_filter {
        for date in start.iter_days().take_while(|d| *d <= end) {
            if mask[date.weekday().num_days_from_sunday() as usize] {
                push(date)?;
            }
        }
    } else {
        let mut date = Some(start);
        while let Some(current) = date.filter(|d| *d <= end) {
            push(current)?;
            date = next_occurrence(current, frequency);
        }
    }
    Ok(result)
}

fn weekday_mask(days: &[u8]) -> Result<[bool; 7], RecurrenceError> {
    if days.is_empty() {
        return Err(RecurrenceError::EmptyDayFilter);
    }
    let mut mask = [false; 7];
    for &day in days {
        *mask
            .get_mut(day as usize)
            .ok_or(RecurrenceError::InvalidWeekday(day))? = true;
    }
    Ok(mask)
}

/// Step to the next date of an interval-based series. Returns None at the end of the calendar.
fn next_occurrence(date: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Biweekly => date.checked_add_days(Days::new(14)),
        Frequency::Monthly => add_month_overflowing(date),
    }
}

/// Add one calendar month, keeping the day of month. If that day does not exist in the next
/// month, the surplus days overflow into the following month, e.g. 2024-01-31 becomes
/// 2024-03-02. Subsequent steps continue from the shifted date.
fn add_month_overflowing(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(date.day() - 1)))
}

/// Build the new events of a recurring series for the given group. Title and capacity are
/// validated by the data store on creation.
pub fn build_series(
    request: RecurringEventsRequest,
    group_id: GroupId,
) -> Result<Vec<NewEvent>, RecurrenceError> {
    let dates = series_dates(
        request.start_date,
        request.end_date,
        request.frequency,
        request.days_of_week.as_deref(),
    )?;
    Ok(dates
        .into_iter()
        .map(|event_date| NewEvent {
            group_id,
            creator_id: None,
            location_id: request.location_id,
            title: request.title.clone(),
            event_date,
            start_time: request.start_time,
            end_time: request.end_time,
            capacity: request.capacity,
        })
        .collect())
}
