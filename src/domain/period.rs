use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use super::errors::DomainError;

/// Calendar days accepted in filters; anything outside has no day after it
/// or no database representation.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

fn check_day(day: NaiveDate) -> Result<NaiveDate, DomainError> {
    if YEARS.contains(&day.year()) {
        Ok(day)
    } else {
        Err(DomainError::invalid(format!("date {day} is out of range")))
    }
}

/// Inclusive range of calendar days (UTC). Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: Some(day),
            end: Some(day),
        }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::invalid(format!(
                "end date {end} is before start date {start}"
            )));
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Builds the range from the query shapes the API accepts: a single day
    /// wins over a start/end pair, and no dates at all means "unfiltered".
    pub fn from_parts(
        single: Option<NaiveDate>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Self>, DomainError> {
        if let Some(day) = single {
            return Ok(Some(Self::single(check_day(day)?)));
        }
        let start = start.map(check_day).transpose()?;
        let end = end.map(check_day).transpose()?;
        match (start, end) {
            (None, None) => Ok(None),
            (Some(s), Some(e)) => Self::between(s, e).map(Some),
            (start, end) => Ok(Some(Self { start, end })),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Half-open instant bounds `[start 00:00, day after end 00:00)`.
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let from = self.start.map(start_of_day);
        let until = self.end.and_then(|d| d.succ_opt()).map(start_of_day);
        (from, until)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (from, until) = self.bounds();
        from.map_or(true, |f| at >= f) && until.map_or(true, |u| at < u)
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::default()).and_utc()
}
