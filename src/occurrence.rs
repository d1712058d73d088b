use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use thiserror::Error;
use tracing::debug;

use crate::models::{Frequency, Ordinal, ServiceCategory, ServiceDay};

/// Default search window past the effective start, roughly two years.
pub const DEFAULT_HORIZON_DAYS: u32 = 731;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OccurrenceError {
    #[error("service must run on at least one weekday")]
    NoWeekdays,
    #[error("cycle must be a positive number")]
    InvalidCycle,
    #[error("recurring services run on exactly one weekday, got {0}")]
    RecurringWeekdays(usize),
    #[error("multi-day one-time services need an end date")]
    MissingEndDate,
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("ordinal {0:?} requires MONTHLY frequency")]
    OrdinalWithoutMonthly(Ordinal),
    #[error("MONTHLY services need an ordinal other than NEXT")]
    MonthlyWithoutOrdinal,
    #[error("service date {0} does not fall on a configured weekday")]
    DateOffSchedule(NaiveDate),
}

/// Spacing rule shared by every category: which weekdays qualify and how
/// qualifying dates are thinned out. Cycles count from `anchor`, so a series
/// does not shift when it is evaluated from a different reference date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    weekdays: Vec<Weekday>,
    frequency: Frequency,
    ordinal: Ordinal,
    cycle: u32,
    anchor: NaiveDate,
}

impl Rule {
    pub fn new(
        weekdays: &[Weekday],
        frequency: Frequency,
        ordinal: Ordinal,
        cycle: i32,
        anchor: NaiveDate,
    ) -> Result<Self, OccurrenceError> {
        if weekdays.is_empty() {
            return Err(OccurrenceError::NoWeekdays);
        }
        let cycle = u32::try_from(cycle)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(OccurrenceError::InvalidCycle)?;
        match (frequency, ordinal) {
            (Frequency::Monthly, Ordinal::Next) => {
                return Err(OccurrenceError::MonthlyWithoutOrdinal);
            }
            (Frequency::Daily | Frequency::Weekly, ordinal) if ordinal != Ordinal::Next => {
                return Err(OccurrenceError::OrdinalWithoutMonthly(ordinal));
            }
            _ => {}
        }

        let mut days = weekdays.to_vec();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();

        Ok(Self {
            weekdays: days,
            frequency,
            ordinal,
            cycle,
            anchor,
        })
    }

    /// Builds the rule for a service definition, rejecting misconfigured ones.
    pub fn for_service(service: &ServiceDay) -> Result<Self, OccurrenceError> {
        if service.days.is_empty() {
            return Err(OccurrenceError::NoWeekdays);
        }
        if let Some(end) = service.end_date
            && end < service.start_date
        {
            return Err(OccurrenceError::EndBeforeStart {
                start: service.start_date,
                end,
            });
        }

        match service.category {
            ServiceCategory::OnetimeOneday => {
                if !service.days.contains(&service.start_date.weekday()) {
                    return Err(OccurrenceError::DateOffSchedule(service.start_date));
                }
                // Only the start date matters; spacing settings are ignored.
                return Self::new(
                    &service.days,
                    Frequency::Weekly,
                    Ordinal::Next,
                    1,
                    service.start_date,
                );
            }
            ServiceCategory::Recurring => {
                let distinct = distinct_weekdays(&service.days);
                if distinct != 1 {
                    return Err(OccurrenceError::RecurringWeekdays(distinct));
                }
            }
            ServiceCategory::OnetimeMultiday if service.end_date.is_none() => {
                return Err(OccurrenceError::MissingEndDate);
            }
            _ => {}
        }

        Self::new(
            &service.days,
            service.frequency,
            service.ordinal,
            service.cycle,
            service.start_date,
        )
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        if date < self.anchor || !self.weekdays.contains(&date.weekday()) {
            return false;
        }
        let cycle = i64::from(self.cycle);
        match self.frequency {
            Frequency::Weekly => {
                // Weeks start on the anchor's weekday.
                let week = (date - self.anchor).num_days() / 7;
                week % cycle == 0
            }
            Frequency::Daily => self.candidate_index(date) % cycle == 0,
            Frequency::Monthly => {
                let month_offset = months_between(self.anchor, date);
                month_offset % cycle == 0 && self.matches_ordinal(date)
            }
        }
    }

    /// Number of allowed-weekday dates in `[anchor, date)`.
    fn candidate_index(&self, date: NaiveDate) -> i64 {
        let days = (date - self.anchor).num_days();
        let full_weeks = days / 7;
        let per_week = self.weekdays.len() as i64;
        let partial = self
            .anchor
            .checked_add_days(Days::new((full_weeks * 7) as u64))
            .map(|week_start| {
                week_start
                    .iter_days()
                    .take_while(|d| *d < date)
                    .filter(|d| self.weekdays.contains(&d.weekday()))
                    .count() as i64
            })
            .unwrap_or(0);
        full_weeks * per_week + partial
    }

    fn matches_ordinal(&self, date: NaiveDate) -> bool {
        match self.ordinal {
            Ordinal::Last => date
                .checked_add_days(Days::new(7))
                .is_none_or(|later| later.month() != date.month()),
            ordinal => ordinal
                .week_index()
                .is_some_and(|index| date.day0() / 7 == index),
        }
    }
}

fn distinct_weekdays(days: &[Weekday]) -> usize {
    let mut seen: Vec<Weekday> = Vec::with_capacity(days.len());
    for day in days {
        if !seen.contains(day) {
            seen.push(*day);
        }
    }
    seen.len()
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let months = |d: NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
    months(to) - months(from)
}

/// Walks forward from `max(from, anchor)` and collects up to `count` dates the
/// rule accepts. The walk stops at `until` or `horizon_days` past its start,
/// whichever comes first, so it can return fewer than `count` dates.
pub fn next_dates(
    rule: &Rule,
    from: NaiveDate,
    until: Option<NaiveDate>,
    count: usize,
    horizon_days: u32,
) -> Vec<NaiveDate> {
    let start = from.max(rule.anchor);
    let limit = start
        .checked_add_days(Days::new(horizon_days.into()))
        .unwrap_or(NaiveDate::MAX);
    let last = until.map_or(limit, |until| until.min(limit));

    start
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| rule.matches(*d))
        .take(count)
        .collect()
}

/// Dates on which `service` occurs, starting on `from` when it qualifies.
pub fn occurrences(
    service: &ServiceDay,
    from: NaiveDate,
    count: usize,
    horizon_days: u32,
) -> Result<Vec<NaiveDate>, OccurrenceError> {
    let rule = Rule::for_service(service)?;
    let until = match service.category {
        ServiceCategory::OnetimeOneday => Some(
            service
                .end_date
                .map_or(service.start_date, |end| end.min(service.start_date)),
        ),
        _ => service.end_date,
    };

    let dates = next_dates(&rule, from, until, count, horizon_days);
    if dates.len() < count {
        debug!(
            service = %service.id,
            requested = count,
            found = dates.len(),
            "ran out of qualifying dates"
        );
    }
    Ok(dates)
}

/// Date a new ride request should default to: the next occurrence, skipping
/// today once the service has started.
pub fn default_request_date(
    service: &ServiceDay,
    now: NaiveDateTime,
    horizon_days: u32,
) -> Result<Option<NaiveDate>, OccurrenceError> {
    let today = now.date();
    let dates = occurrences(service, today, 2, horizon_days)?;
    let started_today = |date: &NaiveDate| *date == today && now.time() >= service.time;
    Ok(dates.into_iter().find(|date| !started_today(date)))
}

pub fn validate(service: &ServiceDay) -> Result<(), OccurrenceError> {
    Rule::for_service(service).map(|_| ())
}
