use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    /// Weekly service on a single weekday.
    Recurring,
    /// A single dated service.
    OnetimeOneday,
    /// A bounded run of days, e.g. a revival week.
    OnetimeMultiday,
    /// An open-ended schedule over several weekdays.
    FrequentMultiday,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ordinal {
    #[default]
    Next,
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Ordinal {
    /// Zero-based week-of-month slot, `None` for `Next` and `Last`.
    pub fn week_index(self) -> Option<u32> {
        match self {
            Ordinal::First => Some(0),
            Ordinal::Second => Some(1),
            Ordinal::Third => Some(2),
            Ordinal::Fourth => Some(3),
            Ordinal::Next | Ordinal::Last => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ServiceDay {
    #[schema(example = "sunday-worship")]
    pub id: String,
    #[schema(example = "Sunday Worship")]
    pub name: String,
    #[schema(value_type = String, example = "10:30:00")]
    pub time: NaiveTime,
    #[schema(value_type = Vec<String>, example = json!(["Sun"]))]
    pub days: Vec<Weekday>,
    pub category: ServiceCategory,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub ordinal: Ordinal,
    #[schema(value_type = String, format = "date", example = "2026-01-04")]
    pub start_date: NaiveDate,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_cycle")]
    pub cycle: i32,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
}

fn default_cycle() -> i32 {
    1
}

impl ServiceDay {
    pub fn starts_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Occurrence {
    pub service_id: String,
    pub service_name: String,
    #[schema(value_type = String, format = "date", example = "2026-10-18")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time", example = "2026-10-18T10:30:00")]
    pub starts_at: NaiveDateTime,
}

impl Occurrence {
    pub fn new(service: &ServiceDay, date: NaiveDate) -> Self {
        Self {
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            date,
            starts_at: service.starts_at(date),
        }
    }
}
