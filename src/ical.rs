use chrono::Duration;
use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::{Occurrence, ServiceDay};

const DEFAULT_DURATION_MIN: u32 = 60;

#[derive(Clone)]
pub struct ICalExporter {
    calendar_name: String,
}

impl ICalExporter {
    pub fn new(calendar_name: impl Into<String>) -> Self {
        Self {
            calendar_name: calendar_name.into(),
        }
    }

    pub fn generate(&self, service: &ServiceDay, occurrences: &[Occurrence]) -> Vec<u8> {
        if occurrences.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name(&format!("{}: {}", self.calendar_name, service.name));

        let duration = service.duration_minutes.unwrap_or(DEFAULT_DURATION_MIN);
        for item in occurrences {
            let mut event = Event::new();
            event.summary(&item.service_name);
            event.starts(item.starts_at);
            event.ends(item.starts_at + Duration::minutes(i64::from(duration)));
            if let Some(location) = &service.location {
                event.location(location);
            }
            event.description(&format!(
                "{}\nRide requests open for this service.",
                self.calendar_name
            ));
            event.uid(&format!(
                "{}-{}-church-rides",
                item.service_id,
                item.date.format("%Y%m%d")
            ));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}
