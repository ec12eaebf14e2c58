//! Calendar agent: gigs, sessions, rehearsals, lessons and meetings.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, VariantNames};

use super::{prompt_date, registry, service_tool, Domain};
use crate::config::ArtistProfile;
use crate::error::MuseError;
use crate::tools::{AgentToolParameters, ToolRegistry};

pub const AGENT_NAME: &str = "CalendarAgent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Gig,
    Session,
    Rehearsal,
    Lesson,
    Meeting,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

/// Input of `create_event`. Times are ISO 8601 strings as sent by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub event_type: EventType,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub load_in_time: Option<String>,
    #[serde(default)]
    pub soundcheck_time: Option<String>,
    #[serde(default)]
    pub set_time: Option<String>,
    #[serde(default)]
    pub pay: Option<f64>,
    #[serde(default)]
    pub pay_notes: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub gear_notes: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRange {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub event_type: Option<EventType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub event_id: String,
    pub updates: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRef {
    pub event_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub search_start: String,
    pub search_end: String,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: f64,
}

fn default_duration_hours() -> f64 {
    2.0
}

/// Calendar storage the agent's tools call into.
#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn create_event(&self, event: NewEvent) -> Result<Value, MuseError>;
    async fn list_events(&self, range: EventRange) -> Result<Value, MuseError>;
    async fn update_event(&self, update: EventUpdate) -> Result<Value, MuseError>;
    async fn delete_event(&self, event: EventRef) -> Result<Value, MuseError>;
    async fn check_conflicts(&self, window: TimeWindow) -> Result<Value, MuseError>;
    async fn find_availability(&self, query: AvailabilityQuery) -> Result<Value, MuseError>;
}

pub fn persona_prompt(profile: &ArtistProfile, today: NaiveDate) -> String {
    format!(
        "You are the Calendar Agent for Muse, the assistant that runs the business side of {artist}'s music career.

You keep the artist's schedule: creating events, catching conflicts, finding open time and keeping everything tidy.

Know the event types:
- Gigs have load-in, soundcheck, set and end times. Load-in usually lands 2-4 hours before the set. Always ask about pay.
- Sessions are booked in blocks of 4-8 hours. Ask about the studio, engineer and rate.
- Rehearsals run 2-3 hours. Ask where and who is coming.
- Lessons usually repeat weekly. Ask about the student and location.
- Meetings cover everything else: labels, booking agents, press.

Rules:
1. Call check_conflicts before every create_event. If something overlaps, lay out the conflict and offer options.
2. Fill gaps with sensible defaults and confirm them: a gig ends 4 hours after the set, a session is a 4-hour block, a rehearsal lasts 2.5 hours.
3. Read relative dates naturally (\"next Thursday\" is the coming Thursday).
4. After creating an event, show a short summary. List events chronologically, grouped by day.
5. Capture pay whenever it is mentioned; invoicing depends on it.

Today is {today}. The artist's timezone is {timezone}. Talk in 12-hour time, call tools with ISO 8601. Keep it brief.",
        artist = profile.artist_name,
        today = prompt_date(today),
        timezone = profile.timezone,
    )
}

pub fn tools(service: Option<Arc<dyn CalendarService>>) -> Result<ToolRegistry, MuseError> {
    let domain = Domain::Calendar;
    registry(vec![
        service_tool(
            &service,
            domain,
            "create_event",
            "Create an event on the artist's calendar. Run check_conflicts first.",
            AgentToolParameters::object()
                .string("title", "Event title, e.g. 'Live at The Earl'", true)
                .string_enum("event_type", "Kind of event", EventType::VARIANTS, true)
                .string("start_time", "Start time, ISO 8601", true)
                .string("end_time", "End time, ISO 8601", true)
                .string("venue", "Venue or studio name", false)
                .string("address", "Venue address", false)
                .string("load_in_time", "Load-in time, ISO 8601 (gigs)", false)
                .string("soundcheck_time", "Soundcheck time, ISO 8601 (gigs)", false)
                .string("set_time", "Set start time, ISO 8601 (gigs)", false)
                .number("pay", "Pay in USD", false)
                .string("pay_notes", "Pay details, e.g. '$300 + door split'", false)
                .string("contact_name", "Booking contact", false)
                .string("contact_info", "Contact email or phone", false)
                .string("gear_notes", "What to bring", false)
                .string_enum("status", "Event status. Default: confirmed", EventStatus::VARIANTS, false)
                .string("notes", "Anything else", false)
                .build(),
            |svc: Arc<dyn CalendarService>, input: NewEvent| async move { svc.create_event(input).await },
        ),
        service_tool(
            &service,
            domain,
            "list_events",
            "List events in a date range.",
            AgentToolParameters::object()
                .string("start_date", "Range start, ISO 8601", true)
                .string("end_date", "Range end, ISO 8601", true)
                .string_enum("event_type", "Only this kind of event", EventType::VARIANTS, false)
                .build(),
            |svc: Arc<dyn CalendarService>, input: EventRange| async move { svc.list_events(input).await },
        ),
        service_tool(
            &service,
            domain,
            "update_event",
            "Change fields on an existing event, by id from list_events.",
            AgentToolParameters::object()
                .string("event_id", "Event id", true)
                .object("updates", "Fields to change, e.g. {\"pay\": 500}", true)
                .build(),
            |svc: Arc<dyn CalendarService>, input: EventUpdate| async move { svc.update_event(input).await },
        ),
        service_tool(
            &service,
            domain,
            "delete_event",
            "Cancel an event, by id from list_events.",
            AgentToolParameters::object()
                .string("event_id", "Event id", true)
                .build(),
            |svc: Arc<dyn CalendarService>, input: EventRef| async move { svc.delete_event(input).await },
        ),
        service_tool(
            &service,
            domain,
            "check_conflicts",
            "Find events overlapping a time range. Always call before create_event.",
            AgentToolParameters::object()
                .string("start_time", "Range start, ISO 8601", true)
                .string("end_time", "Range end, ISO 8601", true)
                .build(),
            |svc: Arc<dyn CalendarService>, input: TimeWindow| async move { svc.check_conflicts(input).await },
        ),
        service_tool(
            &service,
            domain,
            "find_availability",
            "Find open slots in a date range.",
            AgentToolParameters::object()
                .string("search_start", "Range start, ISO 8601", true)
                .string("search_end", "Range end, ISO 8601", true)
                .number("duration_hours", "Minimum slot length in hours. Default: 2", false)
                .build(),
            |svc: Arc<dyn CalendarService>, input: AvailabilityQuery| async move {
                svc.find_availability(input).await
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentToolCall;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCalendar {
        created: Mutex<Vec<NewEvent>>,
        availability: Mutex<Vec<AvailabilityQuery>>,
    }

    #[async_trait]
    impl CalendarService for RecordingCalendar {
        async fn create_event(&self, event: NewEvent) -> Result<Value, MuseError> {
            self.created.lock().unwrap().push(event);
            Ok(json!({"id": "evt-1"}))
        }
        async fn list_events(&self, _range: EventRange) -> Result<Value, MuseError> {
            Ok(json!([]))
        }
        async fn update_event(&self, _update: EventUpdate) -> Result<Value, MuseError> {
            Ok(json!({"updated": true}))
        }
        async fn delete_event(&self, _event: EventRef) -> Result<Value, MuseError> {
            Ok(json!({"deleted": true}))
        }
        async fn check_conflicts(&self, _window: TimeWindow) -> Result<Value, MuseError> {
            Ok(json!({"conflicts": []}))
        }
        async fn find_availability(&self, query: AvailabilityQuery) -> Result<Value, MuseError> {
            self.availability.lock().unwrap().push(query);
            Ok(json!({"slots": []}))
        }
    }

    fn call(name: &str, arguments: Value) -> AgentToolCall {
        AgentToolCall {
            id: "t1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[tokio::test]
    async fn create_event_applies_defaults() {
        let calendar = Arc::new(RecordingCalendar::default());
        let tools = tools(Some(calendar.clone())).unwrap();
        let result = tools
            .dispatch(
                &call(
                    "create_event",
                    json!({
                        "title": "Live at The Earl",
                        "event_type": "gig",
                        "start_time": "2026-02-21T20:00:00",
                        "end_time": "2026-02-21T23:00:00",
                        "pay": 400
                    }),
                ),
                AGENT_NAME,
            )
            .await;
        assert!(!result.is_error, "{}", result.content);

        let created = calendar.created.lock().unwrap();
        assert_eq!(created[0].event_type, EventType::Gig);
        assert_eq!(created[0].status, EventStatus::Confirmed);
        assert_eq!(created[0].pay, Some(400.0));
        assert_eq!(created[0].venue, "");
    }

    #[tokio::test]
    async fn find_availability_defaults_to_two_hours() {
        let calendar = Arc::new(RecordingCalendar::default());
        let tools = tools(Some(calendar.clone())).unwrap();
        tools
            .dispatch(
                &call(
                    "find_availability",
                    json!({"search_start": "2026-02-16", "search_end": "2026-02-20"}),
                ),
                AGENT_NAME,
            )
            .await;
        assert_eq!(calendar.availability.lock().unwrap()[0].duration_hours, 2.0);
    }

    #[tokio::test]
    async fn unknown_event_type_is_rejected_before_the_service() {
        let calendar = Arc::new(RecordingCalendar::default());
        let tools = tools(Some(calendar.clone())).unwrap();
        let result = tools
            .dispatch(
                &call(
                    "create_event",
                    json!({
                        "title": "Party",
                        "event_type": "party",
                        "start_time": "2026-02-21T20:00:00",
                        "end_time": "2026-02-21T23:00:00"
                    }),
                ),
                AGENT_NAME,
            )
            .await;
        assert!(result.is_error);
        assert!(result.content.starts_with("Invalid input for tool 'create_event'"));
        assert!(calendar.created.lock().unwrap().is_empty());
    }

    #[test]
    fn schema_lists_event_types() {
        let tools = tools(None).unwrap();
        let spec = tools.get("create_event").unwrap().spec();
        assert_eq!(
            spec.input_schema["properties"]["event_type"]["enum"],
            json!(["gig", "session", "rehearsal", "lesson", "meeting", "other"])
        );
        assert_eq!(
            spec.input_schema["required"],
            json!(["title", "event_type", "start_time", "end_time"])
        );
    }
}
