//! Detection events as delivered by `/events/*`

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned event identifier
pub type EventId = i64;

/// Server-assigned user identifier
pub type UserId = i64;

/// Default number of events requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page the backend accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Classification produced by the detection pipeline
///
/// Unknown strings from newer backends decode as [`EventType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FastMovement,
    Loitering,
    ErraticMovement,
    Theft,
    SuspiciousBehavior,
    #[serde(other)]
    Other,
}

impl EventType {
    /// Wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::FastMovement => "fast_movement",
            EventType::Loitering => "loitering",
            EventType::ErraticMovement => "erratic_movement",
            EventType::Theft => "theft",
            EventType::SuspiciousBehavior => "suspicious_behavior",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPS position of the camera that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// An immutable detection event
///
/// Fields are read through accessors only. A change such as marking the
/// event read produces a new value with the same id (see [`Event::with_read`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventRecord", into = "EventRecord")]
pub struct Event {
    id: EventId,
    user_id: UserId,
    event_type: EventType,
    description: Option<String>,
    image_path: Option<String>,
    confidence: f64,
    timestamp: DateTime<Utc>,
    is_read: bool,
    camera_id: Option<String>,
    location: Option<Location>,
}

impl Event {
    /// Create an unread event with no optional fields set
    ///
    /// `confidence` is clamped into `[0, 1]`.
    pub fn new(
        id: EventId,
        user_id: UserId,
        event_type: EventType,
        confidence: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            event_type,
            description: None,
            image_path: None,
            confidence: clamp_confidence(confidence),
            timestamp,
            is_read: false,
            camera_id: None,
            location: None,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn camera_id(&self) -> Option<&str> {
        self.camera_id.as_deref()
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Copy of this event with `is_read` replaced
    pub fn with_read(&self, is_read: bool) -> Self {
        Self {
            is_read,
            ..self.clone()
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_image_path(self, image_path: impl Into<String>) -> Self {
        Self {
            image_path: Some(image_path.into()),
            ..self
        }
    }

    pub fn with_camera_id(self, camera_id: impl Into<String>) -> Self {
        Self {
            camera_id: Some(camera_id.into()),
            ..self
        }
    }

    pub fn with_location(self, location: Location) -> Self {
        Self {
            location: Some(location),
            ..self
        }
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Flat JSON shape of an event
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    id: EventId,
    user_id: UserId,
    event_type: EventType,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_path: Option<String>,
    confidence: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    camera_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        // Coordinates only make sense as a pair
        let location = match (record.latitude, record.longitude) {
            (Some(lat), Some(lon)) => Some(Location { lat, lon }),
            _ => None,
        };

        Self {
            id: record.id,
            user_id: record.user_id,
            event_type: record.event_type,
            description: record.description,
            image_path: record.image_path,
            confidence: clamp_confidence(record.confidence),
            timestamp: record.timestamp,
            is_read: record.is_read,
            camera_id: record.camera_id,
            location,
        }
    }
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            event_type: event.event_type,
            description: event.description,
            image_path: event.image_path,
            confidence: event.confidence,
            timestamp: event.timestamp,
            is_read: event.is_read,
            camera_id: event.camera_id,
            latitude: event.location.map(|l| l.lat),
            longitude: event.location.map(|l| l.lon),
        }
    }
}

/// Parse an ISO-8601 timestamp, with or without an offset
///
/// The backend serialises naive UTC datetimes, so a missing offset means UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO-8601 timestamp '{}'", raw)))
}

/// One page of `GET /events/user/{user_id}`
///
/// `total` and `unread` are server-wide counts for the user, not counts of
/// this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: u64,
    pub unread: u64,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// Parameters for listing a user's events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    pub user_id: UserId,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub unread_only: bool,
}

impl EventQuery {
    /// First page, default size, all events
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            unread_only: false,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn unread_only(mut self, unread_only: bool) -> Self {
        self.unread_only = unread_only;
        self
    }
}

/// Body of `GET /events/user/{user_id}/unread-count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

/// Body of `POST /events/user/{user_id}/mark-all-read`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkAllReadAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub count: u64,
}
