//! Property tests for the event wire model

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{json, Value};
use vigil_api::{Event, EventType, Location};

// Quarter steps survive a JSON round trip exactly
fn coordinate() -> impl Strategy<Value = f64> {
    (-360i32..=360).prop_map(|quarters| f64::from(quarters) / 4.0)
}

fn event_types() -> impl Strategy<Value = EventType> {
    prop_oneof![
        Just(EventType::FastMovement),
        Just(EventType::Loitering),
        Just(EventType::ErraticMovement),
        Just(EventType::Theft),
        Just(EventType::SuspiciousBehavior),
    ]
}

fn record(lat: Option<f64>, lon: Option<f64>, confidence: f64) -> Value {
    let mut record = json!({
        "id": 3,
        "user_id": 7,
        "event_type": "theft",
        "confidence": confidence,
        "timestamp": "2024-05-01T12:00:00",
        "is_read": false
    });
    let fields = record.as_object_mut().unwrap();
    if let Some(lat) = lat {
        fields.insert("latitude".to_string(), json!(lat));
    }
    if let Some(lon) = lon {
        fields.insert("longitude".to_string(), json!(lon));
    }
    record
}

proptest! {
    #[test]
    fn location_needs_both_coordinates(
        lat in proptest::option::of(coordinate()),
        lon in proptest::option::of(coordinate())
    ) {
        let event: Event = serde_json::from_value(record(lat, lon, 0.5)).unwrap();

        let expected = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Location { lat, lon }),
            _ => None,
        };
        prop_assert_eq!(event.location(), expected);
    }

    #[test]
    fn decoded_confidence_is_clamped(confidence in -10.0f64..10.0) {
        let event: Event = serde_json::from_value(record(None, None, confidence)).unwrap();

        prop_assert!((0.0..=1.0).contains(&event.confidence()));
    }

    #[test]
    fn event_survives_json(
        id in 1i64..10_000,
        kind in event_types(),
        eighths in 0u8..=8,
        seconds in 0i64..31_536_000,
        is_read in any::<bool>(),
        location in proptest::option::of((coordinate(), coordinate()))
    ) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut event = Event::new(id, 7, kind, f64::from(eighths) / 8.0, base + Duration::seconds(seconds))
            .with_read(is_read)
            .with_camera_id("cam-2");
        if let Some((lat, lon)) = location {
            event = event.with_location(Location { lat, lon });
        }

        let encoded = serde_json::to_value(&event).unwrap();
        prop_assert_eq!(encoded.get("latitude").is_some(), encoded.get("longitude").is_some());
        prop_assert!(encoded.get("location").is_none());

        let decoded: Event = serde_json::from_value(encoded).unwrap();
        prop_assert_eq!(decoded, event);
    }
}
