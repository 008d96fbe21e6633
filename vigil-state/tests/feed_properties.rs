//! Property tests for feed normalization

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use vigil_api::{Event, EventId, EventType};
use vigil_state::normalize_events;

fn arb_events() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec((1u64..40, 0i64..500, any::<bool>()), 0..60).prop_map(|specs| {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        specs
            .into_iter()
            .map(|(id, minute, is_read)| {
                Event::new(id as EventId, 7, EventType::FastMovement, 0.5, base + Duration::minutes(minute))
                    .with_read(is_read)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn normalized_feed_has_unique_ids(events in arb_events()) {
        let normalized = normalize_events(events.clone());

        let ids: HashSet<EventId> = normalized.iter().map(Event::id).collect();
        let expected: HashSet<EventId> = events.iter().map(Event::id).collect();
        prop_assert_eq!(ids.len(), normalized.len());
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn normalized_feed_is_newest_first(events in arb_events()) {
        let normalized = normalize_events(events);

        for pair in normalized.windows(2) {
            prop_assert!(pair[0].timestamp() >= pair[1].timestamp());
        }
    }

    #[test]
    fn first_occurrence_wins(events in arb_events()) {
        let normalized = normalize_events(events.clone());

        for kept in &normalized {
            let first = events.iter().find(|event| event.id() == kept.id()).unwrap();
            prop_assert_eq!(kept, first);
        }
    }

    #[test]
    fn normalization_is_idempotent(events in arb_events()) {
        let once = normalize_events(events);
        let twice = normalize_events(once.clone());
        prop_assert_eq!(once, twice);
    }
}
