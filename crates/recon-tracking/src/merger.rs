//! Event merging by temporal proximity.

use recon_models::TimelineEvent;

use crate::describe::merge_clause;

/// Merge same-video events whose timestamps lie within `max_gap_secs` of the
/// open event's timestamp.
///
/// Single greedy left-to-right pass over events sorted by
/// `(timestamp, video_id, id)`. Events from different videos are never
/// merged. A merge extends `end_time`, keeps the higher confidence, appends
/// a time-stamped clause to the description and unions the evidence.
/// Idempotent: `merge(merge(x)) == merge(x)`.
pub fn merge(mut events: Vec<TimelineEvent>, max_gap_secs: f64) -> Vec<TimelineEvent> {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.video_id.cmp(&b.video_id))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut merged: Vec<TimelineEvent> = Vec::with_capacity(events.len());
    for event in events {
        match merged.last_mut() {
            Some(open) if should_merge(open, &event, max_gap_secs) => absorb(open, event),
            _ => merged.push(event),
        }
    }
    merged
}

fn should_merge(open: &TimelineEvent, incoming: &TimelineEvent, max_gap_secs: f64) -> bool {
    if open.video_id != incoming.video_id {
        return false;
    }
    let gap_secs = (incoming.timestamp - open.timestamp).num_milliseconds() as f64 / 1000.0;
    gap_secs <= max_gap_secs
}

fn absorb(open: &mut TimelineEvent, incoming: TimelineEvent) {
    open.end_time = open.end_time.max(incoming.end_time);
    open.confidence = open.confidence.max(incoming.confidence);
    open.description.push_str(&merge_clause(incoming.timestamp));

    for item in incoming.carrying {
        if !open.carrying.iter().any(|c| c.eq_ignore_ascii_case(&item)) {
            open.carrying.push(item);
        }
    }
    for id in incoming.source_result_ids {
        if !open.source_result_ids.contains(&id) {
            open.source_result_ids.push(id);
        }
    }
    if open.thumbnail_ref.is_none() {
        open.thumbnail_ref = incoming.thumbnail_ref;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use recon_models::{SuspectId, VideoId};

    fn event(video: &str, secs: i64, confidence: f64) -> TimelineEvent {
        TimelineEvent {
            id: format!("event-{}-{}", video, secs),
            analysis_id: None,
            suspect_id: SuspectId::from("suspect-1"),
            video_id: VideoId::from(video),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 4, 8, 0, 0).unwrap() + Duration::seconds(secs),
            confidence,
            start_time: secs as f64,
            end_time: secs as f64 + 5.0,
            description: "Suspect detected".into(),
            location: "Lobby".into(),
            position: String::new(),
            carrying: Vec::new(),
            thumbnail_ref: None,
            clip_ref: None,
            source_result_ids: vec![format!("track-{}-{}", video, secs)],
        }
    }

    #[test]
    fn test_close_events_merge() {
        let merged = merge(vec![event("v1", 0, 80.0), event("v1", 20, 91.0)], 60.0);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_time, 0.0);
        assert_eq!(merged[0].end_time, 25.0);
        assert_eq!(merged[0].confidence, 91.0);
        assert_eq!(merged[0].source_result_ids.len(), 2);
        assert!(merged[0].description.ends_with(" and again at 08:00 AM"));
    }

    #[test]
    fn test_distant_events_stay_apart() {
        let merged = merge(vec![event("v1", 0, 80.0), event("v1", 90, 80.0)], 60.0);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_gap_is_measured_from_open_event() {
        let merged = merge(
            vec![event("v1", 0, 80.0), event("v1", 40, 80.0), event("v1", 80, 80.0)],
            60.0,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].start_time, 80.0);
    }

    #[test]
    fn test_videos_are_a_hard_partition() {
        let merged = merge(vec![event("v1", 0, 80.0), event("v2", 1, 80.0)], 3600.0);
        assert_eq!(merged.len(), 2);
        assert_ne!(merged[0].video_id, merged[1].video_id);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let merged = merge(vec![event("v1", 30, 80.0), event("v1", 0, 70.0)], 60.0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "event-v1-0");
    }

    #[test]
    fn test_empty() {
        assert!(merge(Vec::new(), 60.0).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            event("v1", 0, 80.0),
            event("v2", 5, 75.0),
            event("v1", 10, 85.0),
            event("v1", 70, 90.0),
            event("v1", 75, 71.0),
            event("v2", 300, 99.0),
        ];
        let once = merge(input, 60.0);
        let twice = merge(once.clone(), 60.0);
        assert_eq!(once, twice);
    }
}
