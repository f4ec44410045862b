//! Annotation passes over a chronologically sorted result list.
//!
//! Every pass only appends `identity_flags` or `behavior_notes`. None of
//! them removes, reorders or rescores a result.

use std::collections::{BTreeSet, HashMap};

use recon_models::{IdentityFlag, TrackingResult};

use crate::config::TrackerConfig;

/// Flag implausible identity switches and weak matches.
///
/// - several matches in one frame: every candidate gets `SharedFrame`
/// - confidence within `low_margin` of `threshold`: `LowMargin`
/// - consecutive sightings on different cameras at different locations
///   closer than `min_transit_secs`: the weaker of the two (the later one on
///   a tie) gets `ConflictingSighting`
pub fn verify_identity(results: &mut [TrackingResult], config: &TrackerConfig, threshold: f64) {
    let mut per_frame: HashMap<&str, u32> = HashMap::new();
    for r in results.iter() {
        *per_frame.entry(r.frame_id.as_str()).or_default() += 1;
    }
    let shared: HashMap<String, u32> = per_frame
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(frame, n)| (frame.to_string(), n))
        .collect();

    let mut conflicts = Vec::new();
    for i in 1..results.len() {
        let (prev, cur) = (&results[i - 1], &results[i]);
        if prev.video_id == cur.video_id || prev.location == cur.location {
            continue;
        }
        let gap_secs = (cur.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
        if gap_secs >= config.min_transit_secs {
            continue;
        }
        let (weaker, other) = if prev.confidence < cur.confidence {
            (i - 1, i)
        } else {
            (i, i - 1)
        };
        conflicts.push((
            weaker,
            IdentityFlag::ConflictingSighting {
                other_result_id: results[other].id.clone(),
                other_location: results[other].location.clone(),
                gap_secs,
            },
        ));
    }

    for r in results.iter_mut() {
        if let Some(candidates) = shared.get(&r.frame_id) {
            r.add_identity_flag(IdentityFlag::SharedFrame {
                candidates: *candidates,
            });
        }
        let margin = r.confidence - threshold;
        if margin < config.low_margin {
            r.add_identity_flag(IdentityFlag::LowMargin { margin });
        }
    }
    for (index, flag) in conflicts {
        results[index].add_identity_flag(flag);
    }
}

/// Note changes in carried items between consecutive sightings.
pub fn detect_appearance_changes(results: &mut [TrackingResult]) {
    for i in 1..results.len() {
        if results[i].frame_id == results[i - 1].frame_id {
            continue;
        }
        let before = carried_items(&results[i - 1]);
        let after = carried_items(&results[i]);
        if before == after {
            continue;
        }
        let gained: Vec<&String> = after.iter().filter(|item| !before.contains(*item)).collect();
        let lost: Vec<&String> = before.iter().filter(|item| !after.contains(*item)).collect();

        let mut notes = Vec::new();
        for item in gained {
            notes.push(format!("Now carrying {}", item));
        }
        for item in lost {
            notes.push(format!("No longer carrying {}", item));
        }
        for note in notes {
            results[i].add_behavior_note(note);
        }
    }
}

fn carried_items(result: &TrackingResult) -> BTreeSet<String> {
    result
        .carrying
        .iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Note locations the suspect visited more than once.
///
/// A new visit starts when the suspect was last seen somewhere else, or when
/// more than `revisit_gap_secs` passed since the last sighting there.
pub fn detect_behavior_patterns(results: &mut [TrackingResult], revisit_gap_secs: f64) {
    let mut visits: HashMap<String, u32> = HashMap::new();
    let mut last_seen: HashMap<String, chrono::DateTime<chrono::Utc>> = HashMap::new();
    let mut previous_location: Option<&str> = None;

    for r in results.iter() {
        let location = r.location.as_str();
        let same_place = previous_location == Some(location);
        let recent = last_seen.get(location).is_some_and(|at| {
            ((r.timestamp - *at).num_milliseconds() as f64 / 1000.0) <= revisit_gap_secs
        });
        if !(same_place && recent) {
            *visits.entry(location.to_string()).or_default() += 1;
        }
        last_seen.insert(location.to_string(), r.timestamp);
        previous_location = Some(location);
    }

    for r in results.iter_mut() {
        if let Some(count) = visits.get(&r.location).filter(|n| **n > 1) {
            r.add_behavior_note(format!("Visited {} {} times", r.location, count));
        }
    }
}
