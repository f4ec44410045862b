//! Narrative summarizer input and the deterministic fallback summary.

use recon_models::{EnvironmentContext, Graph, Suspect, TimelineEvent, TrackingResult};
use recon_vision::NarrativeInput;

use crate::describe::clock_time;

pub const NO_APPEARANCES: &str = "No suspect appearances were detected in the provided videos.";

/// Structured input for the narrative summarizer.
pub fn narrative_input(
    suspect: &Suspect,
    timeline: &[TimelineEvent],
    graph: &Graph,
    results: &[TrackingResult],
    environment: Option<&EnvironmentContext>,
) -> NarrativeInput {
    let mut timeline = timeline.to_vec();
    timeline.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    NarrativeInput {
        suspect_name: suspect.display_name().to_string(),
        locations: distinct(timeline.iter().map(|e| e.location.as_str())),
        activities: distinct(
            results
                .iter()
                .flat_map(|r| r.activities.iter().map(String::as_str)),
        ),
        timeline,
        graph: graph.clone(),
        environment: environment.cloned(),
        tracking_result_count: results.len(),
    }
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items.map(str::trim).filter(|s| !s.is_empty()) {
        if !seen.iter().any(|s| s == item) {
            seen.push(item.to_string());
        }
    }
    seen
}

/// Summary composed without the summarizer.
pub fn fallback_summary(input: &NarrativeInput) -> String {
    let (Some(first), Some(last)) = (input.timeline.first(), input.timeline.last()) else {
        return NO_APPEARANCES.to_string();
    };

    let minutes = (last.timestamp - first.timestamp).num_seconds() as f64 / 60.0;
    let locations = if input.locations.is_empty() {
        "unknown locations".to_string()
    } else {
        input.locations.join(", ")
    };
    let noun = if input.locations.len() == 1 {
        "location"
    } else {
        "different locations"
    };

    let mut summary = format!(
        "{} was tracked for approximately {:.0} minutes across {} {} ({}). ",
        input.suspect_name,
        minutes,
        input.locations.len(),
        noun,
        locations
    );
    summary.push_str(&format!(
        "First appeared at {} and was last seen at {}.",
        clock_time(first.timestamp),
        clock_time(last.timestamp)
    ));
    if !input.activities.is_empty() {
        summary.push_str(&format!(
            " Activities observed: {}.",
            input.activities.join(", ")
        ));
    }

    if input.graph.nodes.len() > 1 && !input.graph.edges.is_empty() {
        summary.push_str(&format!(
            "\n\nInteractions: The suspect is linked to {} entities through {} relationships.",
            input.graph.nodes.len() - 1,
            input.graph.edges.len()
        ));
    }

    if let Some(env) = &input.environment {
        if !env.description.trim().is_empty() {
            summary.push_str(&format!("\n\nEnvironment Context: {}", env.description.trim()));
        }
        if !env.locations.is_empty() {
            let details: Vec<String> = env
                .locations
                .iter()
                .map(|l| format!("- {}: {}", l.name, l.description))
                .collect();
            summary.push_str(&format!("\n\nLocation Details:\n{}", details.join("\n")));
        }
    }

    summary
}
