//! Knowledge graph construction from tracking evidence.
//!
//! Only evidence-backed entities are emitted: the suspect, the camera
//! locations it was seen at and the items it was seen carrying.

use std::collections::HashSet;

use recon_models::video::camera_label;
use recon_models::{
    Graph, GraphEdge, GraphNode, NodeType, Suspect, SuspectId, TrackingResult, VideoId,
};
use tracing::warn;

pub const VISITED: &str = "visited";
pub const CARRIED: &str = "carried";

/// Location node ID; one per video.
pub fn location_node_id(video_id: &VideoId) -> String {
    format!("location-{}", video_id)
}

/// Case- and whitespace-insensitive object key, or `None` for blank items.
pub fn normalize_object(item: &str) -> Option<String> {
    let key = item
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    (!key.is_empty()).then_some(key)
}

fn title_case(item: &str) -> String {
    item.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds a deduplicated graph from tracking results.
///
/// Insertion order follows the input; the first observation of a node or
/// edge wins and later observations never overwrite it.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    suspect_label: Option<String>,
    suspect_image: Option<String>,
    suspect_details: Option<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the suspect node from the suspect's reference data.
    pub fn with_suspect(mut self, suspect: &Suspect) -> Self {
        self.suspect_label = Some(suspect.display_name().to_string());
        self.suspect_image = Some(suspect.reference_image.clone()).filter(|s| !s.is_empty());
        self.suspect_details = suspect.description.clone();
        self
    }

    pub fn build(&self, results: &[TrackingResult]) -> Graph {
        let Some(first) = results.first() else {
            return Graph::empty();
        };
        let suspect_id = &first.suspect_id;

        let mut acc = Accumulator::default();
        acc.add_node(self.suspect_node(suspect_id));

        for r in results {
            if &r.suspect_id != suspect_id {
                warn!(
                    result_id = %r.id,
                    "Skipping result for suspect {} while building graph of {}",
                    r.suspect_id,
                    suspect_id
                );
                continue;
            }

            let location_id = location_node_id(&r.video_id);
            let label = if r.location.trim().is_empty() {
                camera_label(&r.video_id)
            } else {
                r.location.clone()
            };
            let mut location = GraphNode::new(&location_id, NodeType::Location, label);
            location.timestamp = Some(r.timestamp);
            acc.add_node(location);

            acc.add_edge(GraphEdge {
                id: format!(
                    "edge-{}-{}-{}",
                    suspect_id,
                    location_id,
                    r.timestamp.to_rfc3339()
                ),
                source: suspect_id.to_string(),
                target: location_id,
                label: VISITED.to_string(),
                timestamp: Some(r.timestamp),
            });

            for item in &r.carrying {
                let Some(key) = normalize_object(item) else {
                    continue;
                };
                let object_id = format!("object-{}", key);
                let mut object = GraphNode::new(&object_id, NodeType::Object, title_case(item));
                object.timestamp = Some(r.timestamp);
                acc.add_node(object);

                acc.add_edge(GraphEdge {
                    id: format!("edge-{}-{}", suspect_id, object_id),
                    source: suspect_id.to_string(),
                    target: object_id,
                    label: CARRIED.to_string(),
                    timestamp: Some(r.timestamp),
                });
            }
        }

        acc.graph
    }

    fn suspect_node(&self, suspect_id: &SuspectId) -> GraphNode {
        let label = self.suspect_label.as_deref().unwrap_or("Suspect");
        let mut node = GraphNode::new(suspect_id.as_str(), NodeType::Suspect, label);
        node.image_url = self.suspect_image.clone();
        node.details = self.suspect_details.clone();
        node
    }
}

#[derive(Default)]
struct Accumulator {
    graph: Graph,
    node_ids: HashSet<String>,
    edge_ids: HashSet<String>,
}

impl Accumulator {
    fn add_node(&mut self, node: GraphNode) {
        if self.node_ids.insert(node.id.clone()) {
            self.graph.nodes.push(node);
        }
    }

    fn add_edge(&mut self, edge: GraphEdge) {
        if self.edge_ids.insert(edge.id.clone()) {
            self.graph.edges.push(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use recon_models::BoundingBox;

    fn result(video: &str, location: &str, secs: i64, carrying: &[&str]) -> TrackingResult {
        TrackingResult {
            id: format!("track-{}-{}", video, secs),
            analysis_id: None,
            suspect_id: SuspectId::from("suspect-1"),
            video_id: VideoId::from(video),
            frame_id: format!("{}_frame_{:04}", video, secs),
            frame_index: secs as u32,
            detection_index: 0,
            timestamp: Utc.with_ymd_and_hms(2025, 5, 4, 8, 0, 0).unwrap() + Duration::seconds(secs),
            video_offset: secs as f64,
            confidence: 85.0,
            bounding_box: BoundingBox::default(),
            location: location.into(),
            position: String::new(),
            description: String::new(),
            frame_path: String::new(),
            carrying: carrying.iter().map(|s| s.to_string()).collect(),
            activities: Vec::new(),
            behavior_notes: Vec::new(),
            identity_flags: Vec::new(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(GraphBuilder::new().build(&[]), Graph::empty());
    }

    #[test]
    fn test_one_location_per_video_and_timestamped_visits() {
        let results = vec![
            result("video-a", "Lobby", 0, &[]),
            result("video-a", "Lobby (east)", 10, &[]),
            result("video-a", "Lobby", 10, &[]),
        ];
        let graph = GraphBuilder::new().build(&results);

        assert_eq!(graph.nodes_of(NodeType::Suspect).count(), 1);
        let locations: Vec<_> = graph.nodes_of(NodeType::Location).collect();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].id, "location-video-a");
        assert_eq!(locations[0].label, "Lobby");
        assert_eq!(graph.edges_labelled(VISITED).count(), 2);
    }

    #[test]
    fn test_objects_are_normalized_and_collapse() {
        let results = vec![
            result("video-a", "Lobby", 0, &["red  Backpack"]),
            result("video-b", "Car park", 60, &["Red backpack", "  "]),
            result("video-b", "Car park", 61, &["umbrella"]),
        ];
        let graph = GraphBuilder::new().build(&results);

        let objects: Vec<_> = graph.nodes_of(NodeType::Object).collect();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].id, "object-red_backpack");
        assert_eq!(objects[0].label, "Red Backpack");
        assert_eq!(graph.edges_labelled(CARRIED).count(), 2);
        assert!(graph
            .edges
            .iter()
            .any(|e| e.id == "edge-suspect-1-object-red_backpack"));
    }

    #[test]
    fn test_unknown_location_uses_camera_label() {
        let graph = GraphBuilder::new().build(&[result("video-1234567890", "", 0, &[])]);
        let location = graph.node("location-video-1234567890").unwrap();
        assert_eq!(location.label, "Camera 567890");
    }

    #[test]
    fn test_suspect_node_from_reference_data() {
        let suspect = Suspect::new(SuspectId::from("suspect-1"), "/refs/s1.jpg").with_name("J. Doe");
        let graph = GraphBuilder::new()
            .with_suspect(&suspect)
            .build(&[result("video-a", "Lobby", 0, &[])]);

        let node = graph.node("suspect-1").unwrap();
        assert_eq!(node.label, "J. Doe");
        assert_eq!(node.image_url.as_deref(), Some("/refs/s1.jpg"));
    }

    #[test]
    fn test_deterministic() {
        let results = vec![
            result("video-a", "Lobby", 0, &["bag"]),
            result("video-b", "Car park", 30, &["bag", "phone"]),
            result("video-a", "Lobby", 90, &[]),
        ];
        let builder = GraphBuilder::new();
        let first = builder.build(&results);
        let second = builder.build(&results);

        assert_eq!(first, second);
        let ids: HashSet<_> = first.nodes.iter().map(|n| &n.id).collect();
        assert_eq!(ids.len(), first.nodes.len());
    }
}
