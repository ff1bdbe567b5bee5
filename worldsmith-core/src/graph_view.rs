//! The graph search/view component: label search over the server's world
//! graph, a deterministic force-directed layout, and the shared typed
//! selection the sibling panels read.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::api::WorldApi;
use crate::events::{EventBus, WorldEvent};
use crate::model::ConceptId;

/// A concept node in the displayed subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: ConceptId,
    pub label: String,
}

/// A directed relation edge between two displayed nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: ConceptId,
    pub target: ConceptId,
    pub label: String,
}

/// Outcome of a search: either a subgraph to display, or a message for the
/// user. A miss is a normal outcome here, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found { nodes: usize, edges: usize },
    NotFound(String),
}

/// The currently displayed subgraph.
#[derive(Debug, Default)]
pub struct GraphSearch {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Search the world graph around `label`, replacing the displayed
    /// subgraph on a hit. A 404 clears the display and produces a
    /// user-visible message; other failures propagate.
    pub async fn run<A: WorldApi>(
        &mut self,
        api: &A,
        label: &str,
        depth: u32,
    ) -> Result<SearchOutcome, worldsmith_client::Error> {
        let record = match api.search_graph(label, depth).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                self.nodes.clear();
                self.edges.clear();
                return Ok(SearchOutcome::NotFound(format!(
                    "no node labeled \"{label}\""
                )));
            }
            Err(e) => return Err(e),
        };

        self.nodes = record
            .nodes
            .into_iter()
            .map(|n| GraphNode {
                id: ConceptId(n.id),
                label: n.label,
            })
            .collect();

        let known: HashSet<ConceptId> = self.nodes.iter().map(|n| n.id).collect();
        self.edges = record
            .edges
            .into_iter()
            .filter_map(|e| {
                let edge = GraphEdge {
                    source: ConceptId(e.source),
                    target: ConceptId(e.target),
                    label: e.label,
                };
                if known.contains(&edge.source) && known.contains(&edge.target) {
                    Some(edge)
                } else {
                    warn!(?edge, "dropping edge with endpoint outside the subgraph");
                    None
                }
            })
            .collect();

        debug!(
            label,
            depth,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph search"
        );
        Ok(SearchOutcome::Found {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        })
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Force-directed node placement.
///
/// Seeds nodes on a circle in input order and runs a fixed number of
/// repulsion + spring iterations, so the same subgraph always lays out
/// identically. Positions are unit-less; panels scale to their viewport.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    pub iterations: u32,
    pub repulsion: f32,
    pub spring: f32,
    pub link_distance: f32,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self {
            iterations: 120,
            repulsion: 800.0,
            spring: 0.05,
            link_distance: 60.0,
        }
    }
}

impl ForceLayout {
    /// Compute a position for every node, keyed by concept id.
    pub fn run(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
    ) -> HashMap<ConceptId, (f32, f32)> {
        let n = nodes.len();
        if n == 0 {
            return HashMap::new();
        }

        // Seed on a circle, radius scaled to the node count.
        let radius = self.link_distance * (n as f32).sqrt();
        let mut pos: Vec<(f32, f32)> = (0..n)
            .map(|i| {
                let angle = (i as f32) / (n as f32) * std::f32::consts::TAU;
                (radius * angle.cos(), radius * angle.sin())
            })
            .collect();

        let index: HashMap<ConceptId, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let links: Vec<(usize, usize)> = edges
            .iter()
            .filter_map(|e| Some((*index.get(&e.source)?, *index.get(&e.target)?)))
            .collect();

        for _ in 0..self.iterations {
            let mut force = vec![(0.0f32, 0.0f32); n];

            // Pairwise repulsion.
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = pos[i].0 - pos[j].0;
                    let dy = pos[i].1 - pos[j].1;
                    let dist_sq = (dx * dx + dy * dy).max(1.0);
                    let dist = dist_sq.sqrt();
                    let push = self.repulsion / dist_sq;
                    let (fx, fy) = (push * dx / dist, push * dy / dist);
                    force[i].0 += fx;
                    force[i].1 += fy;
                    force[j].0 -= fx;
                    force[j].1 -= fy;
                }
            }

            // Springs along edges toward the link distance.
            for &(a, b) in &links {
                let dx = pos[b].0 - pos[a].0;
                let dy = pos[b].1 - pos[a].1;
                let dist = (dx * dx + dy * dy).sqrt().max(1.0);
                let stretch = self.spring * (dist - self.link_distance);
                let (fx, fy) = (stretch * dx / dist, stretch * dy / dist);
                force[a].0 += fx;
                force[a].1 += fy;
                force[b].0 -= fx;
                force[b].1 -= fy;
            }

            for i in 0..n {
                pos[i].0 += force[i].0;
                pos[i].1 += force[i].1;
            }
        }

        nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id, pos[i]))
            .collect()
    }
}

// ============================================================================
// Selection
// ============================================================================

/// What the graph panels currently have selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphSelection {
    #[default]
    None,
    Node(ConceptId),
    Edge {
        source: ConceptId,
        target: ConceptId,
    },
}

/// Shared current-node/current-edge selection. Changes are announced on the
/// event bus so every panel stays in sync without polling.
#[derive(Debug, Default)]
pub struct SelectionRegistry {
    current: GraphSelection,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GraphSelection {
        self.current
    }

    pub fn select_node(&mut self, bus: &EventBus, id: ConceptId) {
        self.current = GraphSelection::Node(id);
        bus.publish(WorldEvent::NodeSelected(id));
    }

    pub fn select_edge(&mut self, bus: &EventBus, source: ConceptId, target: ConceptId) {
        self.current = GraphSelection::Edge { source, target };
        bus.publish(WorldEvent::EdgeSelected { source, target });
    }

    /// Drop the selection and announce that too; panels that mirror the
    /// selection clear themselves on this signal.
    pub fn clear(&mut self, bus: &EventBus) {
        self.current = GraphSelection::None;
        bus.publish(WorldEvent::SelectionCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{subgraph, MockApi};

    #[tokio::test]
    async fn test_search_replaces_displayed_subgraph() {
        let api = MockApi::new().with_subgraph(
            "Wolf",
            subgraph(
                vec![(5, "Wolf"), (4, "Rock"), (9, "Tree")],
                vec![(5, 4, "hide-behind"), (5, 9, "mark")],
            ),
        );
        let mut search = GraphSearch::new();

        let outcome = search.run(&api, "Wolf", 2).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Found { nodes: 3, edges: 2 });
        assert_eq!(search.nodes()[0].label, "Wolf");
    }

    #[tokio::test]
    async fn test_search_miss_is_a_message_not_an_error() {
        let api = MockApi::new().with_subgraph(
            "Wolf",
            subgraph(vec![(5, "Wolf")], vec![]),
        );
        let mut search = GraphSearch::new();
        search.run(&api, "Wolf", 1).await.unwrap();
        assert!(!search.is_empty());

        let outcome = search.run(&api, "Dragon", 1).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::NotFound(_)));
        // A miss clears the previous display.
        assert!(search.is_empty());
    }

    #[tokio::test]
    async fn test_search_drops_dangling_edges() {
        let api = MockApi::new().with_subgraph(
            "A",
            subgraph(vec![(1, "A"), (2, "B")], vec![(1, 2, "ok"), (1, 7, "dangling")]),
        );
        let mut search = GraphSearch::new();

        search.run(&api, "A", 1).await.unwrap();
        assert_eq!(search.edges().len(), 1);
        assert_eq!(search.edges()[0].label, "ok");
    }

    #[test]
    fn test_layout_is_deterministic() {
        let nodes = vec![
            GraphNode { id: ConceptId(1), label: "A".into() },
            GraphNode { id: ConceptId(2), label: "B".into() },
            GraphNode { id: ConceptId(3), label: "C".into() },
        ];
        let edges = vec![GraphEdge {
            source: ConceptId(1),
            target: ConceptId(2),
            label: "r".into(),
        }];
        let layout = ForceLayout::default();

        let first = layout.run(&nodes, &edges);
        let second = layout.run(&nodes, &edges);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);

        // Linked nodes settle closer together than unlinked ones.
        let d = |a: ConceptId, b: ConceptId| {
            let (ax, ay) = first[&a];
            let (bx, by) = first[&b];
            ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
        };
        assert!(d(ConceptId(1), ConceptId(2)) < d(ConceptId(1), ConceptId(3)));
    }

    #[test]
    fn test_layout_empty_graph() {
        let layout = ForceLayout::default();
        assert!(layout.run(&[], &[]).is_empty());
    }

    #[tokio::test]
    async fn test_selection_announces_changes() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let mut selection = SelectionRegistry::new();

        selection.select_node(&bus, ConceptId(5));
        assert_eq!(selection.current(), GraphSelection::Node(ConceptId(5)));
        assert_eq!(
            rx.try_recv().unwrap(),
            WorldEvent::NodeSelected(ConceptId(5))
        );

        selection.select_edge(&bus, ConceptId(5), ConceptId(4));
        assert_eq!(
            rx.try_recv().unwrap(),
            WorldEvent::EdgeSelected {
                source: ConceptId(5),
                target: ConceptId(4),
            }
        );

        selection.clear(&bus);
        assert_eq!(selection.current(), GraphSelection::None);
        assert_eq!(rx.try_recv().unwrap(), WorldEvent::SelectionCleared);
    }
}
