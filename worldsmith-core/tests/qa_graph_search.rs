//! QA tests for the graph search/view pipeline: subgraph search, layout,
//! and shared selection notifications.

use worldsmith_core::testing::{subgraph, MockApi};
use worldsmith_core::{
    ConceptId, EventBus, ForceLayout, GraphSearch, GraphSelection, SearchOutcome,
    SelectionRegistry, WorldEvent,
};

#[tokio::test]
async fn test_search_layout_select_round_trip() {
    let api = MockApi::new().with_subgraph(
        "Wolf",
        subgraph(
            vec![(5, "Wolf"), (4, "Rock"), (9, "Tree")],
            vec![(5, 4, "hide-behind"), (5, 9, "mark")],
        ),
    );
    let bus = EventBus::new();
    let mut rx = bus.subscribe();

    let mut search = GraphSearch::new();
    let outcome = search.run(&api, "Wolf", 2).await.unwrap();
    assert_eq!(outcome, SearchOutcome::Found { nodes: 3, edges: 2 });

    // Every displayed node gets a position.
    let positions = ForceLayout::default().run(search.nodes(), search.edges());
    assert_eq!(positions.len(), 3);
    for node in search.nodes() {
        assert!(positions.contains_key(&node.id), "no position for {}", node.label);
    }

    let mut selection = SelectionRegistry::new();
    selection.select_node(&bus, search.nodes()[0].id);
    selection.select_edge(&bus, ConceptId(5), ConceptId(4));

    assert_eq!(
        selection.current(),
        GraphSelection::Edge {
            source: ConceptId(5),
            target: ConceptId(4),
        }
    );
    assert_eq!(rx.try_recv().unwrap(), WorldEvent::NodeSelected(ConceptId(5)));
    assert_eq!(
        rx.try_recv().unwrap(),
        WorldEvent::EdgeSelected {
            source: ConceptId(5),
            target: ConceptId(4),
        }
    );
}

#[tokio::test]
async fn test_search_miss_keeps_the_panel_usable() {
    let api = MockApi::new().with_subgraph("Wolf", subgraph(vec![(5, "Wolf")], vec![]));
    let mut search = GraphSearch::new();

    search.run(&api, "Wolf", 1).await.unwrap();
    let outcome = search.run(&api, "Dragon", 1).await.unwrap();

    let SearchOutcome::NotFound(message) = outcome else {
        panic!("expected a miss");
    };
    assert!(message.contains("Dragon"));
    assert!(search.is_empty());

    // A later hit works as usual.
    let outcome = search.run(&api, "Wolf", 1).await.unwrap();
    assert_eq!(outcome, SearchOutcome::Found { nodes: 1, edges: 0 });
}
