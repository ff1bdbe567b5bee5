//! Headless smoke mode: load the world and print the map as text.

use std::collections::HashMap;

use worldsmith_client::Client;
use worldsmith_core::{ConceptId, ControllerConfig, ControllerError, EventBus, MapController};

/// Load everything from the server and print a text rendering of the map,
/// one character per tile.
pub async fn run_headless(client: Client) -> Result<(), ControllerError> {
    let mut controller = MapController::new(ControllerConfig::new(), EventBus::new());
    controller.initialize(&client).await?;

    for line in world_report(&controller) {
        println!("{line}");
    }
    Ok(())
}

/// Build the report lines: a summary header, the tile grid, and a concept
/// legend. A world with no placed instances has no scene; the grid is then
/// all empty tiles.
fn world_report(controller: &MapController) -> Vec<String> {
    let concepts = controller.concepts();
    let instances = controller.instances();

    let mut lines = vec![
        format!(
            "world: {}x{} map, {} concept(s), {} instance(s)",
            instances.width(),
            instances.height(),
            concepts.len(),
            instances.len()
        ),
        String::new(),
    ];

    // One letter per concept, in server order.
    let glyphs: HashMap<ConceptId, char> = concepts
        .get()
        .map(|c| {
            let glyph = c.label.chars().next().unwrap_or('?').to_ascii_uppercase();
            (c.id, glyph)
        })
        .collect();

    match controller.scene() {
        Some(scene) => {
            for y in 0..instances.height() {
                let mut row = String::with_capacity(instances.width() as usize);
                for x in 0..instances.width() {
                    let glyph = scene
                        .tiles()
                        .bucket(x, y)
                        .first()
                        .and_then(|id| instances.by_id(*id))
                        .and_then(|instance| glyphs.get(&instance.concept))
                        .copied()
                        .unwrap_or('.');
                    row.push(glyph);
                }
                lines.push(row);
            }
        }
        None => {
            for _ in 0..instances.height() {
                lines.push(".".repeat(instances.width() as usize));
            }
            lines.push(String::new());
            lines.push("(map is empty)".to_string());
        }
    }

    lines.push(String::new());
    for concept in concepts.get() {
        lines.push(format!(
            "  {} = {} (z {}, {})",
            glyphs[&concept.id], concept.label, concept.display.z_index, concept.display.color
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldsmith_core::testing::{concept_record, instance_record, MockApi, TestHarness};

    #[tokio::test]
    async fn test_report_renders_instances_as_glyphs() {
        let api = MockApi::new()
            .with_concepts(vec![concept_record(4, "rock", "#aaaaaa", 1)])
            .with_map(3, 2, vec![instance_record(10, "rock", 1, 0, 4)]);
        let mut harness = TestHarness::new(api);
        harness.start().await.unwrap();

        let lines = world_report(&harness.controller);
        assert!(lines[0].contains("3x2"));
        assert_eq!(lines[2], ".R.");
        assert_eq!(lines[3], "...");
    }

    #[tokio::test]
    async fn test_report_handles_a_world_with_no_instances() {
        let api = MockApi::new()
            .with_concepts(vec![concept_record(4, "Rock", "#aaaaaa", 1)])
            .with_map(3, 2, vec![]);
        let mut harness = TestHarness::new(api);
        harness.start().await.unwrap();

        // No instances means the scene is never built; the report must not
        // rely on it.
        assert!(harness.controller.scene().is_none());
        let lines = world_report(&harness.controller);
        assert!(lines[0].contains("0 instance(s)"));
        assert_eq!(lines[2], "...");
        assert_eq!(lines[3], "...");
        assert!(lines.iter().any(|l| l.contains("map is empty")));
    }
}
