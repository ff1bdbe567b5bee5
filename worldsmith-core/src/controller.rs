//! The map controller: orchestrates both registries, gates scene
//! construction on dual readiness, and owns the scene for its lifetime.
//!
//! Startup runs the concept and instance loads concurrently; the scene is
//! built exactly once, when both registries have data, regardless of which
//! load finishes first. A failed initial load is terminal: the controller
//! stays in `LoadingBoth` and the caller restarts from scratch.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::WorldApi;
use crate::events::{EventBus, WorldEvent};
use crate::graph::{ConceptRegistry, GraphError, RelationSource};
use crate::map::{InstanceRegistry, MapError};
use crate::model::{Color, Instance, InstanceId, Relation};
use crate::scene::{Frame, PixelSize, RenderScheduler, Scene, SceneConfig, TileSelection};

/// Errors from controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Api(#[from] worldsmith_client::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error("map is not ready")]
    NotReady,

    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),
}

/// Startup progression. There is no path back out of `Ready`, and no path
/// out of `LoadingBoth` except a successful dual load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    LoadingBoth,
    Ready,
}

/// Controller construction parameters.
#[derive(Debug, Clone, Default)]
pub struct ControllerConfig {
    pub scene: SceneConfig,
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.scene = self.scene.with_tile_size(width, height);
        self
    }

    pub fn with_viewport(mut self, viewport: PixelSize) -> Self {
        self.scene = self.scene.with_viewport(viewport);
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.scene = self.scene.with_background(background);
        self
    }
}

/// Owns the registries, the scene, and the render scheduler.
#[derive(Debug)]
pub struct MapController {
    config: ControllerConfig,
    state: LoadState,
    concepts: ConceptRegistry,
    instances: InstanceRegistry,
    scene: Option<Scene>,
    scheduler: RenderScheduler,
    bus: EventBus,
}

impl MapController {
    pub fn new(config: ControllerConfig, bus: EventBus) -> Self {
        Self {
            config,
            state: LoadState::Idle,
            concepts: ConceptRegistry::new(),
            instances: InstanceRegistry::new(),
            scene: None,
            scheduler: RenderScheduler::new(),
            bus,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn concepts(&self) -> &ConceptRegistry {
        &self.concepts
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Render the next frame, or `None` before the scene exists or while
    /// the scheduler is stopped.
    pub fn render(&mut self) -> Option<Frame> {
        let scene = self.scene.as_ref()?;
        self.scheduler.render(scene)
    }

    // ========================================================================
    // Startup
    // ========================================================================

    /// Load concepts and instances concurrently, then build the scene once
    /// both registries hold data.
    ///
    /// On any load failure the error propagates and the controller remains
    /// in `LoadingBoth`; the recovery path is a fresh controller.
    pub async fn initialize<A: WorldApi>(&mut self, api: &A) -> Result<(), ControllerError> {
        self.state = LoadState::LoadingBoth;

        let (concepts, instances) = tokio::join!(
            self.concepts.load(api, &self.bus),
            self.instances.load(api, &self.bus),
        );
        concepts?;
        instances?;

        self.try_build();
        Ok(())
    }

    /// Build the scene if both registries are populated and it has not been
    /// built yet. Safe to call any number of times, in any event order.
    fn try_build(&mut self) {
        if self.state == LoadState::Ready {
            return;
        }
        if self.concepts.is_empty() || self.instances.is_empty() {
            debug!("readiness check: still waiting on a registry");
            return;
        }

        self.rebuild_scene();
        self.scheduler.start();
        self.state = LoadState::Ready;
        info!(
            concepts = self.concepts.len(),
            instances = self.instances.len(),
            "map ready"
        );
    }

    /// Rebuild layers, sprites, and the tile index from current registry
    /// contents. Pan offset and overlay reset with the scene.
    fn rebuild_scene(&mut self) {
        let mut scene = Scene::init(
            self.instances.width(),
            self.instances.height(),
            &self.config.scene,
        );
        scene.create_layers(self.concepts.get());
        scene.place_instances(self.instances.get());
        self.scene = Some(scene);
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Hit-test a tap against the map and announce the selected tile.
    pub fn select_tile(&mut self, px: i32, py: i32) -> Option<TileSelection> {
        let selection = self.scene.as_ref()?.tap(px, py)?;
        self.bus.publish(WorldEvent::TileSelected {
            x: selection.x,
            y: selection.y,
            instances: selection.instances.clone(),
        });
        Some(selection)
    }

    /// Move the overlay to an instance's cell, or hide it. Used by sibling
    /// panels to highlight an action target on mouseover.
    pub fn highlight_instance(&mut self, id: InstanceId, on: bool) -> Result<(), ControllerError> {
        let Some(scene) = self.scene.as_mut() else {
            return Err(ControllerError::NotReady);
        };
        if !on {
            scene.clear_overlay();
            return Ok(());
        }
        let instance = self
            .instances
            .by_id(id)
            .ok_or(ControllerError::UnknownInstance(id))?;
        scene.set_overlay_cell(instance.coordinates.x, instance.coordinates.y);
        Ok(())
    }

    /// The actions available on an instance: the relation labels declared on
    /// its concept, fetched lazily and cached on the concept.
    pub async fn available_actions<A: WorldApi>(
        &mut self,
        api: &A,
        id: InstanceId,
    ) -> Result<Vec<Relation>, ControllerError> {
        let concept = self
            .instances
            .by_id(id)
            .ok_or(ControllerError::UnknownInstance(id))?
            .concept;

        let (relations, source) = self.concepts.relations(api, concept).await?;
        if source == RelationSource::Fetched {
            debug!(%concept, count = relations.len(), "materialized relations");
        }
        Ok(relations)
    }

    /// The candidate targets for an action from one instance, fresh from
    /// the server every time.
    pub async fn action_targets<A: WorldApi>(
        &self,
        api: &A,
        source: InstanceId,
        relation: &Relation,
    ) -> Result<Vec<Instance>, ControllerError> {
        let records = api
            .action_targets(source.0, &relation.label, relation.target.0)
            .await?;

        let (width, height) = (self.instances.width(), self.instances.height());
        let mut targets = Vec::with_capacity(records.len());
        for record in records {
            match Instance::decode(record, width, height) {
                Ok(instance) => targets.push(instance),
                Err(e) => warn!(error = %e, "dropping malformed action target"),
            }
        }
        Ok(targets)
    }

    /// Execute an action between two instances, then refresh the instance
    /// snapshot and rebuild the scene so the result is visible.
    pub async fn execute_action<A: WorldApi>(
        &mut self,
        api: &A,
        action: &str,
        source: InstanceId,
        target: InstanceId,
    ) -> Result<(), ControllerError> {
        api.execute_action(action, source.0, target.0).await?;
        info!(action, %source, %target, "executed action");

        self.instances.load(api, &self.bus).await?;
        if self.state == LoadState::Ready {
            self.rebuild_scene();
        }
        Ok(())
    }

    /// Delete an instance (server ack first) and rebuild the scene.
    pub async fn delete_instance<A: WorldApi>(
        &mut self,
        api: &A,
        id: InstanceId,
    ) -> Result<(), ControllerError> {
        self.instances.delete(api, id).await?;
        if self.state == LoadState::Ready {
            self.rebuild_scene();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConceptId, InstanceId};
    use crate::testing::{concept_record, instance_record, relation_record, MockApi};

    fn config() -> ControllerConfig {
        ControllerConfig::new().with_tile_size(10, 10)
    }

    fn world_api() -> MockApi {
        MockApi::new()
            .with_concepts(vec![
                concept_record(4, "Rock", "#aaaaaa", 1),
                concept_record(5, "Wolf", "#333333", 2),
            ])
            .with_map(
                3,
                2,
                vec![
                    instance_record(10, "rock", 1, 0, 4),
                    instance_record(11, "wolf", 2, 1, 5),
                ],
            )
    }

    #[tokio::test]
    async fn test_initialize_builds_scene_once_both_loads_land() {
        let api = world_api();
        let mut controller = MapController::new(config(), EventBus::new());
        let mut rx = controller.events().subscribe();

        controller.initialize(&api).await.unwrap();

        assert_eq!(controller.state(), LoadState::Ready);
        let scene = controller.scene().unwrap();
        assert_eq!(scene.tiles().bucket(1, 0), &[InstanceId(10)]);
        assert_eq!(scene.tiles().bucket(2, 1), &[InstanceId(11)]);
        assert_eq!(
            scene.layer_order(),
            vec![ConceptId(4), ConceptId(5)]
        );

        // Both readiness signals were published.
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&WorldEvent::ConceptsReady));
        assert!(seen.contains(&WorldEvent::InstancesReady));
    }

    #[tokio::test]
    async fn test_failed_concept_load_never_reaches_ready() {
        let api = MockApi::new()
            .fail_concepts(500)
            .with_map(3, 2, vec![instance_record(10, "rock", 1, 0, 4)]);
        let mut controller = MapController::new(config(), EventBus::new());

        let result = controller.initialize(&api).await;

        assert!(result.is_err());
        assert_eq!(controller.state(), LoadState::LoadingBoth);
        assert!(controller.scene().is_none());
        assert!(controller.render().is_none());
    }

    #[tokio::test]
    async fn test_empty_world_loads_but_builds_no_scene() {
        let api = MockApi::new()
            .with_concepts(vec![concept_record(4, "Rock", "#aaaaaa", 1)])
            .with_map(3, 2, vec![]);
        let mut controller = MapController::new(config(), EventBus::new());

        // A valid world with zero placed instances loads cleanly, but the
        // readiness gate holds until both registries have data.
        controller.initialize(&api).await.unwrap();

        assert_eq!(controller.state(), LoadState::LoadingBoth);
        assert!(controller.scene().is_none());
        assert!(controller.render().is_none());
        assert_eq!(controller.instances().width(), 3);
        assert_eq!(controller.instances().height(), 2);
    }

    #[tokio::test]
    async fn test_select_tile_publishes_bucket() {
        let api = world_api();
        let mut controller = MapController::new(config(), EventBus::new());
        controller.initialize(&api).await.unwrap();
        let mut rx = controller.events().subscribe();

        // Pixel (14, 3) with 10px tiles lands on cell (1, 0).
        let selection = controller.select_tile(14, 3).unwrap();
        assert_eq!((selection.x, selection.y), (1, 0));
        assert_eq!(selection.instances, vec![InstanceId(10)]);

        assert_eq!(
            rx.try_recv().unwrap(),
            WorldEvent::TileSelected {
                x: 1,
                y: 0,
                instances: vec![InstanceId(10)],
            }
        );
    }

    #[tokio::test]
    async fn test_highlight_instance_moves_overlay() {
        let api = world_api();
        let mut controller = MapController::new(config(), EventBus::new());
        controller.initialize(&api).await.unwrap();

        controller.highlight_instance(InstanceId(11), true).unwrap();
        assert_eq!(controller.scene().unwrap().overlay(), Some((2, 1)));

        controller.highlight_instance(InstanceId(11), false).unwrap();
        assert_eq!(controller.scene().unwrap().overlay(), None);

        let err = controller
            .highlight_instance(InstanceId(99), true)
            .unwrap_err();
        assert!(matches!(err, ControllerError::UnknownInstance(_)));
    }

    #[tokio::test]
    async fn test_available_actions_come_from_concept_relations() {
        let api = world_api().with_relations(
            5,
            vec![relation_record("eat", 4), relation_record("follow", 5)],
        );
        let mut controller = MapController::new(config(), EventBus::new());
        controller.initialize(&api).await.unwrap();

        let actions = controller
            .available_actions(&api, InstanceId(11))
            .await
            .unwrap();
        let labels: Vec<&str> = actions.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["eat", "follow"]);

        // Second ask is served from the concept cache.
        controller
            .available_actions(&api, InstanceId(11))
            .await
            .unwrap();
        assert_eq!(api.relation_fetch_count(5), 1);
    }

    #[tokio::test]
    async fn test_execute_action_refreshes_snapshot() {
        let api = world_api().with_relations(5, vec![relation_record("eat", 4)]);
        let mut controller = MapController::new(config(), EventBus::new());
        controller.initialize(&api).await.unwrap();

        controller
            .execute_action(&api, "eat", InstanceId(11), InstanceId(10))
            .await
            .unwrap();

        assert_eq!(
            api.executed(),
            vec![("eat".to_string(), 11, 10)]
        );
        // Initial load plus the post-action refresh.
        assert_eq!(api.map_fetch_count(), 2);
        assert_eq!(controller.state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_delete_instance_rebuilds_scene() {
        let api = world_api();
        let mut controller = MapController::new(config(), EventBus::new());
        controller.initialize(&api).await.unwrap();

        controller.delete_instance(&api, InstanceId(10)).await.unwrap();

        assert!(controller.instances().by_id(InstanceId(10)).is_none());
        let scene = controller.scene().unwrap();
        assert!(scene.tiles().bucket(1, 0).is_empty());
        assert_eq!(scene.tiles().bucket(2, 1), &[InstanceId(11)]);
    }

    #[tokio::test]
    async fn test_render_only_after_ready() {
        let api = world_api();
        let mut controller = MapController::new(config(), EventBus::new());
        assert!(controller.render().is_none());

        controller.initialize(&api).await.unwrap();
        let frame = controller.render().unwrap();
        assert_eq!(frame.ops.len(), 2);
    }
}
