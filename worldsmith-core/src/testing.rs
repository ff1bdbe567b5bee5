//! Test doubles and fixtures: a scripted in-memory [`MockApi`] standing in
//! for the HTTP client, plus a [`TestHarness`] bundling a controller with an
//! event drain for end-to-end scenarios without a server.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use worldsmith_client::{
    ConceptRecord, CoordinatesRecord, DisplayRecord, EdgeRecord, Error, InstanceRecord,
    MapSnapshot, NodeRecord, RelationRecord, SubgraphRecord,
};

use crate::api::WorldApi;
use crate::controller::{ControllerConfig, ControllerError, MapController};
use crate::events::{EventBus, WorldEvent};

// ============================================================================
// Fixture builders
// ============================================================================

pub fn concept_record(id: i64, label: &str, color: &str, zindex: i32) -> ConceptRecord {
    ConceptRecord {
        id,
        label: label.to_string(),
        properties: Vec::new(),
        display: DisplayRecord {
            color: Some(color.to_string()),
            zindex,
        },
        rules: Vec::new(),
    }
}

pub fn relation_record(label: &str, concept_id: i64) -> RelationRecord {
    RelationRecord {
        label: label.to_string(),
        concept_id,
    }
}

pub fn instance_record(id: i64, label: &str, x: i64, y: i64, concept: i64) -> InstanceRecord {
    InstanceRecord {
        id,
        label: label.to_string(),
        coordinates: CoordinatesRecord { x, y },
        concept,
        properties: Vec::new(),
    }
}

pub fn subgraph(nodes: Vec<(i64, &str)>, edges: Vec<(i64, i64, &str)>) -> SubgraphRecord {
    SubgraphRecord {
        nodes: nodes
            .into_iter()
            .map(|(id, label)| NodeRecord {
                id,
                label: label.to_string(),
            })
            .collect(),
        edges: edges
            .into_iter()
            .map(|(source, target, label)| EdgeRecord {
                source,
                target,
                label: label.to_string(),
            })
            .collect(),
    }
}

fn api_error(status: u16) -> Error {
    Error::Api {
        status,
        message: format!("scripted failure ({status})"),
    }
}

// ============================================================================
// MockApi
// ============================================================================

#[derive(Debug, Default)]
struct MockState {
    relation_fetches: HashMap<i64, usize>,
    map_fetches: usize,
    executed: Vec<(String, i64, i64)>,
    deleted: Vec<i64>,
}

/// Scripted stand-in for the HTTP client.
///
/// Built with `with_*` methods for the happy path and `fail_*` methods for
/// scripted HTTP failures; records every mutating call so tests can assert
/// on exactly what reached the "server".
#[derive(Debug, Default)]
pub struct MockApi {
    concepts: Vec<ConceptRecord>,
    relations: HashMap<i64, Vec<RelationRecord>>,
    map: Option<(u32, u32, Vec<InstanceRecord>)>,
    concept_instances: HashMap<i64, Vec<InstanceRecord>>,
    action_targets: HashMap<(i64, String, i64), Vec<InstanceRecord>>,
    subgraphs: HashMap<String, SubgraphRecord>,
    fail_concepts: Option<u16>,
    fail_instances: Option<u16>,
    fail_delete: Option<u16>,
    fail_action: Option<u16>,
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concepts(mut self, concepts: Vec<ConceptRecord>) -> Self {
        self.concepts = concepts;
        self
    }

    pub fn with_relations(mut self, concept_id: i64, relations: Vec<RelationRecord>) -> Self {
        self.relations.insert(concept_id, relations);
        self
    }

    pub fn with_map(mut self, width: u32, height: u32, instances: Vec<InstanceRecord>) -> Self {
        self.map = Some((width, height, instances));
        self
    }

    pub fn with_concept_instances(
        mut self,
        concept_id: i64,
        instances: Vec<InstanceRecord>,
    ) -> Self {
        self.concept_instances.insert(concept_id, instances);
        self
    }

    pub fn with_action_targets(
        mut self,
        instance_id: i64,
        action: &str,
        concept_id: i64,
        targets: Vec<InstanceRecord>,
    ) -> Self {
        self.action_targets
            .insert((instance_id, action.to_string(), concept_id), targets);
        self
    }

    pub fn with_subgraph(mut self, label: &str, record: SubgraphRecord) -> Self {
        self.subgraphs.insert(label.to_string(), record);
        self
    }

    pub fn fail_concepts(mut self, status: u16) -> Self {
        self.fail_concepts = Some(status);
        self
    }

    pub fn fail_instances(mut self, status: u16) -> Self {
        self.fail_instances = Some(status);
        self
    }

    pub fn fail_delete(mut self, status: u16) -> Self {
        self.fail_delete = Some(status);
        self
    }

    pub fn fail_action(mut self, status: u16) -> Self {
        self.fail_action = Some(status);
        self
    }

    // ------------------------------------------------------------------
    // Call inspection
    // ------------------------------------------------------------------

    /// Network round-trips made for one concept's relations.
    pub fn relation_fetch_count(&self, concept_id: i64) -> usize {
        *self
            .state
            .lock()
            .unwrap()
            .relation_fetches
            .get(&concept_id)
            .unwrap_or(&0)
    }

    /// Bulk instance dumps served so far.
    pub fn map_fetch_count(&self) -> usize {
        self.state.lock().unwrap().map_fetches
    }

    /// `(action, source, target)` triples that reached the server.
    pub fn executed(&self) -> Vec<(String, i64, i64)> {
        self.state.lock().unwrap().executed.clone()
    }

    /// Instance ids whose deletion reached the server.
    pub fn deleted(&self) -> Vec<i64> {
        self.state.lock().unwrap().deleted.clone()
    }
}

impl WorldApi for MockApi {
    async fn fetch_concepts(&self) -> Result<Vec<ConceptRecord>, Error> {
        if let Some(status) = self.fail_concepts {
            return Err(api_error(status));
        }
        Ok(self.concepts.clone())
    }

    async fn fetch_map(&self) -> Result<MapSnapshot, Error> {
        if let Some(status) = self.fail_instances {
            return Err(api_error(status));
        }
        self.state.lock().unwrap().map_fetches += 1;
        let (width, height, instances) = self.map.clone().unwrap_or((0, 0, Vec::new()));
        Ok(MapSnapshot {
            width,
            height,
            instances,
        })
    }

    async fn fetch_relations(&self, concept_id: i64) -> Result<Vec<RelationRecord>, Error> {
        *self
            .state
            .lock()
            .unwrap()
            .relation_fetches
            .entry(concept_id)
            .or_insert(0) += 1;
        Ok(self.relations.get(&concept_id).cloned().unwrap_or_default())
    }

    async fn instances_of_concept(
        &self,
        concept_id: i64,
    ) -> Result<Vec<InstanceRecord>, Error> {
        Ok(self
            .concept_instances
            .get(&concept_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn action_targets(
        &self,
        instance_id: i64,
        action: &str,
        concept_id: i64,
    ) -> Result<Vec<InstanceRecord>, Error> {
        Ok(self
            .action_targets
            .get(&(instance_id, action.to_string(), concept_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn execute_action(&self, action: &str, source: i64, target: i64) -> Result<(), Error> {
        if let Some(status) = self.fail_action {
            return Err(api_error(status));
        }
        self.state
            .lock()
            .unwrap()
            .executed
            .push((action.to_string(), source, target));
        Ok(())
    }

    async fn delete_instance(&self, instance_id: i64) -> Result<(), Error> {
        if let Some(status) = self.fail_delete {
            return Err(api_error(status));
        }
        self.state.lock().unwrap().deleted.push(instance_id);
        Ok(())
    }

    async fn search_graph(&self, label: &str, _depth: u32) -> Result<SubgraphRecord, Error> {
        self.subgraphs
            .get(label)
            .cloned()
            .ok_or_else(|| api_error(404))
    }
}

// ============================================================================
// TestHarness
// ============================================================================

/// A controller wired to a mock server and an event drain, for scenario
/// tests that walk through the whole pipeline.
pub struct TestHarness {
    pub api: MockApi,
    pub controller: MapController,
    rx: broadcast::Receiver<WorldEvent>,
}

impl TestHarness {
    /// 10×10-pixel tiles by default, matching the fixtures' arithmetic.
    pub fn new(api: MockApi) -> Self {
        Self::with_config(api, ControllerConfig::new().with_tile_size(10, 10))
    }

    pub fn with_config(api: MockApi, config: ControllerConfig) -> Self {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let controller = MapController::new(config, bus);
        Self {
            api,
            controller,
            rx,
        }
    }

    /// Run the controller's startup against the mock server.
    pub async fn start(&mut self) -> Result<(), ControllerError> {
        self.controller.initialize(&self.api).await
    }

    /// Pull every event published since the last drain.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
