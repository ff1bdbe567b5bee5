//! Instance registry: the set of placed instances on the map grid.
//!
//! Bulk-loaded from the server; the whole instance map is replaced on each
//! load. Deletion is server-ack-first: local state is never mutated
//! optimistically.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::WorldApi;
use crate::events::{EventBus, WorldEvent};
use crate::model::{ConceptId, Instance, InstanceId};

/// Errors from instance registry operations.
#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Api(#[from] worldsmith_client::Error),

    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),
}

/// Placed instances keyed by id, plus the map bounds.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    width: u32,
    height: u32,
    instances: HashMap<InstanceId, Instance>,
    order: Vec<InstanceId>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load the instance dump, replacing the entire local map, then
    /// signal readiness. Out-of-bounds records are dropped with a warning.
    pub async fn load<A: WorldApi>(&mut self, api: &A, bus: &EventBus) -> Result<(), MapError> {
        let snapshot = api.fetch_map().await?;
        debug!(
            width = snapshot.width,
            height = snapshot.height,
            count = snapshot.instances.len(),
            "loaded instance snapshot"
        );

        self.width = snapshot.width;
        self.height = snapshot.height;
        self.instances.clear();
        self.order.clear();

        for record in snapshot.instances {
            match Instance::decode(record, self.width, self.height) {
                Ok(instance) => {
                    let id = instance.id;
                    if self.instances.insert(id, instance).is_none() {
                        self.order.push(id);
                    } else {
                        warn!(%id, "duplicate instance id in bulk load, keeping latest");
                    }
                }
                Err(e) => warn!(error = %e, "dropping malformed instance record"),
            }
        }

        bus.publish(WorldEvent::InstancesReady);
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// All instances, in the order the server listed them.
    pub fn get(&self) -> impl Iterator<Item = &Instance> {
        self.order.iter().filter_map(|id| self.instances.get(id))
    }

    pub fn by_id(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Project a subset in caller order. Unknown ids yield `None` at the
    /// matching position rather than being skipped.
    pub fn select(&self, ids: &[InstanceId]) -> Vec<Option<&Instance>> {
        ids.iter().map(|id| self.instances.get(id)).collect()
    }

    /// Ask the server for every placed instance of a concept. No local
    /// caching: target pickers always see fresh data.
    pub async fn by_concept<A: WorldApi>(
        &self,
        api: &A,
        concept: ConceptId,
    ) -> Result<Vec<Instance>, MapError> {
        let records = api.instances_of_concept(concept.0).await?;
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match Instance::decode(record, self.width, self.height) {
                Ok(instance) => out.push(instance),
                Err(e) => warn!(error = %e, "dropping malformed instance record"),
            }
        }
        Ok(out)
    }

    /// Delete an instance on the server, then locally — in that order.
    /// If the server round-trip fails, local state is unchanged.
    pub async fn delete<A: WorldApi>(
        &mut self,
        api: &A,
        id: InstanceId,
    ) -> Result<(), MapError> {
        if !self.instances.contains_key(&id) {
            return Err(MapError::UnknownInstance(id));
        }

        api.delete_instance(id.0).await?;

        self.instances.remove(&id);
        self.order.retain(|other| *other != id);
        debug!(%id, "deleted instance");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{instance_record, MockApi};

    async fn registry_with(api: &MockApi) -> InstanceRegistry {
        let mut registry = InstanceRegistry::new();
        registry.load(api, &EventBus::new()).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_load_replaces_and_bounds_checks() {
        let api = MockApi::new().with_map(
            3,
            2,
            vec![
                instance_record(10, "rock", 1, 0, 4),
                instance_record(11, "oob", 3, 0, 4),
                instance_record(12, "tree", 2, 1, 5),
            ],
        );
        let registry = registry_with(&api).await;

        assert_eq!(registry.width(), 3);
        assert_eq!(registry.height(), 2);
        assert_eq!(registry.len(), 2);
        assert!(registry.by_id(InstanceId(10)).is_some());
        // The out-of-bounds record was dropped, not stored.
        assert!(registry.by_id(InstanceId(11)).is_none());
    }

    #[tokio::test]
    async fn test_select_projects_in_caller_order() {
        let api = MockApi::new().with_map(
            4,
            4,
            vec![
                instance_record(1, "a", 0, 0, 1),
                instance_record(2, "b", 1, 1, 1),
            ],
        );
        let registry = registry_with(&api).await;

        let selected = registry.select(&[InstanceId(2), InstanceId(7), InstanceId(1)]);
        assert_eq!(selected[0].unwrap().label, "b");
        assert!(selected[1].is_none());
        assert_eq!(selected[2].unwrap().label, "a");
    }

    #[tokio::test]
    async fn test_by_concept_queries_the_server() {
        let api = MockApi::new()
            .with_map(4, 4, vec![])
            .with_concept_instances(4, vec![instance_record(7, "rock", 3, 3, 4)]);
        let registry = registry_with(&api).await;

        let found = registry.by_concept(&api, ConceptId(4)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, InstanceId(7));

        let none = registry.by_concept(&api, ConceptId(9)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_server_ack() {
        let api = MockApi::new()
            .with_map(4, 4, vec![instance_record(1, "a", 0, 0, 1)])
            .fail_delete(500);
        let mut registry = registry_with(&api).await;

        let result = registry.delete(&api, InstanceId(1)).await;
        assert!(result.is_err());
        // Server refused: local state untouched.
        assert!(registry.by_id(InstanceId(1)).is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_after_ack() {
        let api = MockApi::new().with_map(4, 4, vec![instance_record(1, "a", 0, 0, 1)]);
        let mut registry = registry_with(&api).await;

        registry.delete(&api, InstanceId(1)).await.unwrap();
        assert!(registry.is_empty());
        assert_eq!(api.deleted(), vec![1]);
    }

    #[tokio::test]
    async fn test_delete_unknown_instance_skips_network() {
        let api = MockApi::new().with_map(4, 4, vec![]);
        let mut registry = registry_with(&api).await;

        let err = registry.delete(&api, InstanceId(9)).await.unwrap_err();
        assert!(matches!(err, MapError::UnknownInstance(InstanceId(9))));
        assert!(api.deleted().is_empty());
    }
}
