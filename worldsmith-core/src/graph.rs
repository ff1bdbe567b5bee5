//! Concept registry: the client-side cache of the world graph's node types.
//!
//! Concepts are bulk-loaded once at startup; relations are attached lazily
//! the first time a concept's relations are requested and cached for the
//! rest of the session. Concepts are never removed during a session.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::WorldApi;
use crate::events::{EventBus, WorldEvent};
use crate::model::{Concept, ConceptId, Relation};

/// Errors from concept registry operations.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Api(#[from] worldsmith_client::Error),

    #[error("unknown concept {0}")]
    UnknownConcept(ConceptId),
}

/// Where a relation list came from.
///
/// `Fetched` is the cue that a network round-trip happened, so the caller
/// may need to refresh dependent UI; `Cache` means the answer was produced
/// synchronously from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSource {
    Cache,
    Fetched,
}

/// The set of known concept definitions, keyed by id, in server order.
#[derive(Debug, Default)]
pub struct ConceptRegistry {
    concepts: HashMap<ConceptId, Concept>,
    order: Vec<ConceptId>,
}

impl ConceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load the concept list from the server, then signal readiness.
    ///
    /// On failure the registry is left untouched (empty on the initial load)
    /// and the error propagates; no readiness event is emitted.
    pub async fn load<A: WorldApi>(&mut self, api: &A, bus: &EventBus) -> Result<(), GraphError> {
        let records = api.fetch_concepts().await?;
        debug!(count = records.len(), "loaded concepts");

        self.concepts.clear();
        self.order.clear();
        for record in records {
            let concept = Concept::from(record);
            let id = concept.id;
            if self.concepts.insert(id, concept).is_none() {
                self.order.push(id);
            } else {
                warn!(%id, "duplicate concept id in bulk load, keeping latest");
            }
        }

        bus.publish(WorldEvent::ConceptsReady);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// All concepts, in the order the server listed them.
    pub fn get(&self) -> impl Iterator<Item = &Concept> {
        self.order.iter().filter_map(|id| self.concepts.get(id))
    }

    pub fn by_id(&self, id: ConceptId) -> Option<&Concept> {
        self.concepts.get(&id)
    }

    /// Project a subset in caller order. Unknown ids yield `None` at the
    /// matching position rather than being skipped.
    pub fn select(&self, ids: &[ConceptId]) -> Vec<Option<&Concept>> {
        ids.iter().map(|id| self.concepts.get(id)).collect()
    }

    /// The relations sourced at `id`, fetching them on first request.
    ///
    /// A cache hit returns synchronously with `RelationSource::Cache`. A miss
    /// fetches, appends the result to whatever is already attached (merge,
    /// never replace), memoizes, and returns `RelationSource::Fetched`.
    ///
    /// Exclusive access through `&mut self` means a second request for the
    /// same concept cannot start while a fetch is in flight, so a duplicate
    /// append is unrepresentable.
    pub async fn relations<A: WorldApi>(
        &mut self,
        api: &A,
        id: ConceptId,
    ) -> Result<(Vec<Relation>, RelationSource), GraphError> {
        {
            let concept = self
                .concepts
                .get(&id)
                .ok_or(GraphError::UnknownConcept(id))?;
            if let Some(relations) = &concept.relations {
                return Ok((relations.clone(), RelationSource::Cache));
            }
        }

        let records = api.fetch_relations(id.0).await?;
        debug!(concept = %id, count = records.len(), "fetched relations");

        let concept = self
            .concepts
            .get_mut(&id)
            .ok_or(GraphError::UnknownConcept(id))?;
        let slot = concept.relations.get_or_insert_with(Vec::new);
        slot.extend(records.into_iter().map(Relation::from));

        Ok((slot.clone(), RelationSource::Fetched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{concept_record, relation_record, MockApi};

    async fn registry_with(api: &MockApi) -> ConceptRegistry {
        let mut registry = ConceptRegistry::new();
        registry.load(api, &EventBus::new()).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_load_preserves_server_order() {
        let api = MockApi::new().with_concepts(vec![
            concept_record(5, "Water", "#0000ff", 0),
            concept_record(2, "Rock", "#aaaaaa", 3),
            concept_record(9, "Tree", "#00aa00", 1),
        ]);
        let registry = registry_with(&api).await;

        let ids: Vec<ConceptId> = registry.get().map(|c| c.id).collect();
        assert_eq!(ids, vec![ConceptId(5), ConceptId(2), ConceptId(9)]);
    }

    #[tokio::test]
    async fn test_select_projects_in_caller_order() {
        let api = MockApi::new().with_concepts(vec![
            concept_record(1, "A", "#111111", 0),
            concept_record(2, "B", "#222222", 0),
        ]);
        let registry = registry_with(&api).await;

        let selected = registry.select(&[ConceptId(2), ConceptId(42), ConceptId(1)]);
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].unwrap().label, "B");
        assert!(selected[1].is_none());
        assert_eq!(selected[2].unwrap().label, "A");
    }

    #[tokio::test]
    async fn test_load_failure_leaves_registry_empty() {
        let api = MockApi::new().fail_concepts(500);
        let mut registry = ConceptRegistry::new();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let result = registry.load(&api, &bus).await;
        assert!(result.is_err());
        assert!(registry.is_empty());
        // No readiness signal on the failure path.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relations_cached_after_first_fetch() {
        let api = MockApi::new()
            .with_concepts(vec![concept_record(1, "Wolf", "#333333", 0)])
            .with_relations(1, vec![relation_record("eat", 2), relation_record("flee", 3)]);
        let mut registry = registry_with(&api).await;

        let (first, source) = registry.relations(&api, ConceptId(1)).await.unwrap();
        assert_eq!(source, RelationSource::Fetched);
        assert_eq!(first.len(), 2);

        let (second, source) = registry.relations(&api, ConceptId(1)).await.unwrap();
        assert_eq!(source, RelationSource::Cache);
        assert_eq!(second, first);

        // Exactly one network round-trip for this concept.
        assert_eq!(api.relation_fetch_count(1), 1);
    }

    #[tokio::test]
    async fn test_relations_unknown_concept() {
        let api = MockApi::new().with_concepts(vec![concept_record(1, "A", "#111111", 0)]);
        let mut registry = registry_with(&api).await;

        let err = registry.relations(&api, ConceptId(99)).await.unwrap_err();
        assert!(matches!(err, GraphError::UnknownConcept(ConceptId(99))));
    }
}
