//! The server API seam.
//!
//! Registries and the controller talk to the server through this trait so
//! tests can substitute a scripted [`crate::testing::MockApi`] for the real
//! HTTP client.

use worldsmith_client::{
    Client, ConceptRecord, Error, InstanceRecord, MapSnapshot, RelationRecord, SubgraphRecord,
};

/// Async access to the world-model server endpoints the core consumes.
#[allow(async_fn_in_trait)]
pub trait WorldApi {
    /// GET `concepts` — the full concept list.
    async fn fetch_concepts(&self) -> Result<Vec<ConceptRecord>, Error>;

    /// GET `instances` — map bounds plus the bulk instance dump.
    async fn fetch_map(&self) -> Result<MapSnapshot, Error>;

    /// GET `relations/:conceptId` — relations sourced at a concept.
    async fn fetch_relations(&self, concept_id: i64) -> Result<Vec<RelationRecord>, Error>;

    /// GET `instances/:conceptId` — every placed instance of a concept.
    async fn instances_of_concept(&self, concept_id: i64)
        -> Result<Vec<InstanceRecord>, Error>;

    /// GET `instances/{instanceId}/{action}/{conceptId}` — action targets.
    async fn action_targets(
        &self,
        instance_id: i64,
        action: &str,
        concept_id: i64,
    ) -> Result<Vec<InstanceRecord>, Error>;

    /// POST `map/action` — execute an action between two instances.
    async fn execute_action(&self, action: &str, source: i64, target: i64) -> Result<(), Error>;

    /// POST `instances/delete/:id` — delete an instance server-side.
    async fn delete_instance(&self, instance_id: i64) -> Result<(), Error>;

    /// GET `graph/nodes/:label?depth=n` — subgraph search.
    async fn search_graph(&self, label: &str, depth: u32) -> Result<SubgraphRecord, Error>;
}

impl WorldApi for Client {
    async fn fetch_concepts(&self) -> Result<Vec<ConceptRecord>, Error> {
        Client::fetch_concepts(self).await
    }

    async fn fetch_map(&self) -> Result<MapSnapshot, Error> {
        Client::fetch_map(self).await
    }

    async fn fetch_relations(&self, concept_id: i64) -> Result<Vec<RelationRecord>, Error> {
        Client::fetch_relations(self, concept_id).await
    }

    async fn instances_of_concept(
        &self,
        concept_id: i64,
    ) -> Result<Vec<InstanceRecord>, Error> {
        Client::instances_of_concept(self, concept_id).await
    }

    async fn action_targets(
        &self,
        instance_id: i64,
        action: &str,
        concept_id: i64,
    ) -> Result<Vec<InstanceRecord>, Error> {
        Client::action_targets(self, instance_id, action, concept_id).await
    }

    async fn execute_action(&self, action: &str, source: i64, target: i64) -> Result<(), Error> {
        Client::execute_action(self, action, source, target).await
    }

    async fn delete_instance(&self, instance_id: i64) -> Result<(), Error> {
        Client::delete_instance(self, instance_id).await
    }

    async fn search_graph(&self, label: &str, depth: u32) -> Result<SubgraphRecord, Error> {
        Client::search_graph(self, label, depth).await
    }
}
