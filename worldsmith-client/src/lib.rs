//! Typed REST client for the world-model server.
//!
//! This crate owns the wire contract: every response body is decoded here,
//! exactly once, into the typed records the rest of the workspace consumes.
//! The client performs no retry, backoff, or caching — callers own their
//! resilience policy. Failures are surfaced uniformly through [`Error`]
//! rather than ad hoc logging.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the server base URL.
pub const SERVER_URL_VAR: &str = "WORLDSMITH_SERVER_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:9000/";

/// Errors that can occur when talking to the world-model server.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is a not-found response from the server.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }
}

/// World-model server client.
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }

    /// Create a client from `WORLDSMITH_SERVER_URL`, falling back to
    /// `http://localhost:9000/`.
    pub fn from_env() -> Result<Self, Error> {
        let base = std::env::var(SERVER_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(Error::Config(format!(
                "{SERVER_URL_VAR} must be an http(s) URL, got {base:?}"
            )));
        }
        Ok(Self::new(base))
    }

    /// The configured base URL (always trailing-slash terminated).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full concept list.
    pub async fn fetch_concepts(&self) -> Result<Vec<ConceptRecord>, Error> {
        self.get_json("concepts").await
    }

    /// Fetch the bulk instance dump together with the map bounds.
    pub async fn fetch_map(&self) -> Result<MapSnapshot, Error> {
        self.get_json("instances").await
    }

    /// Fetch the relations whose source is the given concept.
    pub async fn fetch_relations(&self, concept_id: i64) -> Result<Vec<RelationRecord>, Error> {
        self.get_json(&format!("relations/{concept_id}")).await
    }

    /// Fetch every placed instance of a concept.
    pub async fn instances_of_concept(
        &self,
        concept_id: i64,
    ) -> Result<Vec<InstanceRecord>, Error> {
        self.get_json(&format!("instances/{concept_id}")).await
    }

    /// Fetch the instances reachable from a source instance via an action,
    /// filtered to a target concept. Used to populate action-target pickers.
    pub async fn action_targets(
        &self,
        instance_id: i64,
        action: &str,
        concept_id: i64,
    ) -> Result<Vec<InstanceRecord>, Error> {
        self.get_json(&format!("instances/{instance_id}/{action}/{concept_id}"))
            .await
    }

    /// Execute an action between two instances.
    pub async fn execute_action(
        &self,
        action: &str,
        source: i64,
        target: i64,
    ) -> Result<(), Error> {
        let body = ActionRequest {
            action: action.to_string(),
            instances: [source, target],
        };
        self.post_json("map/action", &body).await
    }

    /// Delete an instance on the server. The caller must not drop local
    /// state until this returns `Ok`.
    pub async fn delete_instance(&self, instance_id: i64) -> Result<(), Error> {
        self.post_json(&format!("instances/delete/{instance_id}"), &())
            .await
    }

    /// Query the node/edge subgraph around a labelled node, up to the given
    /// traversal depth.
    pub async fn search_graph(&self, label: &str, depth: u32) -> Result<SubgraphRecord, Error> {
        self.get_json(&format!("graph/nodes/{label}?depth={depth}"))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        response.json().await.map_err(|e| Error::Parse(e.to_string()))
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        Ok(())
    }
}

// ============================================================================
// Wire records
// ============================================================================

/// A concept as the server describes it.
#[derive(Debug, Clone, Deserialize)]
pub struct ConceptRecord {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub display: DisplayRecord,
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
}

/// A typed property slot on a concept.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyRecord {
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Display attributes for a concept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayRecord {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub zindex: i32,
}

/// A property-default override rule on a concept.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleRecord {
    pub property: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// A directed relation template, keyed by its source concept.
///
/// The server spells the label field either `relation` or `label`
/// depending on the endpoint revision; both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationRecord {
    #[serde(alias = "relation")]
    pub label: String,
    #[serde(rename = "conceptId")]
    pub concept_id: i64,
}

/// Grid coordinates of a placed instance.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinatesRecord {
    pub x: i64,
    pub y: i64,
}

/// A placed instance as the server describes it.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceRecord {
    pub id: i64,
    pub label: String,
    pub coordinates: CoordinatesRecord,
    pub concept: i64,
    #[serde(default)]
    pub properties: Vec<serde_json::Value>,
}

/// The bulk instance dump: map bounds plus every placed instance.
///
/// The server sometimes nests the `instances` array (grouped per concept);
/// the decoder flattens arbitrary nesting into one flat list.
#[derive(Debug, Clone, Deserialize)]
pub struct MapSnapshot {
    pub width: u32,
    pub height: u32,
    #[serde(deserialize_with = "flatten_instances")]
    pub instances: Vec<InstanceRecord>,
}

/// A node in a graph search result.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    pub label: String,
}

/// An edge in a graph search result.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub source: i64,
    pub target: i64,
    #[serde(default)]
    pub label: String,
}

/// Result of a subgraph search.
#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Serialize)]
struct ActionRequest {
    action: String,
    instances: [i64; 2],
}

/// Either a single instance record or a nested array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstanceTree {
    Leaf(InstanceRecord),
    Branch(Vec<InstanceTree>),
}

impl InstanceTree {
    fn collect_into(self, out: &mut Vec<InstanceRecord>) {
        match self {
            InstanceTree::Leaf(record) => out.push(record),
            InstanceTree::Branch(children) => {
                for child in children {
                    child.collect_into(out);
                }
            }
        }
    }
}

fn flatten_instances<'de, D>(deserializer: D) -> Result<Vec<InstanceRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let trees = Vec::<InstanceTree>::deserialize(deserializer)?;
    let mut out = Vec::new();
    for tree in trees {
        tree.collect_into(&mut out);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = Client::new("http://example.com/api");
        assert_eq!(client.base_url(), "http://example.com/api/");

        let client = Client::new("http://example.com/api/");
        assert_eq!(client.base_url(), "http://example.com/api/");
    }

    #[test]
    fn test_concept_record_defaults() {
        let concept: ConceptRecord =
            serde_json::from_str(r#"{"id": 4, "label": "Rock"}"#).unwrap();
        assert_eq!(concept.id, 4);
        assert_eq!(concept.label, "Rock");
        assert!(concept.properties.is_empty());
        assert!(concept.display.color.is_none());
        assert_eq!(concept.display.zindex, 0);
    }

    #[test]
    fn test_relation_record_accepts_both_spellings() {
        let a: RelationRecord =
            serde_json::from_str(r#"{"relation": "eat", "conceptId": 7}"#).unwrap();
        assert_eq!(a.label, "eat");
        assert_eq!(a.concept_id, 7);

        let b: RelationRecord =
            serde_json::from_str(r#"{"label": "eat", "conceptId": 7}"#).unwrap();
        assert_eq!(b.label, "eat");
    }

    #[test]
    fn test_map_snapshot_flattens_nested_instances() {
        let json = r#"{
            "width": 3,
            "height": 2,
            "instances": [
                [
                    {"id": 10, "label": "rock", "coordinates": {"x": 1, "y": 0}, "concept": 4, "properties": []}
                ],
                [
                    [
                        {"id": 11, "label": "tree", "coordinates": {"x": 2, "y": 1}, "concept": 5, "properties": []}
                    ]
                ],
                {"id": 12, "label": "wolf", "coordinates": {"x": 0, "y": 0}, "concept": 6, "properties": []}
            ]
        }"#;

        let snapshot: MapSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.width, 3);
        assert_eq!(snapshot.height, 2);
        let ids: Vec<i64> = snapshot.instances.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_not_found_detection() {
        let err = Error::Api {
            status: 404,
            message: "no such node".to_string(),
        };
        assert!(err.is_not_found());

        let err = Error::Api {
            status: 500,
            message: String::new(),
        };
        assert!(!err.is_not_found());
    }
}
