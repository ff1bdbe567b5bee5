//! Client-side engine for a graph-based world-model editor.
//!
//! This crate provides:
//! - A typed domain model for concepts, relations, and placed instances
//! - Registries that load and cache the world graph from the server
//! - A pannable tile-map scene with hit-testing and a render scheduler
//! - A controller gating scene construction on dual registry readiness
//! - Graph search with deterministic force layout and shared selection
//! - A scripted mock server and harness for network-free tests
//!
//! # Quick Start
//!
//! ```ignore
//! use worldsmith_client::Client;
//! use worldsmith_core::{ControllerConfig, EventBus, MapController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::from_env()?;
//!     let mut controller = MapController::new(ControllerConfig::new(), EventBus::new());
//!
//!     controller.initialize(&client).await?;
//!
//!     if let Some(selection) = controller.select_tile(14, 3) {
//!         println!("tile ({}, {}): {:?}", selection.x, selection.y, selection.instances);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod controller;
pub mod events;
pub mod graph;
pub mod graph_view;
pub mod map;
pub mod model;
pub mod scene;
pub mod testing;
pub mod tiles;

// Primary public API
pub use api::WorldApi;
pub use controller::{ControllerConfig, ControllerError, LoadState, MapController};
pub use events::{EventBus, WorldEvent};
pub use graph::{ConceptRegistry, GraphError, RelationSource};
pub use graph_view::{ForceLayout, GraphSearch, GraphSelection, SearchOutcome, SelectionRegistry};
pub use map::{InstanceRegistry, MapError};
pub use model::{Color, Concept, ConceptId, Coordinates, Instance, InstanceId, Relation};
pub use scene::{
    DrawKind, DrawOp, Frame, PixelSize, RenderScheduler, Scene, SceneConfig, TileSelection,
};
pub use testing::{MockApi, TestHarness};
pub use tiles::TileIndex;
