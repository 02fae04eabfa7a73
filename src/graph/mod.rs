pub mod factory;
pub mod layout;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::GraphResult;
use crate::models::{Edge, Node, Project};

/// Durable storage collaborator for conversation graphs.
///
/// Node and edge writes fail hard. `resolve_node` never does: a missing or
/// unreadable node simply comes back as `None` and the caller falls back to
/// the origin.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn create_project(&self, name: &str) -> GraphResult<Project>;

    async fn fetch_project(&self, project_id: Uuid) -> GraphResult<Option<Project>>;

    /// Durably record a node. The returned node is the stored one.
    async fn persist_node(&self, node: Node) -> GraphResult<Node>;

    /// Durably record an edge. Only called once both endpoints exist.
    async fn persist_edge(&self, edge: Edge) -> GraphResult<Edge>;

    async fn resolve_node(&self, id: Uuid) -> Option<Node>;

    /// Nodes of a project in insertion order.
    async fn project_nodes(&self, project_id: Uuid) -> GraphResult<Vec<Node>>;

    async fn project_edges(&self, project_id: Uuid) -> GraphResult<Vec<Edge>>;
}

pub use factory::{TurnFactory, TurnRecord};
pub use layout::{scatter, Layout, ScatterLayout, DEFAULT_SPREAD};
pub use memory::MemoryGraphStore;
pub use rest::RestGraphStore;
