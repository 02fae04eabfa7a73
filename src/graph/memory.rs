use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::GraphStore;
use crate::error::{GraphError, GraphResult};
use crate::models::{Edge, Node, Project};

/// In-process store. Nodes and edges keep insertion order so the visible
/// sequence matches write order.
#[derive(Default)]
pub struct MemoryGraphStore {
    projects: RwLock<HashMap<Uuid, Project>>,
    nodes: RwLock<Vec<Node>>,
    edges: RwLock<Vec<Edge>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn touch_project(&self, project_id: Uuid) {
        if let Some(project) = self.projects.write().await.get_mut(&project_id) {
            project.last_updated = Utc::now();
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn create_project(&self, name: &str) -> GraphResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            last_updated: now,
        };
        self.projects
            .write()
            .await
            .insert(project.id, project.clone());
        debug!("Created project '{}' ({})", project.name, project.id);
        Ok(project)
    }

    async fn fetch_project(&self, project_id: Uuid) -> GraphResult<Option<Project>> {
        Ok(self.projects.read().await.get(&project_id).cloned())
    }

    async fn persist_node(&self, node: Node) -> GraphResult<Node> {
        if !self.projects.read().await.contains_key(&node.project_id) {
            return Err(GraphError::ProjectNotFound(node.project_id));
        }
        self.nodes.write().await.push(node.clone());
        self.touch_project(node.project_id).await;
        Ok(node)
    }

    async fn persist_edge(&self, edge: Edge) -> GraphResult<Edge> {
        {
            let nodes = self.nodes.read().await;
            let in_project =
                |id: Uuid| nodes.iter().any(|n| n.id == id && n.project_id == edge.project_id);
            if !in_project(edge.source) || !in_project(edge.target) {
                return Err(GraphError::storage(format!(
                    "edge {} -> {} references a node missing from project {}",
                    edge.source, edge.target, edge.project_id
                )));
            }
        }
        self.edges.write().await.push(edge.clone());
        self.touch_project(edge.project_id).await;
        Ok(edge)
    }

    async fn resolve_node(&self, id: Uuid) -> Option<Node> {
        self.nodes.read().await.iter().find(|n| n.id == id).cloned()
    }

    async fn project_nodes(&self, project_id: Uuid) -> GraphResult<Vec<Node>> {
        Ok(self
            .nodes
            .read()
            .await
            .iter()
            .filter(|n| n.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn project_edges(&self, project_id: Uuid) -> GraphResult<Vec<Edge>> {
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }
}
