use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::GraphStore;
use crate::error::{GraphError, GraphResult};
use crate::models::{Edge, Node, Project};

#[derive(Debug, Serialize)]
struct CreateProjectRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProjectGraphResponse {
    project: Project,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// `GraphStore` speaking the Sidera backend's JSON API.
pub struct RestGraphStore {
    client: Client,
    base_url: String,
}

impl RestGraphStore {
    pub fn new(base_url: impl Into<String>) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GraphError::configuration(format!("http client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("REST graph store initialized with URL: {}", base_url);

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> GraphResult<T>
    where
        B: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| GraphError::storage(format!("POST {}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(GraphError::storage(format!(
                "POST {}: status {}",
                path,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GraphError::storage(format!("POST {}: invalid body: {}", path, e)))
    }

    async fn fetch_graph(&self, project_id: Uuid) -> GraphResult<Option<ProjectGraphResponse>> {
        let path = format!("/api/projects/{}", project_id);
        let response = self
            .client
            .get(self.url(&path))
            .send()
            .await
            .map_err(|e| GraphError::storage(format!("GET {}: {}", path, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GraphError::storage(format!(
                "GET {}: status {}",
                path,
                response.status()
            )));
        }

        let graph = response
            .json()
            .await
            .map_err(|e| GraphError::storage(format!("GET {}: invalid body: {}", path, e)))?;
        Ok(Some(graph))
    }
}

#[async_trait]
impl GraphStore for RestGraphStore {
    async fn create_project(&self, name: &str) -> GraphResult<Project> {
        self.post_json("/api/projects", &CreateProjectRequest { name })
            .await
    }

    async fn fetch_project(&self, project_id: Uuid) -> GraphResult<Option<Project>> {
        Ok(self.fetch_graph(project_id).await?.map(|graph| graph.project))
    }

    async fn persist_node(&self, node: Node) -> GraphResult<Node> {
        self.post_json("/api/nodes", &node).await
    }

    async fn persist_edge(&self, edge: Edge) -> GraphResult<Edge> {
        self.post_json("/api/edges", &edge).await
    }

    async fn resolve_node(&self, id: Uuid) -> Option<Node> {
        let path = format!("/api/nodes/{}", id);
        match self.client.get(self.url(&path)).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Node>().await {
                    Ok(node) => Some(node),
                    Err(err) => {
                        warn!("Node {} body unreadable: {}", id, err);
                        None
                    }
                }
            }
            Ok(response) => {
                debug!("Node {} not resolvable: status {}", id, response.status());
                None
            }
            Err(err) => {
                warn!("Node {} lookup failed: {}", id, err);
                None
            }
        }
    }

    async fn project_nodes(&self, project_id: Uuid) -> GraphResult<Vec<Node>> {
        Ok(self
            .fetch_graph(project_id)
            .await?
            .map(|graph| graph.nodes)
            .unwrap_or_default())
    }

    async fn project_edges(&self, project_id: Uuid) -> GraphResult<Vec<Edge>> {
        Ok(self
            .fetch_graph(project_id)
            .await?
            .map(|graph| graph.edges)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_its_trailing_slash() {
        let store = RestGraphStore::new("http://localhost:5000/").unwrap();
        assert_eq!(store.url("/api/projects"), "http://localhost:5000/api/projects");
    }
}
