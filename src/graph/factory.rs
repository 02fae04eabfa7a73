use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::layout::Layout;
use super::GraphStore;
use crate::error::GraphResult;
use crate::generation::AnswerGenerator;
use crate::models::{Edge, EdgeType, Node};

/// Outcome of one turn: the durable node and, when the turn branched off an
/// existing node, the connecting edge.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub node: Node,
    pub edge: Option<Edge>,
}

/// Builds and persists the node/edge pair for one conversational turn.
#[derive(Clone)]
pub struct TurnFactory {
    generator: Arc<dyn AnswerGenerator>,
    store: Arc<dyn GraphStore>,
    layout: Arc<dyn Layout>,
}

impl TurnFactory {
    pub fn new(
        generator: Arc<dyn AnswerGenerator>,
        store: Arc<dyn GraphStore>,
        layout: Arc<dyn Layout>,
    ) -> Self {
        Self {
            generator,
            store,
            layout,
        }
    }

    /// Generate the answer, place the node near its parent and persist the
    /// node, then the edge.
    ///
    /// A degraded generation still yields a valid node. A node write failure
    /// aborts the turn before any edge is attempted.
    #[instrument(skip(self))]
    pub async fn create_turn(
        &self,
        project_id: Uuid,
        parent_id: Option<Uuid>,
        question: &str,
    ) -> GraphResult<TurnRecord> {
        let parent = match parent_id {
            Some(id) => {
                let parent = self.store.resolve_node(id).await;
                if parent.is_none() {
                    warn!("Parent node {} could not be resolved, placing at origin", id);
                }
                parent
            }
            None => None,
        };

        let reply = self.generator.generate(question).await;

        let node = Node {
            id: Uuid::new_v4(),
            project_id,
            question: question.to_string(),
            answer: reply.answer,
            keywords: reply.keywords,
            importance: reply.importance,
            position: self
                .layout
                .place_child(parent.as_ref().map(|p| p.position)),
            is_pending: false,
            created_at: Utc::now(),
        };

        let node = self.store.persist_node(node).await?;
        debug!("Persisted node {} in project {}", node.id, project_id);

        let edge = match parent {
            Some(parent_node) => {
                let edge = Edge {
                    id: Uuid::new_v4(),
                    project_id,
                    source: parent_node.id,
                    target: node.id,
                    edge_type: EdgeType::Solid,
                    created_at: Utc::now(),
                };
                Some(self.store.persist_edge(edge).await?)
            }
            None => None,
        };

        Ok(TurnRecord { node, edge })
    }
}
