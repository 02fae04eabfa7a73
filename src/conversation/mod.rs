use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{GraphError, GraphResult};
use crate::graph::factory::{TurnFactory, TurnRecord};
use crate::graph::GraphStore;
use crate::models::{Edge, Node, Position, DEFAULT_IMPORTANCE};

/// Answer shown on a placeholder node while its turn is in flight.
pub const THINKING_PLACEHOLDER: &str = "Contemplating the stars...";

/// Answer installed on a placeholder whose turn could not be persisted.
pub const LOST_CONNECTION_ANSWER: &str = "I lost my connection to the stars. Please try again.";

/// Maximum length, in characters, of a title derived from the first question.
pub const TITLE_MAX_CHARS: usize = 30;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Transition notifications for one turn, streamed to the rendering layer.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// Optimistic placeholder inserted into the visible sequence.
    Pending { node: Node },
    /// Placeholder replaced in place by the durable node, plus the edge when
    /// the turn branched off a parent.
    Committed {
        temp_id: Uuid,
        node: Node,
        edge: Option<Edge>,
    },
    /// Remote round trip failed; the placeholder now carries the failure
    /// answer.
    Failed { temp_id: Uuid, reason: String },
}

/// The client-side view of one conversation graph.
#[derive(Debug, Clone)]
struct GraphView {
    project_id: Option<Uuid>,
    title: String,
    last_updated: DateTime<Utc>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    active_node: Option<Uuid>,
}

impl GraphView {
    fn new(title: &str) -> Self {
        Self {
            project_id: None,
            title: title.to_string(),
            last_updated: Utc::now(),
            nodes: Vec::new(),
            edges: Vec::new(),
            active_node: None,
        }
    }
}

/// Stateful orchestrator of a conversation graph.
///
/// `add_turn` inserts an optimistic placeholder synchronously, then either
/// commits the durable node over it or marks it failed. The placeholder is
/// never removed; the visible sequence only ever grows.
#[derive(Clone)]
pub struct ConversationStore {
    state: Arc<RwLock<GraphView>>,
    factory: TurnFactory,
    store: Arc<dyn GraphStore>,
    events: broadcast::Sender<TurnEvent>,
    default_name: String,
}

impl ConversationStore {
    pub fn new(
        factory: TurnFactory,
        store: Arc<dyn GraphStore>,
        default_name: impl Into<String>,
    ) -> Self {
        let default_name = default_name.into();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(GraphView::new(&default_name))),
            factory,
            store,
            events,
            default_name,
        }
    }

    /// Add one question/answer turn to the conversation.
    ///
    /// The placeholder node is visible, and the active pointer moved to it,
    /// before any remote work starts. On success the returned node is the
    /// durable one; on persistence failure the placeholder keeps a visible
    /// failure answer and the error is returned.
    #[instrument(skip(self))]
    pub async fn add_turn(&self, question: &str) -> GraphResult<Node> {
        let project_id = self.ensure_conversation().await?;

        let temp_id = Uuid::new_v4();
        // Parent selection is captured here; turns issued while this one is
        // in flight do not change it.
        let parent_id = {
            let mut view = self.state.write().await;
            let parent_id = view.active_node;
            let placeholder = Node {
                id: temp_id,
                project_id,
                question: question.to_string(),
                answer: THINKING_PLACEHOLDER.to_string(),
                keywords: Vec::new(),
                importance: DEFAULT_IMPORTANCE,
                position: Position::ORIGIN,
                is_pending: true,
                created_at: Utc::now(),
            };
            view.nodes.push(placeholder.clone());
            view.active_node = Some(temp_id);
            view.last_updated = Utc::now();
            let _ = self.events.send(TurnEvent::Pending { node: placeholder });
            parent_id
        };

        debug!("Turn {} pending (parent {:?})", temp_id, parent_id);

        match self.factory.create_turn(project_id, parent_id, question).await {
            Ok(record) => Ok(self.commit_turn(temp_id, record).await),
            Err(err) => {
                self.fail_turn(temp_id, &err).await;
                Err(err)
            }
        }
    }

    /// Select an existing node as the branch point for the next turn.
    pub async fn set_active_node(&self, id: Uuid) -> GraphResult<()> {
        let mut view = self.state.write().await;
        if view.nodes.iter().any(|n| n.id == id) {
            view.active_node = Some(id);
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(id))
        }
    }

    /// Adopt an existing conversation: fetch its graph through the storage
    /// collaborator and make it the visible view.
    #[instrument(skip(self))]
    pub async fn load(&self, project_id: Uuid) -> GraphResult<()> {
        let project = self
            .store
            .fetch_project(project_id)
            .await?
            .ok_or(GraphError::ProjectNotFound(project_id))?;
        let nodes = self.store.project_nodes(project_id).await?;
        let edges = self.store.project_edges(project_id).await?;

        let mut view = self.state.write().await;
        view.project_id = Some(project.id);
        view.title = match nodes.first() {
            Some(first) => derive_title(&first.question),
            None => project.name,
        };
        view.last_updated = project.last_updated;
        view.active_node = nodes.last().map(|n| n.id);
        view.nodes = nodes;
        view.edges = edges;
        info!(
            "Loaded conversation {} with {} nodes",
            project_id,
            view.nodes.len()
        );
        Ok(())
    }

    /// Read-only snapshot of the visible node sequence.
    pub async fn nodes(&self) -> Vec<Node> {
        self.state.read().await.nodes.clone()
    }

    /// Read-only snapshot of the edge collection.
    pub async fn edges(&self) -> Vec<Edge> {
        self.state.read().await.edges.clone()
    }

    pub async fn active_node_id(&self) -> Option<Uuid> {
        self.state.read().await.active_node
    }

    pub async fn title(&self) -> String {
        self.state.read().await.title.clone()
    }

    pub async fn project_id(&self) -> Option<Uuid> {
        self.state.read().await.project_id
    }

    pub async fn last_updated(&self) -> DateTime<Utc> {
        self.state.read().await.last_updated
    }

    /// Subscribe to turn transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    async fn ensure_conversation(&self) -> GraphResult<Uuid> {
        if let Some(project_id) = self.state.read().await.project_id {
            return Ok(project_id);
        }

        let project = self.store.create_project(&self.default_name).await?;

        let mut view = self.state.write().await;
        // a concurrent first turn may have won the race; keep its view
        if let Some(existing) = view.project_id {
            return Ok(existing);
        }
        info!("Created conversation '{}' ({})", project.name, project.id);
        view.project_id = Some(project.id);
        view.title = project.name;
        view.last_updated = project.last_updated;
        Ok(project.id)
    }

    async fn commit_turn(&self, temp_id: Uuid, record: TurnRecord) -> Node {
        let TurnRecord { node, edge } = record;
        let mut view = self.state.write().await;
        match view.nodes.iter().position(|n| n.id == temp_id) {
            Some(index) => {
                view.nodes[index] = node.clone();
                if index == 0 {
                    view.title = derive_title(&node.question);
                }
            }
            None => {
                warn!(
                    "Placeholder {} missing at commit, appending node {}",
                    temp_id, node.id
                );
                view.nodes.push(node.clone());
            }
        }
        if let Some(edge) = &edge {
            view.edges.push(edge.clone());
        }
        view.active_node = Some(node.id);
        view.last_updated = Utc::now();
        let _ = self.events.send(TurnEvent::Committed {
            temp_id,
            node: node.clone(),
            edge,
        });
        info!("Turn {} committed as node {}", temp_id, node.id);
        node
    }

    async fn fail_turn(&self, temp_id: Uuid, err: &GraphError) {
        let mut view = self.state.write().await;
        match view.nodes.iter_mut().find(|n| n.id == temp_id) {
            Some(node) => {
                node.answer = LOST_CONNECTION_ANSWER.to_string();
                node.is_pending = false;
            }
            None => warn!("Placeholder {} missing at failure", temp_id),
        }
        view.last_updated = Utc::now();
        let _ = self.events.send(TurnEvent::Failed {
            temp_id,
            reason: err.to_string(),
        });
        warn!("Turn {} failed: {}", temp_id, err);
    }
}

fn derive_title(question: &str) -> String {
    question.chars().take(TITLE_MAX_CHARS).collect()
}
