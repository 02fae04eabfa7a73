/*!
# Sidera Conversation Graph

Engine behind the Sidera constellation chat: every question/answer exchange
becomes a node in a 3D graph, edges link each turn to the turn it branched
from, and an optimistic in-memory view stays in sync with durable storage.

This library provides:
- Normalization of raw model output into `{answer, keywords, importance}`
- 3D placement of new nodes around their parent
- Node/edge assembly and node-then-edge persistence
- The optimistic add-turn state machine with a turn event stream
*/

pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod graph;
pub mod models;

pub use config::Config;
pub use conversation::{ConversationStore, TurnEvent, LOST_CONNECTION_ANSWER, THINKING_PLACEHOLDER};
pub use error::{GraphError, GraphResult};
pub use generation::{AnswerGenerator, GeminiGenerator};
pub use graph::{
    GraphStore, Layout, MemoryGraphStore, RestGraphStore, ScatterLayout, TurnFactory, TurnRecord,
};
pub use models::{Edge, EdgeType, GeneratedReply, Node, Position, Project};
