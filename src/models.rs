use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Importance assigned to a turn when the model does not supply a usable one.
pub const DEFAULT_IMPORTANCE: u8 = 2;

/// One question/answer turn in a conversation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: Uuid,
    pub project_id: Uuid,
    pub question: String,
    pub answer: String,
    pub keywords: Vec<String>,
    pub importance: u8,
    pub position: Position,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_pending: bool,
    pub created_at: DateTime<Utc>,
}

/// Directed link from a parent turn to the turn that branched off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: Uuid,
    pub project_id: Uuid,
    pub source: Uuid,
    pub target: Uuid,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    pub created_at: DateTime<Utc>,
}

/// Connection style of an edge. A single style exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    #[default]
    Solid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// 3D layout coordinate of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
}

/// Structured record produced by the generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReply {
    pub answer: String,
    pub keywords: Vec<String>,
    pub importance: u8,
}

fn is_false(value: &bool) -> bool {
    !*value
}
