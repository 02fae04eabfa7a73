pub mod gemini;
pub mod normalize;

use async_trait::async_trait;

use crate::models::GeneratedReply;

/// Generation collaborator. Implementations degrade internally and always
/// hand back a usable reply; errors never cross this boundary.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> GeneratedReply;
}

pub use gemini::GeminiGenerator;
pub use normalize::{
    missing_key_reply, normalize_reply, remote_failure_reply, MISSING_KEY_ANSWER,
    REMOTE_FAILURE_ANSWER,
};
