//! Request types for both HTTP surfaces

use serde::{Deserialize, Serialize};

/// Question for the answer orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    pub question: String,

    /// Rewrite the question into a hypothetical document before retrieval (default: false)
    #[serde(default)]
    pub use_hyde: bool,

    /// Ask the model to self-evaluate the retrieved evidence (default: true)
    #[serde(default = "default_use_self_rag")]
    pub use_self_rag: bool,

    /// Keep only chunks with exactly this fitness level
    #[serde(default)]
    pub fitness_level: Option<String>,

    /// Keep only chunks with a goal label containing this text
    #[serde(default)]
    pub goal: Option<String>,
}

fn default_use_self_rag() -> bool {
    true
}

impl AskRequest {
    /// Create a request with default flags and no filters
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            use_hyde: false,
            use_self_rag: true,
            fitness_level: None,
            goal: None,
        }
    }

    /// Enable or disable query rewriting
    pub fn with_hyde(mut self, use_hyde: bool) -> Self {
        self.use_hyde = use_hyde;
        self
    }

    /// Enable or disable self-evaluation
    pub fn with_self_rag(mut self, use_self_rag: bool) -> Self {
        self.use_self_rag = use_self_rag;
        self
    }

    /// Filter by fitness level
    pub fn with_fitness_level(mut self, level: impl Into<String>) -> Self {
        self.fitness_level = Some(level.into());
        self
    }

    /// Filter by goal
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }
}

/// Gateway ingest body; a vector comes from `embedding` or is computed from `text`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Text to store (and embed if no embedding is given)
    #[serde(default)]
    pub text: Option<String>,
    /// Precomputed embedding
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Arbitrary metadata, stored serialized as a string
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

/// Gateway nearest-neighbor query body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorQueryRequest {
    /// Text to embed
    #[serde(default)]
    pub text: Option<String>,
    /// Precomputed query vector
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}
