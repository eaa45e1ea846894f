//! Shared stub providers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use health_rag::generation::prompt::HYDE_SYSTEM;
use health_rag::providers::{CompletionRequest, EmbeddingProvider, LlmProvider};
use health_rag::{Chunk, ChunkMetadata, Error, FitnessLevel, FlatIndex, RagConfig, RagContext, Result};

/// Embeds known texts to fixed vectors and records every request
pub struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
    fallback: Option<Vec<f32>>,
    dimensions: usize,
    pub seen: Mutex<Vec<String>>,
}

impl TableEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            table: HashMap::new(),
            fallback: None,
            dimensions,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    /// Vector for any text missing from the table
    pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = Some(vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.seen.lock().push(text.to_string());
        self.table
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| Error::embedding(format!("no vector for '{}'", text)))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        "table"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Replies with a hypothetical document to HyDE requests and `reply` otherwise
pub struct ScriptedLlm {
    hypothetical: String,
    reply: String,
    fail: bool,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(reply: &str) -> Self {
        Self {
            hypothetical: "hypothetical document".to_string(),
            reply: reply.to_string(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        if self.fail {
            return Err(Error::llm("model unavailable"));
        }
        if request.system == HYDE_SYSTEM {
            Ok(self.hypothetical.clone())
        } else {
            Ok(self.reply.clone())
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub fn chunk(user: &str, level: FitnessLevel, goals: &[&str], text: &str) -> Chunk {
    Chunk::new(
        text,
        ChunkMetadata {
            user_id: user.to_string(),
            fitness_level: level,
            goals: goals.iter().map(|g| g.to_string()).collect(),
            bmi: Some(24.5),
        },
        0,
    )
}

/// Three users on the unit axes: u1 -> x, u2 -> y, u3 -> z
pub fn three_user_index() -> FlatIndex {
    FlatIndex::build(
        3,
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
        vec![
            chunk("u1", FitnessLevel::Beginner, &["general_fitness"], "Age: 25 years\nTotal Steps: 3000.0"),
            chunk("u2", FitnessLevel::Advanced, &["strength", "endurance"], "Age: 31 years\nTotal Steps: 14000.0"),
            chunk("u3", FitnessLevel::Intermediate, &["flexibility"], "Age: 58 years\nTotal Steps: 8000.0"),
        ],
    )
    .expect("index builds")
}

/// Embedder that knows the test questions.
///
/// "closest to two" lands nearest u2, then u3, then u1.
pub fn question_embedder() -> TableEmbedder {
    TableEmbedder::new(3)
        .with("closest to two", vec![0.1, 0.9, 0.3])
        .with("hypothetical document", vec![0.0, 0.2, 0.9])
}

pub fn context(llm: Arc<ScriptedLlm>, embedder: Arc<TableEmbedder>) -> Arc<RagContext> {
    Arc::new(RagContext::new(
        RagConfig::default(),
        embedder,
        llm,
        three_user_index(),
    ))
}
