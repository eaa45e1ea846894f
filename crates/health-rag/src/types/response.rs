//! Response types for both HTTP surfaces

use serde::{Deserialize, Serialize};

use super::document::{Chunk, FitnessLevel};

/// Answer with its evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Generated answer
    pub answer: String,
    /// Retrieved chunks that survived filtering, truncated for display
    pub source_documents: Vec<SourceDocument>,
    /// Self-assessment, `null` when self-evaluation was disabled
    pub self_rag_evaluation: Option<SelfRagEvaluation>,
}

/// Outward-facing view of a retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Owning user
    pub user_id: String,
    /// Fitness classification
    pub fitness_level: FitnessLevel,
    /// Body-mass index
    pub bmi: Option<f64>,
    /// Preview of the chunk text
    pub content: String,
}

impl SourceDocument {
    /// Project a chunk, keeping only a preview of its text
    pub fn from_chunk(chunk: &Chunk, preview_chars: usize) -> Self {
        Self {
            user_id: chunk.metadata.user_id.clone(),
            fitness_level: chunk.metadata.fitness_level,
            bmi: chunk.metadata.bmi,
            content: chunk.preview(preview_chars),
        }
    }
}

/// The three self-assessments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRagEvaluation {
    /// Model asked for further retrieval
    pub needs_retrieval: bool,
    /// Model judged the evidence sufficient
    pub sufficient_info: bool,
    /// Model judged that answering needs speculation
    pub has_hallucination: bool,
}

/// Parsed self-evaluating reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRagResult {
    /// Final answer text
    pub answer: String,
    /// Further retrieval needed
    pub needs_retrieval: bool,
    /// Information sufficient
    pub sufficient_info: bool,
    /// Answering would require speculation
    pub has_hallucination: bool,
}

impl SelfRagResult {
    /// The booleans without the answer
    pub fn evaluation(&self) -> SelfRagEvaluation {
        SelfRagEvaluation {
            needs_retrieval: self.needs_retrieval,
            sufficient_info: self.sufficient_info,
            has_hallucination: self.has_hallucination,
        }
    }
}

/// Question-answering health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `initializing`
    pub status: String,
    /// `initialized` or `not_initialized`
    pub vector_store: String,
    /// `yes` or `no`
    pub documents_loaded: String,
}

impl HealthResponse {
    /// Index built and serving
    pub fn ready() -> Self {
        Self {
            status: "healthy".to_string(),
            vector_store: "initialized".to_string(),
            documents_loaded: "yes".to_string(),
        }
    }

    /// Index still being built (or failed to build)
    pub fn initializing() -> Self {
        Self {
            status: "initializing".to_string(),
            vector_store: "not_initialized".to_string(),
            documents_loaded: "no".to_string(),
        }
    }
}

/// Gateway ingest acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Always `ok`
    pub status: String,
}

impl IngestResponse {
    /// Successful ingest
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// A stored object returned by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Stored text
    pub text: String,
    /// Stored metadata (serialized JSON)
    pub meta: String,
}

/// Gateway query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQueryResponse {
    /// Nearest objects, most similar first
    pub results: Vec<VectorMatch>,
}

/// Gateway health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayHealth {
    /// `healthy` or `unhealthy`
    pub status: String,
    /// Failure detail when unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::ChunkMetadata;

    #[test]
    fn test_missing_evaluation_serializes_as_null() {
        let response = AskResponse {
            answer: "answer".to_string(),
            source_documents: vec![],
            self_rag_evaluation: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["self_rag_evaluation"].is_null());
        assert!(json.get("self_rag_evaluation").is_some());
    }

    #[test]
    fn test_source_document_projection() {
        let chunk = Chunk::new(
            "x".repeat(300),
            ChunkMetadata {
                user_id: "42".to_string(),
                fitness_level: FitnessLevel::Beginner,
                goals: vec!["general_fitness".to_string()],
                bmi: None,
            },
            1,
        );
        let doc = SourceDocument::from_chunk(&chunk, 200);
        assert_eq!(doc.user_id, "42");
        assert_eq!(doc.content, format!("{}...", "x".repeat(200)));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["fitness_level"], "beginner");
        assert!(json["bmi"].is_null());
    }
}
