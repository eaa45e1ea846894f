//! Document builder: user record -> summary -> chunks with metadata

use std::collections::BTreeMap;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkMetadata, UserRecord};

use super::chunker::TextChunker;
use super::derive::derive_attributes;
use super::summary::create_health_summary;

/// Turns normalized records into retrieval chunks
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    chunker: TextChunker,
}

impl DocumentBuilder {
    /// Create a builder around a chunker
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    /// Create from chunking configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(TextChunker::from_config(config))
    }

    /// Build every chunk for one user. Every chunk carries the same metadata.
    pub fn build(&self, record: &UserRecord) -> Vec<Chunk> {
        let summary = create_health_summary(record);
        let metadata = ChunkMetadata::new(&record.user_id, derive_attributes(record));

        self.chunker
            .split(&summary)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(text, metadata.clone(), i))
            .collect()
    }

    /// Build chunks for every user, in user-id order
    pub fn build_all(&self, records: &BTreeMap<String, UserRecord>) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = records.values().flat_map(|r| self.build(r)).collect();

        tracing::info!(
            "Built {} chunks from {} user records",
            chunks.len(),
            records.len()
        );

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FitnessLevel;
    use serde_json::json;

    fn record(user_id: &str, value: serde_json::Value) -> UserRecord {
        let mut record = UserRecord::new(user_id);
        record.merge(
            value
                .as_object()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
            "small/fitness-users.json",
        );
        record
    }

    #[test]
    fn test_metadata_is_shared_by_all_chunks() {
        let builder = DocumentBuilder::new(TextChunker::new(40, 10));
        let rec = record(
            "7",
            json!({
                "age": 29,
                "height": 1.8,
                "weight": 81.0,
                "Steps": 12000,
                "HeartRate": 65,
                "endurance_focus": true,
                "activity_data": {"running": "5 km", "swimming": "1 km"}
            }),
        );

        let chunks = builder.build(&rec);
        assert!(chunks.len() > 1);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.metadata.user_id, "7");
            assert_eq!(chunk.metadata.fitness_level, FitnessLevel::Advanced);
            assert_eq!(chunk.metadata.goals, vec!["endurance"]);
            assert_eq!(chunk.metadata.bmi, Some(25.0));
            assert!(chunk.text.chars().count() <= 40);
        }
    }

    #[test]
    fn test_build_all_is_ordered_by_user() {
        let builder = DocumentBuilder::from_config(&ChunkingConfig::default());
        let mut records = BTreeMap::new();
        for id in ["b", "a", "c"] {
            records.insert(id.to_string(), record(id, json!({"age": 30})));
        }

        let users: Vec<_> = builder
            .build_all(&records)
            .into_iter()
            .map(|c| c.metadata.user_id)
            .collect();
        assert_eq!(users, vec!["a", "b", "c"]);
    }
}
