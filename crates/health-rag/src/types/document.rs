//! Chunk and metadata types produced by the document builder

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse fitness classification derived from a user's metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    /// Average sub-score below 5
    Beginner,
    /// Average sub-score in [5, 7.5)
    Intermediate,
    /// Average sub-score of 7.5 or more
    Advanced,
    /// No sub-scores available
    Unknown,
}

impl FitnessLevel {
    /// Classify an average sub-score
    pub fn from_score(avg: f64) -> Self {
        if avg >= 7.5 {
            Self::Advanced
        } else if avg >= 5.0 {
            Self::Intermediate
        } else {
            Self::Beginner
        }
    }

    /// Lowercase label as stored in metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes computed purely from a [`UserRecord`](super::UserRecord)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedAttributes {
    /// Fitness classification
    pub fitness_level: FitnessLevel,
    /// Goal labels, never empty
    pub goals: Vec<String>,
    /// Body-mass index rounded to one decimal
    pub bmi: Option<f64>,
}

/// Metadata attached identically to every chunk of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Owning user
    pub user_id: String,
    /// Fitness classification
    pub fitness_level: FitnessLevel,
    /// Goal labels
    pub goals: Vec<String>,
    /// Body-mass index
    pub bmi: Option<f64>,
}

impl ChunkMetadata {
    /// Build metadata from a user's derived attributes
    pub fn new(user_id: impl Into<String>, derived: DerivedAttributes) -> Self {
        Self {
            user_id: user_id.into(),
            fitness_level: derived.fitness_level,
            goals: derived.goals,
            bmi: derived.bmi,
        }
    }

    /// Whether `goal` is one of the goal labels
    pub fn matches_goal(&self, goal: &str) -> bool {
        self.goals.iter().any(|g| g == goal)
    }
}

impl fmt::Display for ChunkMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bmi = self
            .bmi
            .map(|b| b.to_string())
            .unwrap_or_else(|| "n/a".to_string());

        write!(
            f,
            "user_id={}, fitness_level={}, goals=[{}], bmi={}",
            self.user_id,
            self.fitness_level,
            self.goals.join(", "),
            bmi
        )
    }
}

/// Immutable unit of retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub text: String,
    /// User metadata
    pub metadata: ChunkMetadata,
    /// Position of this chunk within the user's summary
    pub chunk_index: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata, chunk_index: usize) -> Self {
        Self {
            text: text.into(),
            metadata,
            chunk_index,
        }
    }

    /// First `max_chars` characters followed by an ellipsis marker
    pub fn preview(&self, max_chars: usize) -> String {
        let head: String = self.text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
