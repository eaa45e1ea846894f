//! Flat exact nearest-neighbor index over chunk embeddings.
//!
//! Every query scans every stored vector. Results are ordered by ascending
//! squared Euclidean distance; equal distances keep insertion order.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::distance::squared_l2;

/// A search result borrowed from the index
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    /// Matched chunk
    pub chunk: &'a Chunk,
    /// Squared Euclidean distance to the query (lower is closer)
    pub distance: f32,
    /// Insertion position of the chunk
    pub position: usize,
}

/// Immutable-after-build flat vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    /// Embedding dimensionality
    dimension: usize,
    /// Row-major embeddings, `dimension` floats per chunk
    vectors: Vec<f32>,
    /// Chunks in insertion order
    chunks: Vec<Chunk>,
}

impl FlatIndex {
    /// Create an empty index
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            chunks: Vec::new(),
        }
    }

    /// Build an index from embeddings paired 1:1 with chunks
    pub fn build(dimension: usize, embeddings: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<Self> {
        if embeddings.len() != chunks.len() {
            return Err(Error::vector_db(format!(
                "{} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut index = Self::new(dimension);
        index.vectors.reserve(dimension * chunks.len());
        index.chunks.reserve(chunks.len());

        for (embedding, chunk) in embeddings.into_iter().zip(chunks) {
            index.add(&embedding, chunk)?;
        }

        tracing::info!(
            "Built flat index: {} vectors, dimension {}",
            index.len(),
            index.dimension
        );

        Ok(index)
    }

    /// Append one embedding and its chunk
    pub fn add(&mut self, embedding: &[f32], chunk: Chunk) -> Result<()> {
        self.check_dimension(embedding)?;
        self.vectors.extend_from_slice(embedding);
        self.chunks.push(chunk);
        Ok(())
    }

    /// Exact k-nearest search.
    ///
    /// `k` larger than the index returns every chunk; an empty index returns nothing.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>> {
        self.check_dimension(query)?;

        let mut hits: Vec<SearchHit<'_>> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| SearchHit {
                chunk,
                distance: squared_l2(query, self.vector(position)),
                position,
            })
            .collect();

        // Stable sort keeps insertion order for ties
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k.min(self.len()));

        Ok(hits)
    }

    /// Stored embedding at an insertion position
    pub fn vector(&self, position: usize) -> &[f32] {
        let start = position * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// All chunks in insertion order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Embedding dimensionality
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Write the index to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::Index(format!("Failed to encode index: {}", e)))?;
        std::fs::write(path, bytes)?;

        tracing::info!(
            "Wrote index with {} vectors to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Read an index written by [`FlatIndex::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let (index, _): (Self, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| Error::Index(format!("Failed to decode {}: {}", path.display(), e)))?;

        if index.vectors.len() != index.dimension * index.chunks.len() {
            return Err(Error::Index(format!(
                "{} is inconsistent: {} floats for {} chunks of dimension {}",
                path.display(),
                index.vectors.len(),
                index.chunks.len(),
                index.dimension
            )));
        }

        Ok(index)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::vector_db(format!(
                "dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        Ok(())
    }
}
