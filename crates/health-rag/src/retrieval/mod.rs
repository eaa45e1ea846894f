//! Retrieval: exact flat index and the vector math behind it

pub mod distance;
pub mod index;

pub use distance::{cosine_similarity, l2_normalize, squared_l2};
pub use index::{FlatIndex, SearchHit};
