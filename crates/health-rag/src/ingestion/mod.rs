//! Ingestion: raw sources -> normalized user records -> chunks, plus the
//! daily-summary feed for the ingest gateway

pub mod builder;
pub mod chunker;
pub mod daily;
pub mod derive;
pub mod normalizer;
pub mod summary;
pub mod uploader;

pub use builder::DocumentBuilder;
pub use chunker::TextChunker;
pub use daily::{DailyAggregator, DailyLoader, DaySummary, UserProfile};
pub use derive::{calculate_bmi, calculate_fitness_level, derive_attributes, determine_user_goals};
pub use normalizer::{merge_sources, RawSource, RecordNormalizer};
pub use summary::create_health_summary;
pub use uploader::{SummaryUploader, UploadReport};
