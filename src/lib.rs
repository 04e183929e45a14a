pub mod cli;
pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;

// Re-export core types
pub use crate::core::EmbedError;

// Re-export model types for easier access
pub use models::implementations::{BertModel, SentenceBertModel, SentenceBertSize};

pub use pipelines::embedding_pipeline::{
    EmbeddingPipeline, EmbeddingPipelineBuilder, EncodeStrategy, PoolingStrategy,
};
pub use pipelines::TextEmbedder;
