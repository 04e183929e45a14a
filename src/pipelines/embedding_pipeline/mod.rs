//! Text embedding pipeline for generating dense vector representations of text.
//!
//! This module turns text into fixed-length vectors that capture semantic
//! meaning, useful for similarity search, clustering, and other downstream
//! tasks.
//!
//! ## Main Types
//!
//! - [`EmbeddingPipeline`] - High-level interface for text embedding
//! - [`EmbeddingPipelineBuilder`] - Builder pattern for pipeline configuration
//! - [`EmbeddingModel`] - Trait for encoder model implementations
//! - [`SentenceBertModel`] - MiniLM / BGE sentence encoders
//! - [`EncodeStrategy`] / [`PoolingStrategy`] - How token states become one vector
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use text_embed::pipelines::embedding_pipeline::*;
//!
//! let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
//!     .build()?;
//!
//! let embedding = pipeline.embed("hello world")?;
//! assert_eq!(embedding.len(), 384);
//! # anyhow::Ok(())
//! ```

pub mod builder;
pub mod embedding_model;
pub mod embedding_pipeline;
pub mod pooling;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::EmbeddingPipelineBuilder;
pub use embedding_model::EmbeddingModel;
pub use embedding_pipeline::EmbeddingPipeline;
pub use pooling::{EncodeStrategy, PoolingConfig, PoolingStrategy};

pub use crate::models::implementations::sentence_bert::SentenceBertModel;
pub use crate::models::implementations::sentence_bert::SentenceBertSize;

pub use anyhow::Result;
