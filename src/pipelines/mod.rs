// Pipeline modules organized by functionality
pub mod embedding_pipeline;
pub mod traits;
pub mod utils;

pub use traits::TextEmbedder;
