use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use super::pooling::PoolingStrategy;

/// Trait for encoder models used in the embedding pipeline.
///
/// A model only produces per-token hidden states; tokenization, pooling and
/// normalization are driven by [`EmbeddingPipeline`](super::EmbeddingPipeline).
pub trait EmbeddingModel {
    type Options: std::fmt::Debug + std::fmt::Display + Clone;

    fn new(options: Self::Options, device: Device) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Last hidden state with shape `(batch, seq, hidden)`.
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> anyhow::Result<Tensor>;

    fn get_tokenizer(options: Self::Options) -> anyhow::Result<Tokenizer>;

    /// Pooling the checkpoint was trained with.
    fn pooling(&self) -> PoolingStrategy;

    /// Whether the checkpoint's reference encoder L2-normalizes its output.
    fn normalizes(&self) -> bool;

    /// Sequence limit of the checkpoint's reference encoder.
    fn max_seq_len(&self) -> usize;

    /// Size of the position table; the hard limit on sequence length.
    fn max_position_embeddings(&self) -> usize;

    /// Pad id from the model config, used when the tokenizer has no `[PAD]`.
    fn pad_token_id(&self) -> u32;

    fn hidden_size(&self) -> usize;

    fn device(&self) -> &Device;
}
