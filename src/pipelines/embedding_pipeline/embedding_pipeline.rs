use candle_core::{Device, Tensor};
use tokenizers::{Encoding, Tokenizer};
use tracing::debug;

use super::embedding_model::EmbeddingModel;
use super::pooling::{l2_normalize, pool, PoolingConfig};
use crate::core::EmbedError;
use crate::pipelines::TextEmbedder;

/// A loaded model plus the tokenizer and pooling recipe used to turn text
/// into sentence embeddings.
///
/// Built with [`EmbeddingPipelineBuilder`](super::EmbeddingPipelineBuilder).
/// The pipeline owns the model weights; dropping it releases them.
pub struct EmbeddingPipeline<M: EmbeddingModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) pooling: PoolingConfig,
    pub(crate) pad_id: u32,
}

impl<M: EmbeddingModel> EmbeddingPipeline<M> {
    pub(crate) fn new(model: M, tokenizer: Tokenizer, pooling: PoolingConfig) -> Self {
        let pad_id = tokenizer
            .token_to_id("[PAD]")
            .unwrap_or_else(|| model.pad_token_id());
        Self {
            model,
            tokenizer,
            pooling,
            pad_id,
        }
    }

    /// Embed a single text.
    pub fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text])?;
        out.pop()
            .ok_or_else(|| anyhow::Error::from(EmbedError::EmptyBatchOutput))
    }

    /// Embed several texts in one forward pass, padded to the longest input.
    ///
    /// Returns one vector per input, in input order.
    pub fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(*text, true)
                    .map_err(|e| anyhow::anyhow!("Tokenization error: {e}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if encodings.iter().any(|encoding| encoding.get_ids().is_empty()) {
            return Err(EmbedError::EmptyTokenization.into());
        }

        let (input_ids, attention_mask) =
            batch_tensors(&encodings, self.pad_id, self.model.device())?;
        debug!(
            batch = texts.len(),
            shape = ?input_ids.dims(),
            pooling = %self.pooling.pooling,
            normalize = self.pooling.normalize,
            "running encoder"
        );

        let hidden_states = self.model.forward(&input_ids, &attention_mask)?;
        let pooled = pool(&hidden_states, &attention_mask, self.pooling.pooling)?;
        let mut embeddings = pooled
            .to_dtype(candle_core::DType::F32)?
            .to_vec2::<f32>()?;

        let expected = self.model.hidden_size();
        for embedding in embeddings.iter_mut() {
            if embedding.len() != expected {
                return Err(EmbedError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                }
                .into());
            }
            if self.pooling.normalize {
                l2_normalize(embedding);
            }
        }

        Ok(embeddings)
    }

    /// Length of every vector this pipeline returns.
    pub fn dimension(&self) -> usize {
        self.model.hidden_size()
    }

    pub fn pooling_config(&self) -> PoolingConfig {
        self.pooling
    }

    pub fn device(&self) -> &Device {
        self.model.device()
    }
}

impl<M: EmbeddingModel> TextEmbedder for EmbeddingPipeline<M> {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        EmbeddingPipeline::embed(self, text)
    }
}

/// Right-pad the encodings to a common length and stack them into
/// `(batch, seq)` id and mask tensors.
fn batch_tensors(
    encodings: &[Encoding],
    pad_id: u32,
    device: &Device,
) -> anyhow::Result<(Tensor, Tensor)> {
    let seq_len = encodings
        .iter()
        .map(|encoding| encoding.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut mask = Vec::with_capacity(encodings.len() * seq_len);
    for encoding in encodings {
        let len = encoding.get_ids().len();
        ids.extend_from_slice(encoding.get_ids());
        ids.extend(std::iter::repeat(pad_id).take(seq_len - len));
        mask.extend_from_slice(encoding.get_attention_mask());
        mask.extend(std::iter::repeat(0u32).take(seq_len - len));
    }

    let input_ids = Tensor::from_vec(ids, (encodings.len(), seq_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (encodings.len(), seq_len), device)?;
    Ok((input_ids, attention_mask))
}
