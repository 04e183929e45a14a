use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::embedding_model::EmbeddingModel;
use super::embedding_pipeline::EmbeddingPipeline;
use super::pooling::{EncodeStrategy, PoolingConfig, PoolingStrategy};
use crate::models::implementations::sentence_bert::{SentenceBertModel, SentenceBertSize};
use crate::pipelines::utils::{DeviceRequest, DeviceSelectable};

pub struct EmbeddingPipelineBuilder<M: EmbeddingModel> {
    options: M::Options,
    device_request: DeviceRequest,
    strategy: EncodeStrategy,
    pooling: Option<PoolingStrategy>,
    normalize: Option<bool>,
}

impl<M: EmbeddingModel> EmbeddingPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
            strategy: EncodeStrategy::default(),
            pooling: None,
            normalize: None,
        }
    }

    /// Select how encoder output becomes the embedding.
    pub fn strategy(mut self, strategy: EncodeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Shorthand for [`EncodeStrategy::Raw`].
    pub fn raw(self) -> Self {
        self.strategy(EncodeStrategy::Raw)
    }

    /// Override the pooling chosen by the strategy.
    pub fn pooling(mut self, pooling: PoolingStrategy) -> Self {
        self.pooling = Some(pooling);
        self
    }

    /// Override whether embeddings are L2-normalized.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = Some(normalize);
        self
    }

    pub fn options(&self) -> &M::Options {
        &self.options
    }

    pub fn device_request(&self) -> &DeviceRequest {
        &self.device_request
    }

    /// Pooling this builder will use for a checkpoint with the given native
    /// configuration.
    pub fn resolve_pooling(&self, native: PoolingConfig) -> PoolingConfig {
        self.strategy.resolve(native, self.pooling, self.normalize)
    }

    /// Load the model and tokenizer and assemble the pipeline.
    pub fn build(self) -> anyhow::Result<EmbeddingPipeline<M>> {
        let device = self.device_request.clone().resolve()?;
        info!(model = %self.options, device = ?device.location(), "loading embedding model");

        let model = M::new(self.options.clone(), device)?;
        let mut tokenizer = M::get_tokenizer(self.options.clone())?;
        let max_len = match self.strategy {
            EncodeStrategy::Sentence => model.max_seq_len(),
            // Raw encoding is bounded only by the position table.
            EncodeStrategy::Raw => model.max_position_embeddings(),
        };
        configure_tokenizer(&mut tokenizer, max_len)?;

        let native = PoolingConfig {
            pooling: model.pooling(),
            normalize: model.normalizes(),
        };
        let pooling = self.resolve_pooling(native);
        debug!(?native, resolved = ?pooling, strategy = ?self.strategy, "pooling configured");

        Ok(EmbeddingPipeline::new(model, tokenizer, pooling))
    }
}

impl<M: EmbeddingModel> DeviceSelectable for EmbeddingPipelineBuilder<M> {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}

impl EmbeddingPipelineBuilder<SentenceBertModel> {
    pub fn sentence_bert(size: SentenceBertSize) -> Self {
        Self::new(size)
    }
}

/// Truncate to `max_len` tokens and disable tokenizer-side padding; the
/// pipeline pads batches itself.
fn configure_tokenizer(tokenizer: &mut Tokenizer, max_len: usize) -> anyhow::Result<()> {
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(anyhow::Error::msg)?;
    Ok(())
}
