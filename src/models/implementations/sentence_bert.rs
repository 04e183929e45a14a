use candle_core::{DType, Device, Tensor};
use tokenizers::Tokenizer;
use tracing::info;

use super::bert::{BertModel, Config};
use crate::loaders::{ConfigLoader, SafetensorsModelLoader, TokenizerLoader};
use crate::pipelines::embedding_pipeline::{EmbeddingModel, PoolingStrategy};

/// Sentence-embedding checkpoints built on the BERT encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentenceBertSize {
    /// `sentence-transformers/all-MiniLM-L6-v2`
    #[default]
    AllMiniLmL6V2,
    /// `sentence-transformers/all-MiniLM-L12-v2`
    AllMiniLmL12V2,
    /// `sentence-transformers/paraphrase-MiniLM-L3-v2`
    ParaphraseMiniLmL3V2,
    /// `BAAI/bge-small-en-v1.5`
    BgeSmallEnV15,
}

impl SentenceBertSize {
    pub const ALL: [SentenceBertSize; 4] = [
        SentenceBertSize::AllMiniLmL6V2,
        SentenceBertSize::AllMiniLmL12V2,
        SentenceBertSize::ParaphraseMiniLmL3V2,
        SentenceBertSize::BgeSmallEnV15,
    ];

    pub fn repo_id(&self) -> &'static str {
        match self {
            SentenceBertSize::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            SentenceBertSize::AllMiniLmL12V2 => "sentence-transformers/all-MiniLM-L12-v2",
            SentenceBertSize::ParaphraseMiniLmL3V2 => {
                "sentence-transformers/paraphrase-MiniLM-L3-v2"
            }
            SentenceBertSize::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
        }
    }

    /// Pooling from the checkpoint's sentence-transformers `Pooling` module.
    pub fn default_pooling(&self) -> PoolingStrategy {
        match self {
            SentenceBertSize::BgeSmallEnV15 => PoolingStrategy::Cls,
            _ => PoolingStrategy::Mean,
        }
    }

    /// Whether the checkpoint ships a `Normalize` module.
    pub fn normalizes(&self) -> bool {
        !matches!(self, SentenceBertSize::ParaphraseMiniLmL3V2)
    }

    /// `max_seq_length` from the checkpoint's `sentence_bert_config.json`.
    pub fn max_seq_len(&self) -> usize {
        match self {
            SentenceBertSize::AllMiniLmL6V2 | SentenceBertSize::AllMiniLmL12V2 => 256,
            SentenceBertSize::ParaphraseMiniLmL3V2 => 128,
            SentenceBertSize::BgeSmallEnV15 => 512,
        }
    }
}

impl std::fmt::Display for SentenceBertSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SentenceBertSize::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            SentenceBertSize::AllMiniLmL12V2 => "all-MiniLM-L12-v2",
            SentenceBertSize::ParaphraseMiniLmL3V2 => "paraphrase-MiniLM-L3-v2",
            SentenceBertSize::BgeSmallEnV15 => "bge-small-en-v1.5",
        };
        write!(f, "{name}")
    }
}

/// A pretrained sentence encoder loaded from the Hugging Face Hub.
#[derive(Clone)]
pub struct SentenceBertModel {
    model: BertModel,
    size: SentenceBertSize,
    max_seq_len: usize,
    device: Device,
}

impl SentenceBertModel {
    pub fn new(size: SentenceBertSize, device: Device) -> anyhow::Result<Self> {
        let repo_id = size.repo_id();

        let config: Config = ConfigLoader::new(repo_id, "config.json").load()?;
        let vb = SafetensorsModelLoader::new(repo_id).load(DType::F32, &device)?;
        let model = BertModel::load(vb, &config)?;

        let max_seq_len = size.max_seq_len().min(config.max_position_embeddings);
        info!(
            model = %size,
            layers = config.num_hidden_layers,
            hidden_size = config.hidden_size,
            max_seq_len,
            "model loaded"
        );

        Ok(Self {
            model,
            size,
            max_seq_len,
            device,
        })
    }

    pub fn get_tokenizer(size: SentenceBertSize) -> anyhow::Result<Tokenizer> {
        TokenizerLoader::new(size.repo_id(), "tokenizer.json").load()
    }
}

impl EmbeddingModel for SentenceBertModel {
    type Options = SentenceBertSize;

    fn new(options: Self::Options, device: Device) -> anyhow::Result<Self> {
        SentenceBertModel::new(options, device)
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> anyhow::Result<Tensor> {
        Ok(self.model.forward(input_ids, attention_mask)?)
    }

    fn get_tokenizer(options: Self::Options) -> anyhow::Result<Tokenizer> {
        SentenceBertModel::get_tokenizer(options)
    }

    fn pooling(&self) -> PoolingStrategy {
        self.size.default_pooling()
    }

    fn normalizes(&self) -> bool {
        self.size.normalizes()
    }

    fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    fn max_position_embeddings(&self) -> usize {
        self.model.max_position_embeddings()
    }

    fn pad_token_id(&self) -> u32 {
        self.model.pad_token_id()
    }

    fn hidden_size(&self) -> usize {
        self.model.hidden_size()
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
