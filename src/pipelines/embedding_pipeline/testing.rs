//! Randomly initialised BERT with a word-level tokenizer, for exercising the
//! pipeline without downloading a checkpoint.

use std::str::FromStr;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use tokenizers::Tokenizer;

use super::embedding_model::EmbeddingModel;
use super::pooling::PoolingStrategy;
use crate::models::implementations::bert::{BertModel, Config, HiddenAct};

const VOCAB: [&str; 16] = [
    "[PAD]", "[CLS]", "[SEP]", "[UNK]", "hello", "world", "the", "quick", "brown", "fox", "a",
    "b", "c", "d", "e", "rust",
];

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TinyBertOptions {
    pub pooling: PoolingStrategy,
    pub normalize: bool,
    pub pad_token_id: u32,
}

impl std::fmt::Display for TinyBertOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tiny-bert-{}", self.pooling)
    }
}

#[derive(Clone)]
pub(crate) struct TinyBertModel {
    pub model: BertModel,
    options: TinyBertOptions,
    device: Device,
}

fn tiny_config(pad_token_id: u32) -> Config {
    Config {
        vocab_size: VOCAB.len(),
        hidden_size: 8,
        num_hidden_layers: 2,
        num_attention_heads: 2,
        intermediate_size: 16,
        hidden_act: HiddenAct::Gelu,
        max_position_embeddings: 32,
        type_vocab_size: 2,
        layer_norm_eps: 1e-12,
        pad_token_id,
    }
}

impl EmbeddingModel for TinyBertModel {
    type Options = TinyBertOptions;

    fn new(options: Self::Options, device: Device) -> anyhow::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = BertModel::load(vb, &tiny_config(options.pad_token_id))?;
        Ok(Self {
            model,
            options,
            device,
        })
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> anyhow::Result<Tensor> {
        Ok(self.model.forward(input_ids, attention_mask)?)
    }

    fn get_tokenizer(_options: Self::Options) -> anyhow::Result<Tokenizer> {
        word_level_tokenizer(&VOCAB)
    }

    fn pooling(&self) -> PoolingStrategy {
        self.options.pooling
    }

    fn normalizes(&self) -> bool {
        self.options.normalize
    }

    fn max_seq_len(&self) -> usize {
        16
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

/// Word-level tokenizer with BERT-style `[CLS]`/`[SEP]` wrapping. `[CLS]`
/// and `[SEP]` must sit at ids 1 and 2.
pub(crate) fn word_level_tokenizer(vocab: &[&str]) -> anyhow::Result<Tokenizer> {
    let vocab = vocab
        .iter()
        .enumerate()
        .map(|(id, token)| format!("\"{token}\": {id}"))
        .collect::<Vec<_>>()
        .join(", ");
    let json = format!(
        r#"{{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {{ "type": "Whitespace" }},
            "post_processor": {{
                "type": "BertProcessing",
                "sep": ["[SEP]", 2],
                "cls": ["[CLS]", 1]
            }},
            "decoder": null,
            "model": {{
                "type": "WordLevel",
                "vocab": {{ {vocab} }},
                "unk_token": "[UNK]"
            }}
        }}"#
    );
    Tokenizer::from_str(&json).map_err(anyhow::Error::msg)
}
