//! BERT encoder used by the MiniLM and BGE sentence-embedding checkpoints.
//!
//! This is the classic post-LayerNorm encoder:
//! - Word, position and token-type embeddings followed by LayerNorm
//! - N layers of self-attention and a GELU feed-forward block, each wrapped
//!   in a residual connection and LayerNorm
//! - No pooler or task head: the output is the last hidden state, and
//!   sentence pooling happens in the embedding pipeline
//!
//! Weight names follow the Hugging Face `BertModel` layout. Checkpoints
//! exported from `BertForMaskedLM` and friends carry a `bert.` prefix, which
//! is detected at load time.
//!
//! # Quick Start
//! ```rust,no_run
//! use candle_core::{Device, Tensor};
//! use text_embed::loaders::{ConfigLoader, SafetensorsModelLoader};
//! use text_embed::models::implementations::bert::{BertModel, Config};
//!
//! let repo = "sentence-transformers/all-MiniLM-L6-v2";
//! let config: Config = ConfigLoader::new(repo, "config.json").load()?;
//! let vb = SafetensorsModelLoader::new(repo).load(candle_core::DType::F32, &Device::Cpu)?;
//! let model = BertModel::load(vb, &config)?;
//!
//! let input_ids = Tensor::new(&[[101u32, 7592, 2088, 102]], &Device::Cpu)?;
//! let attention_mask = Tensor::ones((1, 4), candle_core::DType::U32, &Device::Cpu)?;
//! let hidden = model.forward(&input_ids, &attention_mask)?; // (1, 4, 384)
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::sync::Arc;

use candle_core::{DType, Module, Result, Tensor, D};
use candle_nn::{embedding, layer_norm, linear, ops::softmax_last_dim, Embedding, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;

const MIN_VALUE_F64: f64 = f32::MIN as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HiddenAct {
    #[default]
    Gelu,
    #[serde(alias = "gelu_new", alias = "gelu_pytorch_tanh")]
    GeluApproximate,
    Relu,
}

impl HiddenAct {
    fn apply(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            HiddenAct::Gelu => xs.gelu_erf(),
            HiddenAct::GeluApproximate => xs.gelu(),
            HiddenAct::Relu => xs.relu(),
        }
    }
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

/// Subset of the Hugging Face `BertConfig` needed for inference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default)]
    pub hidden_act: HiddenAct,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default)]
    pub pad_token_id: u32,
}

#[derive(Debug, Clone)]
struct BertEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl BertEmbeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let word_embeddings = embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("word_embeddings"),
        )?;
        let position_embeddings = embedding(
            config.max_position_embeddings,
            config.hidden_size,
            vb.pp("position_embeddings"),
        )?;
        let token_type_embeddings = embedding(
            config.type_vocab_size,
            config.hidden_size,
            vb.pp("token_type_embeddings"),
        )?;
        let layer_norm = layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?;

        Ok(Self {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            layer_norm,
        })
    }

    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor) -> Result<Tensor> {
        let seq_len = input_ids.dim(1)?;
        let position_ids = Tensor::arange(0u32, seq_len as u32, input_ids.device())?;

        let words = input_ids.apply(&self.word_embeddings)?;
        let token_types = token_type_ids.apply(&self.token_type_embeddings)?;
        // (seq_len, hidden) broadcast over the batch
        let positions = position_ids.apply(&self.position_embeddings)?;

        (words + token_types)?
            .broadcast_add(&positions)?
            .apply(&self.layer_norm)
    }
}

/// Multi-head self-attention.
#[derive(Debug, Clone)]
struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl SelfAttention {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let attention_head_size = config.hidden_size / config.num_attention_heads;
        let all_head_size = config.num_attention_heads * attention_head_size;

        Ok(Self {
            query: linear(config.hidden_size, all_head_size, vb.pp("query"))?,
            key: linear(config.hidden_size, all_head_size, vb.pp("key"))?,
            value: linear(config.hidden_size, all_head_size, vb.pp("value"))?,
            num_attention_heads: config.num_attention_heads,
            attention_head_size,
        })
    }

    /// `(batch, seq, hidden)` -> `(batch, heads, seq, head_size)`
    fn split_heads(&self, xs: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = xs.dims3()?;
        xs.reshape((
            batch,
            seq_len,
            self.num_attention_heads,
            self.attention_head_size,
        ))?
        .transpose(1, 2)?
        .contiguous()
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let q = self.split_heads(&hidden_states.apply(&self.query)?)?;
        let k = self.split_heads(&hidden_states.apply(&self.key)?)?;
        let v = self.split_heads(&hidden_states.apply(&self.value)?)?;

        let scale = (self.attention_head_size as f64).powf(-0.5);
        let attention_scores = (q.matmul(&k.t()?.contiguous()?)? * scale)?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = softmax_last_dim(&attention_scores)?;

        attention_probs
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .flatten_from(D::Minus2)
    }
}

/// Dense projection + dropout-free residual LayerNorm, shared by the
/// attention output and the feed-forward output.
#[derive(Debug, Clone)]
struct ResidualOutput {
    dense: Linear,
    layer_norm: LayerNorm,
}

impl ResidualOutput {
    fn load(vb: VarBuilder, in_dim: usize, config: &Config) -> Result<Self> {
        Ok(Self {
            dense: linear(in_dim, config.hidden_size, vb.pp("dense"))?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, residual: &Tensor) -> Result<Tensor> {
        (hidden_states.apply(&self.dense)? + residual)?.apply(&self.layer_norm)
    }
}

#[derive(Debug, Clone)]
struct Intermediate {
    dense: Linear,
    act: HiddenAct,
}

impl Intermediate {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            dense: linear(config.hidden_size, config.intermediate_size, vb.pp("dense"))?,
            act: config.hidden_act,
        })
    }
}

impl Module for Intermediate {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.act.apply(&xs.apply(&self.dense)?)
    }
}

/// Single transformer layer.
#[derive(Debug, Clone)]
struct BertLayer {
    attention: SelfAttention,
    attention_output: ResidualOutput,
    intermediate: Intermediate,
    output: ResidualOutput,
}

impl BertLayer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            attention: SelfAttention::load(vb.pp("attention.self"), config)?,
            attention_output: ResidualOutput::load(
                vb.pp("attention.output"),
                config.hidden_size,
                config,
            )?,
            intermediate: Intermediate::load(vb.pp("intermediate"), config)?,
            output: ResidualOutput::load(vb.pp("output"), config.intermediate_size, config)?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attention = self.attention.forward(hidden_states, attention_mask)?;
        let hidden_states = self.attention_output.forward(&attention, hidden_states)?;

        let intermediate = hidden_states.apply(&self.intermediate)?;
        self.output.forward(&intermediate, &hidden_states)
    }
}

/// Shared model weights.
#[derive(Debug, Clone)]
pub struct ModelWeights {
    embeddings: BertEmbeddings,
    layers: Vec<BertLayer>,
    hidden_size: usize,
    max_position_embeddings: usize,
    pad_token_id: u32,
    dtype: DType,
}

impl ModelWeights {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        // Checkpoints saved from a task model nest the encoder under `bert.`.
        let vb = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            vb.pp("bert")
        } else {
            vb
        };

        let embeddings = BertEmbeddings::load(vb.pp("embeddings"), config)?;

        let vb_layers = vb.pp("encoder.layer");
        let layers = (0..config.num_hidden_layers)
            .map(|index| BertLayer::load(vb_layers.pp(index), config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            embeddings,
            layers,
            hidden_size: config.hidden_size,
            max_position_embeddings: config.max_position_embeddings,
            pad_token_id: config.pad_token_id,
            dtype: vb.dtype(),
        })
    }

    /// `(batch, seq)` 1/0 mask -> `(batch, 1, 1, seq)` additive mask.
    fn extended_attention_mask(&self, attention_mask: &Tensor) -> Result<Tensor> {
        let (batch_size, seq_len) = attention_mask.dims2()?;
        let mask = attention_mask
            .to_dtype(self.dtype)?
            .reshape((batch_size, 1, 1, seq_len))?;
        ((1.0 - mask)? * MIN_VALUE_F64)?.to_dtype(self.dtype)
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = self.extended_attention_mask(attention_mask)?;

        let mut hidden_states = self.embeddings.forward(input_ids, &token_type_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &attention_mask)?;
        }
        Ok(hidden_states)
    }
}

/// High-level BERT encoder interface.
#[derive(Debug, Clone)]
pub struct BertModel {
    weights: Arc<ModelWeights>,
}

impl BertModel {
    /// Load a BERT encoder.
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let weights = Arc::new(ModelWeights::load(vb, config)?);
        Ok(Self { weights })
    }

    /// Forward pass returning the last hidden state.
    ///
    /// # Arguments
    /// * `input_ids` - Token IDs with shape `(batch_size, sequence_length)`
    /// * `attention_mask` - Attention mask with shape `(batch_size, sequence_length)` (1 for real tokens, 0 for padding)
    ///
    /// # Returns
    /// Hidden states with shape `(batch_size, sequence_length, hidden_size)`
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        self.weights.forward(input_ids, attention_mask)
    }

    pub fn hidden_size(&self) -> usize {
        self.weights.hidden_size
    }

    /// Longest sequence the position table can embed.
    pub fn max_position_embeddings(&self) -> usize {
        self.weights.max_position_embeddings
    }

    pub fn pad_token_id(&self) -> u32 {
        self.weights.pad_token_id
    }
}
