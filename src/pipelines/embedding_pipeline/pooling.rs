//! Reduction of per-token hidden states to a single sentence vector.

use candle_core::{DType, IndexOp, Result, Tensor, D};

/// How per-token hidden states are reduced to one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolingStrategy {
    /// Attention-mask-weighted average over the token axis.
    #[default]
    Mean,
    /// Hidden state of the first (`[CLS]`) token.
    Cls,
    /// Per-dimension maximum over unmasked tokens.
    Max,
}

impl std::fmt::Display for PoolingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PoolingStrategy::Mean => "mean",
            PoolingStrategy::Cls => "cls",
            PoolingStrategy::Max => "max",
        };
        write!(f, "{name}")
    }
}

/// Pooling and normalization applied after the encoder forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolingConfig {
    pub pooling: PoolingStrategy,
    pub normalize: bool,
}

/// Recipe used to turn encoder output into "the embedding".
///
/// `Sentence` reproduces what sentence-transformers' `encode` returns for the
/// checkpoint. `Raw` is the plain token-axis mean of the last hidden state
/// without normalization. The two are not interchangeable: for normalizing
/// checkpoints they differ by a scale factor, and for CLS checkpoints they
/// differ entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeStrategy {
    #[default]
    Sentence,
    Raw,
}

impl EncodeStrategy {
    /// Resolve the strategy against the checkpoint's native configuration.
    /// Explicit overrides take precedence.
    pub fn resolve(
        self,
        native: PoolingConfig,
        pooling: Option<PoolingStrategy>,
        normalize: Option<bool>,
    ) -> PoolingConfig {
        let base = match self {
            EncodeStrategy::Sentence => native,
            EncodeStrategy::Raw => PoolingConfig {
                pooling: PoolingStrategy::Mean,
                normalize: false,
            },
        };
        PoolingConfig {
            pooling: pooling.unwrap_or(base.pooling),
            normalize: normalize.unwrap_or(base.normalize),
        }
    }
}

/// Pool `(batch, seq, hidden)` states into `(batch, hidden)`.
///
/// `attention_mask` is `(batch, seq)` with 1 for real tokens and 0 for padding.
pub fn pool(
    hidden_states: &Tensor,
    attention_mask: &Tensor,
    strategy: PoolingStrategy,
) -> Result<Tensor> {
    let dtype = hidden_states.dtype();
    match strategy {
        PoolingStrategy::Cls => hidden_states.i((.., 0, ..))?.contiguous(),
        PoolingStrategy::Mean => {
            let mask = attention_mask.to_dtype(dtype)?.unsqueeze(D::Minus1)?;
            let summed = hidden_states.broadcast_mul(&mask)?.sum(1)?;
            // An all-zero mask yields a zero vector instead of NaN.
            let counts = (mask.sum(1)? + 1e-9)?;
            summed.broadcast_div(&counts)
        }
        PoolingStrategy::Max => {
            let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(D::Minus1)?;
            let penalty = ((mask - 1.0)? * 1e9)?.to_dtype(dtype)?;
            hidden_states.broadcast_add(&penalty)?.max(1)
        }
    }
}

/// Scale `embedding` to unit L2 norm. The norm is clamped at `1e-12`, so a
/// zero vector stays zero.
pub fn l2_normalize(embedding: &mut [f32]) {
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-12);
    for value in embedding.iter_mut() {
        *value /= norm;
    }
}
