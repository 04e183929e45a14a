use thiserror::Error;

/// Failures detected by this crate itself.
///
/// Errors raised by Candle, the tokenizer or the Hugging Face Hub are not
/// wrapped here; they travel through `anyhow` with the message of the
/// library that produced them.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// No text was supplied on the command line.
    #[error("missing text argument")]
    MissingText,

    /// The tokenizer returned no ids for the input.
    #[error("tokenizer produced an empty token sequence")]
    EmptyTokenization,

    /// The model returned fewer embeddings than inputs.
    #[error("model returned no embedding for the input")]
    EmptyBatchOutput,

    /// Neither `model.safetensors` nor `pytorch_model.bin` could be resolved.
    #[error("model weights not found in repo {repo}: expected `model.safetensors` or `pytorch_model.bin`")]
    WeightsNotFound { repo: String },

    /// The pooled vector does not match the model's hidden size.
    #[error("embedding has {actual} dimensions, model declares {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
