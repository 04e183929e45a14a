//! Command-line surface of the `embed` binary.
//!
//! `embed <TEXT>` loads a sentence encoder, embeds the text and prints the
//! vector as a single-line JSON array on stdout. Everything else (usage,
//! errors, logs) goes to stderr.

use std::io::Write;

use clap::{CommandFactory, Parser, ValueEnum};

use crate::core::EmbedError;
use crate::models::implementations::sentence_bert::{SentenceBertModel, SentenceBertSize};
use crate::pipelines::embedding_pipeline::{EmbeddingPipelineBuilder, PoolingStrategy};
use crate::pipelines::utils::DeviceSelectable;
use crate::pipelines::TextEmbedder;

#[derive(Parser, Debug)]
#[command(name = "embed", version)]
#[command(about = "Print the sentence embedding of a text as a JSON array", long_about = None)]
pub struct Args {
    /// Text to embed, passed through unmodified (may start with `-`)
    #[arg(allow_hyphen_values = true)]
    pub text: Option<String>,

    /// Pretrained checkpoint to load from the Hugging Face Hub
    #[arg(long, value_enum, default_value_t = ModelArg::AllMinilmL6V2)]
    pub model: ModelArg,

    /// Plain mean of the encoder's token states, without normalization
    #[arg(long)]
    pub raw: bool,

    /// Override the checkpoint's pooling
    #[arg(long, value_enum)]
    pub pooling: Option<PoolingArg>,

    /// Do not L2-normalize the embedding
    #[arg(long)]
    pub no_normalize: bool,

    /// Run on CPU even when CUDA is available
    #[arg(long, conflicts_with = "cuda")]
    pub cpu: bool,

    /// Run on the CUDA device with this index
    #[arg(long, value_name = "INDEX")]
    pub cuda: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    #[value(name = "all-minilm-l6-v2")]
    AllMinilmL6V2,
    #[value(name = "all-minilm-l12-v2")]
    AllMinilmL12V2,
    #[value(name = "paraphrase-minilm-l3-v2")]
    ParaphraseMinilmL3V2,
    #[value(name = "bge-small-en-v1.5")]
    BgeSmallEnV15,
}

impl From<ModelArg> for SentenceBertSize {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::AllMinilmL6V2 => SentenceBertSize::AllMiniLmL6V2,
            ModelArg::AllMinilmL12V2 => SentenceBertSize::AllMiniLmL12V2,
            ModelArg::ParaphraseMinilmL3V2 => SentenceBertSize::ParaphraseMiniLmL3V2,
            ModelArg::BgeSmallEnV15 => SentenceBertSize::BgeSmallEnV15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PoolingArg {
    Mean,
    Cls,
    Max,
}

impl From<PoolingArg> for PoolingStrategy {
    fn from(arg: PoolingArg) -> Self {
        match arg {
            PoolingArg::Mean => PoolingStrategy::Mean,
            PoolingArg::Cls => PoolingStrategy::Cls,
            PoolingArg::Max => PoolingStrategy::Max,
        }
    }
}

impl Args {
    /// Translate the flags into a pipeline builder. Nothing is loaded yet.
    pub fn pipeline_builder(&self) -> EmbeddingPipelineBuilder<SentenceBertModel> {
        let mut builder = EmbeddingPipelineBuilder::sentence_bert(self.model.into());
        if self.raw {
            builder = builder.raw();
        }
        if let Some(pooling) = self.pooling {
            builder = builder.pooling(pooling.into());
        }
        if self.no_normalize {
            builder = builder.normalize(false);
        }
        if self.cpu {
            builder = builder.cpu();
        }
        if let Some(index) = self.cuda {
            builder = builder.cuda_device(index);
        }
        builder
    }
}

/// One-line usage string, e.g. `Usage: embed [OPTIONS] [TEXT]`.
pub fn usage() -> String {
    Args::command().render_usage().to_string()
}

/// Embed `text` and write it to `out` as a JSON array followed by a newline.
pub fn run<E, W>(embedder: &E, text: &str, out: &mut W) -> anyhow::Result<()>
where
    E: TextEmbedder + ?Sized,
    W: Write,
{
    let embedding = embedder.embed(text)?;
    serde_json::to_writer(&mut *out, &embedding)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Validate the arguments, load the model and print the embedding to stdout.
///
/// The text is checked before the model is loaded, so a usage error never
/// waits on a download.
pub fn execute(args: Args) -> anyhow::Result<()> {
    let text = args.text.as_deref().ok_or(EmbedError::MissingText)?;
    let pipeline = args.pipeline_builder().build()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&pipeline, text, &mut out)
}
