//! Model and tokenizer loading utilities for Hugging Face Hub integration.
//!
//! This module resolves the files a sentence-embedding checkpoint needs
//! through the local Hugging Face Hub cache, downloading them on first use:
//! - Tokenizers (`tokenizer.json`)
//! - Model configuration (`config.json`)
//! - Model weights (`model.safetensors`, or `pytorch_model.bin` as a fallback)
//!
//! ## Main Types
//!
//! - [`HfLoader`] - Generic Hugging Face file loader with retry logic
//! - [`TokenizerLoader`] - Loads tokenizers from Hugging Face repositories
//! - [`ConfigLoader`] - Loads and deserializes JSON configuration files
//! - [`SafetensorsModelLoader`] - Loads model weights into a [`VarBuilder`]
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use text_embed::loaders::{SafetensorsModelLoader, TokenizerLoader};
//!
//! let tokenizer = TokenizerLoader::new("sentence-transformers/all-MiniLM-L6-v2", "tokenizer.json")
//!     .load()?;
//! let vb = SafetensorsModelLoader::new("sentence-transformers/all-MiniLM-L6-v2")
//!     .load(candle_core::DType::F32, &candle_core::Device::Cpu)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! All loaders retry when the Hub reports a cache lock acquisition failure,
//! which happens when two processes download the same file concurrently.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::ApiBuilder;
use serde::de::DeserializeOwned;
use tokenizers::Tokenizer;
use tracing::{debug, warn};

use crate::core::EmbedError;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    /// Resolve the file to a path in the local Hub cache.
    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = ApiBuilder::new().with_progress(false).build()?;
        let hf_repo = hf_api.model(self.repo.clone());

        let mut attempt = 0;
        loop {
            match hf_repo.get(self.filename.as_str()) {
                Ok(path) => {
                    debug!(repo = %self.repo, file = %self.filename, path = %path.display(), "resolved hub file");
                    return Ok(path);
                }
                Err(e) => {
                    attempt += 1;
                    let retryable = e.to_string().contains("Lock acquisition failed");
                    if !retryable || attempt >= MAX_RETRIES {
                        return Err(e.into());
                    }
                    // 100ms, then 200ms
                    let wait_time = Duration::from_millis(100 * (1 << (attempt - 1)));
                    warn!(
                        repo = %self.repo,
                        file = %self.filename,
                        attempt,
                        "hub cache lock busy, retrying in {:?}",
                        wait_time
                    );
                    std::thread::sleep(wait_time);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
}

impl TokenizerLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(repo, filename),
        }
    }

    pub fn load(&self) -> anyhow::Result<Tokenizer> {
        let tokenizer_file_path = self.tokenizer_file_loader.load()?;

        Tokenizer::from_file(&tokenizer_file_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load tokenizer from {:?}: {}",
                tokenizer_file_path,
                e
            )
        })
    }
}

/// Loads a JSON file from a repository and deserializes it into `T`.
#[derive(Debug, Clone)]
pub struct ConfigLoader<T> {
    pub config_file_loader: HfLoader,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> ConfigLoader<T> {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            config_file_loader: HfLoader::new(repo, filename),
            _marker: PhantomData,
        }
    }

    pub fn load(&self) -> anyhow::Result<T> {
        let config_file_path = self.config_file_loader.load()?;

        let config_content = std::fs::read_to_string(&config_file_path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {:?}: {}", config_file_path, e)
        })?;

        serde_json::from_str(&config_content)
            .map_err(|e| anyhow::anyhow!("Failed to parse model config {:?}: {}", config_file_path, e))
    }
}

/// Loads the weights of a checkpoint into a [`VarBuilder`].
///
/// `model.safetensors` is memory-mapped when present; older repositories
/// that only publish `pytorch_model.bin` are read through the pickle loader.
#[derive(Debug, Clone)]
pub struct SafetensorsModelLoader {
    pub repo: String,
}

impl SafetensorsModelLoader {
    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    /// Resolve the weights file, preferring safetensors.
    pub fn resolve(&self) -> anyhow::Result<PathBuf> {
        match HfLoader::new(&self.repo, "model.safetensors").load() {
            Ok(path) => Ok(path),
            Err(safetensors_err) => {
                debug!(repo = %self.repo, error = %safetensors_err, "no safetensors weights, trying pytorch_model.bin");
                HfLoader::new(&self.repo, "pytorch_model.bin")
                    .load()
                    .map_err(|_| {
                        safetensors_err.context(EmbedError::WeightsNotFound {
                            repo: self.repo.clone(),
                        })
                    })
            }
        }
    }

    pub fn load(&self, dtype: DType, device: &Device) -> anyhow::Result<VarBuilder<'static>> {
        let weights_filename = self.resolve()?;

        let vb = if weights_filename
            .extension()
            .is_some_and(|ext| ext == "safetensors")
        {
            // SAFETY: the cached file is not modified while the mapping is alive.
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_filename], dtype, device)? }
        } else if weights_filename
            .extension()
            .is_some_and(|ext| ext == "bin")
        {
            VarBuilder::from_pth(&weights_filename, dtype, device)?
        } else {
            anyhow::bail!("Unsupported weight file format: {:?}", weights_filename);
        };

        Ok(vb)
    }
}
