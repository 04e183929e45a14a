/// The one capability the command line needs from a model: text in,
/// vector out.
///
/// [`EmbeddingPipeline`](super::embedding_pipeline::EmbeddingPipeline)
/// implements it; tests substitute fixed-vector fakes.
pub trait TextEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

impl<T: TextEmbedder + ?Sized> TextEmbedder for &T {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text)
    }
}
