use text_embed::pipelines::embedding_pipeline::*;
use text_embed::pipelines::utils::DeviceSelectable;

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn batch_embedding() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
        .cpu()
        .build()?;
    let inputs = ["hello", "a considerably longer sentence about the weather"];
    let embs = pipeline.embed_batch(&inputs)?;
    assert_eq!(embs.len(), inputs.len());
    for (text, emb) in inputs.iter().zip(&embs) {
        let single = pipeline.embed(text)?;
        for (a, b) in emb.iter().zip(&single) {
            assert!((a - b).abs() < 1e-4);
        }
    }
    Ok(())
}

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn bge_uses_cls_pooling() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::BgeSmallEnV15)
        .cpu()
        .build()?;
    assert_eq!(pipeline.pooling_config().pooling, PoolingStrategy::Cls);
    assert_eq!(pipeline.embed("hello world")?.len(), 384);
    Ok(())
}
