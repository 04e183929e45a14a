use text_embed::pipelines::embedding_pipeline::*;
use text_embed::pipelines::utils::DeviceSelectable;

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn basic_embedding() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
        .cpu()
        .build()?;
    let emb = pipeline.embed("hello world")?;
    assert_eq!(emb.len(), 384);
    assert_eq!(pipeline.dimension(), 384);

    let norm = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
    Ok(())
}

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn embedding_is_deterministic() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
        .cpu()
        .build()?;
    assert_eq!(pipeline.embed("hello world")?, pipeline.embed("hello world")?);
    Ok(())
}

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn empty_text_has_fixed_dimension() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
        .cpu()
        .build()?;
    assert_eq!(pipeline.embed("")?.len(), 384);
    Ok(())
}

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn raw_and_sentence_differ_only_by_scale() -> anyhow::Result<()> {
    let sentence = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
        .cpu()
        .build()?;
    let raw = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
        .raw()
        .cpu()
        .build()?;

    let normalized = sentence.embed("hello world")?;
    let mut unnormalized = raw.embed("hello world")?;
    let norm = unnormalized.iter().map(|x| x * x).sum::<f32>().sqrt();

    unnormalized.iter_mut().for_each(|x| *x /= norm);
    for (a, b) in normalized.iter().zip(&unnormalized) {
        assert!((a - b).abs() < 1e-5);
    }
    Ok(())
}

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn similar_sentences_are_closer() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2)
        .cpu()
        .build()?;
    let cosine = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();

    let hello = pipeline.embed("hello world")?;
    let greeting = pipeline.embed("hi there, world")?;
    let trucks = pipeline.embed("I like firetrucks")?;
    assert!(cosine(&hello, &greeting) > cosine(&hello, &trucks));
    Ok(())
}
