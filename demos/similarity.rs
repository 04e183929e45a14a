use text_embed::pipelines::embedding_pipeline::*;

fn main() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::sentence_bert(SentenceBertSize::AllMiniLmL6V2).build()?;

    let emb_hello_world = pipeline.embed("hello world")?;

    let candidates = [
        "Typical first program programmers learn to write",
        "I like firetrucks",
    ];
    let embeddings = pipeline.embed_batch(&candidates)?;

    // Embeddings are unit length, so the dot product is the cosine similarity.
    let closest_to_hello_world = candidates
        .iter()
        .zip(&embeddings)
        .map(|(text, emb)| {
            let cosine_sim: f32 = emb_hello_world
                .iter()
                .zip(emb.iter())
                .map(|(a, b)| a * b)
                .sum();
            (text, cosine_sim)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1));

    println!("Closest to hello world: {:?}", closest_to_hello_world);

    Ok(())
}
