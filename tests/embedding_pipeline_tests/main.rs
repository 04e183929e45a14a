// These tests download checkpoints from the Hugging Face Hub.
// Run them with `cargo test -- --ignored`.
mod basic_embedding;
mod batch_embedding;
