pub mod bert;
pub mod sentence_bert;

pub use bert::BertModel;
pub use sentence_bert::{SentenceBertModel, SentenceBertSize};
