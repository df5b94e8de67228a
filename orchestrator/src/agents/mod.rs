pub mod assistant;
pub mod faq;
pub mod questions;
pub mod retriever;
pub mod rewriter;
pub mod scorer;
