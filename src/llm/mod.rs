pub mod client;
pub mod extractor;

pub use client::{CompletionBackend, LLMClient};
