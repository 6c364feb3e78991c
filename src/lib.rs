pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::launch;
pub use error::ResearchError;
