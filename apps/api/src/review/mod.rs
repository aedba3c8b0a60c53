pub mod analyzer;
pub mod export;
pub mod extractor;
pub mod feedback;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod session;
pub mod validation;
