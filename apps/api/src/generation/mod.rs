// Resume generation and delivery.
// LLM access goes through llm_client::Completion; storage through storage::{BlobStore, MetadataStore}.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod retrieval;
pub mod summary;
