// Prompt generation pipeline.
// Implements: typed options, fragment context assembly, orchestration, HTTP handlers.
// All completion-service calls go through llm_client; nothing here speaks HTTP to it.

pub mod context_builder;
pub mod engine;
pub mod handlers;
pub mod options;
