// Prompt-fragment retrieval. The store is read-only from this service's point
// of view; population happens in a separate offline tool.

pub mod handlers;
pub mod store;
