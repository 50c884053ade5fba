//! HTTP handlers for contentai-api.

pub mod embeddings;
pub mod health;
pub mod tasks;
