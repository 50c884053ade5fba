//! # contentai-core
//!
//! Core types, traits, and abstractions for contentai.
//!
//! This crate provides the domain models, the error type, the pure chunker
//! and the trait definitions that the storage, inference and task crates
//! implement or depend on.

pub mod chunking;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use chunking::{Chunk, ChunkerConfig, SlidingWindowChunker};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
