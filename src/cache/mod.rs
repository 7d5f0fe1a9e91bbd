//! Caching pipeline
//!
//! Cache-key derivation, the concurrent stream-to-disk copy, size-based
//! eviction, and the orchestrator that ties them together.

pub mod evict;
pub mod key;
pub mod orchestrator;
pub mod pipeline;
pub mod warm;
