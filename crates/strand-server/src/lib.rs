//! Strand development server.
//!
//! Serves the single-page shell and wires the client-side module loader to
//! programs discovered on disk. The interesting parts are workspace-aware
//! static resolution (ordered fallback across multiple roots), filesystem
//! discovery of programs and watchers, and per-request bootstrap synthesis.

pub mod bootstrap;
pub mod discover;
pub mod error;
pub mod http;
pub mod resolve;

pub use discover::DiscoveredProgram;
pub use error::ServeError;
pub use http::{router, serve, SharedConfig};
