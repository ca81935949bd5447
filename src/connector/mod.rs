//! # Connector Layer
//!
//! External integrations implementing the application ports:
//! - Storage (DuckDB or in-memory vectors and file registry)
//! - Embeddings and chat completions (OpenAI-compatible, mock for offline use)
//! - Text extraction from PDF, CSV and XLSX
//!
//! Plus the entry points: the CLI router and the HTTP API.

pub mod adapter;
pub mod api;
pub mod http;

pub use adapter::*;
pub use api::{Container, ContainerConfig, Router, StorageBackend};
