//! support-rag: Customer support answers grounded on a technical knowledge base
//!
//! A query passes through three generation stages around a retrieval step:
//! reformulation into a precise technical question, semantic retrieval with
//! thresholding, a cited technical draft, and a customer-facing refinement.
//! Embedding, generation and storage sit behind traits so backends can be
//! swapped and tests can run without network access.

pub mod config;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::SupportConfig;
pub use error::{Error, Result};
pub use pipeline::{PipelineOrchestrator, PipelineRun};
pub use types::{FinalResponse, Query, SupportQueryRequest};
