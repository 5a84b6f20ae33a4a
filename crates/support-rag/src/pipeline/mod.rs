//! The three-stage support pipeline
//!
//! - `reformulator`: vague customer query to a retrieval-friendly query
//! - `synthesizer`: retrieved documents to a cited technical draft
//! - `refiner`: technical draft to a customer-facing answer
//! - `orchestrator`: runs the stages with retries, fallback and cancellation

pub mod orchestrator;
pub mod refiner;
pub mod reformulator;
pub mod retry;
pub mod state;
pub mod synthesizer;

pub use orchestrator::PipelineOrchestrator;
pub use refiner::{ResponseRefiner, NO_DOCUMENTATION_ANSWER};
pub use reformulator::QueryReformulator;
pub use retry::RetryPolicy;
pub use state::{FailureKind, PipelineFailure, PipelineOutcome, PipelineRun, PipelineStage};
pub use synthesizer::DraftSynthesizer;
