//! Generation pipeline for curriculum maps, term plans and lesson sessions.
//!
//! ```text
//! GenerationRequest
//!     |
//!     v
//! prompt::build_prompt ----> FallbackOrchestrator ----> ModelClient (xN, sequential)
//!                                   |
//!                                   v
//!                        response::sanitize
//!                                   |
//!                                   v
//!                        response::parse_and_validate
//!                                   |
//!                                   v
//!                        response::reconcile ----> GeneratedContent
//! ```
//!
//! [`pipeline::GenerationPipeline`] wires the stages together. Persistence
//! and presentation live outside this crate.

pub mod client;
pub mod config;
pub mod content;
pub mod fallback;
pub mod pipeline;
pub mod prompt;
pub mod request;
pub mod response;

pub use client::{GeminiClient, ModelClient, ModelFailure, TransientReason};
pub use config::{ApiKey, ConfigError, GenerationConfig, ModelCandidates};
pub use content::GeneratedContent;
pub use fallback::{FallbackError, FallbackOrchestrator};
pub use pipeline::{FailureKind, GenerationPipeline, PipelineError};
pub use prompt::build_prompt;
pub use request::{
    CurriculumParams, DocumentKind, GenerationRequest, LessonParams, RefinementRequest,
    RequestError, TermPlanParams, UseCase,
};
pub use response::{ParseError, ValidationPolicy};
