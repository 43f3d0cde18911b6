//! Model clients: one generation request to one named model.
//!
//! ```text
//! FallbackOrchestrator
//!     |
//!     |   invoke("gemini-2.5-flash", prompt)
//!     v
//! dyn ModelClient ----> Ok(text)
//!                  \--> Err(ModelFailure::Auth { .. })       stop the chain
//!                  \--> Err(ModelFailure::Transient { .. })  try the next model
//! ```

pub mod gemini;
pub mod trait_def;

pub use gemini::{CatalogError, GeminiClient, ModelInfo};
pub use trait_def::{ModelClient, ModelFailure, TransientReason};
