//! autochain - unattended phase chaining for coding-assistant sessions
//!
//! A stop hook that decides, once per assistant turn, whether a
//! "plan → execute → plan" workflow should move on by itself and which
//! command to inject next.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`engine`] - The continuation decision pipeline
//! - [`hooks`] - Host protocol: stdin context, stdout decision, input timeout
//! - [`store`] - Access to persisted workflow state (config, signal, phases)
//! - [`signal`] - Parsing of the one-shot "next command" signal
//! - [`transcript`] - Banner scanning for the transcript-driven mode
//! - [`phases`] - Phase directory lookup and artifact counting
//! - [`config`] - Project layout and `config.json`
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (in-memory store, fixtures, assertions)
//!
//! # Example
//!
//! ```rust,ignore
//! use autochain::{ContinuationEngine, EngineOptions, FsWorkflowStore, InvocationContext};
//!
//! let store = FsWorkflowStore::new(".");
//! let mut engine = ContinuationEngine::new(store, EngineOptions::default());
//! let decision = engine.decide(&InvocationContext::default());
//! println!("{decision:?}");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod phases;
pub mod signal;
pub mod store;
pub mod testing;
pub mod transcript;

// Re-export commonly used types
pub use error::{AutochainError, IntoAutochainError, Result};

pub use config::{PlanningPaths, ProjectConfig};
pub use engine::{ContinuationEngine, Decision, EngineMode, EngineOptions, StayReason};
pub use hooks::{
    read_hook_input, run_stop_hook, write_hook_output, HookOutput, InvocationContext,
};
pub use phases::PhaseArtifacts;
pub use signal::SignalCommand;
pub use store::{FsWorkflowStore, WorkflowStore};
pub use transcript::{TranscriptSignal, TranscriptWindow};

// Re-export testing types for convenience
pub use testing::MemoryWorkflowStore;

// TestFixture is only available in test builds
#[cfg(test)]
pub use testing::TestFixture;
