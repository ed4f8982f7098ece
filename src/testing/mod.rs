//! Testing infrastructure for autochain.
//!
//! This module provides an in-memory store, fixtures, and assertions for
//! testing the continuation engine without touching real projects.
//!
//! # Architecture
//!
//! - **Mocks**: [`MemoryWorkflowStore`], an in-memory [`crate::store::WorkflowStore`]
//! - **Fixtures**: temporary planning projects on disk (test-only)
//! - **Assertions**: checks over engine decisions
//!
//! # Example
//!
//! ```rust,ignore
//! use autochain::testing::{assert_continues_with, MemoryWorkflowStore};
//!
//! let store = MemoryWorkflowStore::new()
//!     .with_auto_mode(true)
//!     .with_signal("execute-phase 3");
//! ```

pub mod assertions;
#[cfg(test)]
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use assertions::*;
#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
