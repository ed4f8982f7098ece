//! In-memory implementation of [`WorkflowStore`].
//!
//! Lets engine tests describe a project declaratively and then inspect
//! what the engine consumed.

use crate::config::ProjectConfig;
use crate::error::{AutochainError, Result};
use crate::phases::PhaseArtifacts;
use crate::store::WorkflowStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mock workflow store.
///
/// # Example
///
/// ```rust
/// use autochain::store::WorkflowStore;
/// use autochain::testing::MemoryWorkflowStore;
///
/// let mut store = MemoryWorkflowStore::new()
///     .with_auto_mode(true)
///     .with_signal("execute-phase 3");
///
/// assert_eq!(store.take_signal().unwrap().as_deref(), Some("execute-phase 3"));
/// assert!(!store.has_signal());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkflowStore {
    config: Option<ProjectConfig>,
    config_error: Option<String>,
    signal: Option<String>,
    signal_error: Option<String>,
    phases: HashMap<u32, PhaseArtifacts>,
    state: Option<String>,
    transcripts: HashMap<PathBuf, String>,
    signal_takes: u32,
}

impl MemoryWorkflowStore {
    /// Create an empty store: no config, no signal, no phases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a config with the given `auto_mode`.
    #[must_use]
    pub fn with_auto_mode(mut self, enabled: bool) -> Self {
        self.config = Some(ProjectConfig {
            auto_mode: enabled,
            ..Default::default()
        });
        self
    }

    /// Make `load_config` fail as if the file were malformed.
    #[must_use]
    pub fn with_config_error(mut self, message: &str) -> Self {
        self.config_error = Some(message.to_string());
        self
    }

    /// Set the pending signal.
    #[must_use]
    pub fn with_signal(mut self, content: &str) -> Self {
        self.signal = Some(content.to_string());
        self
    }

    /// Make `take_signal` fail after removing the signal.
    #[must_use]
    pub fn with_signal_error(mut self, message: &str) -> Self {
        self.signal_error = Some(message.to_string());
        self
    }

    /// Register a phase directory with the given artifact counts.
    #[must_use]
    pub fn with_phase(
        mut self,
        phase: u32,
        plans: usize,
        summaries: usize,
        gap_closure_plans: usize,
    ) -> Self {
        self.phases.insert(
            phase,
            PhaseArtifacts {
                dir: PathBuf::from(format!(".planning/phases/{phase:02}-phase")),
                plans,
                summaries,
                gap_closure_plans,
            },
        );
        self
    }

    /// Set STATE.md content.
    #[must_use]
    pub fn with_state(mut self, content: &str) -> Self {
        self.state = Some(content.to_string());
        self
    }

    /// Register a transcript at `path`.
    #[must_use]
    pub fn with_transcript(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.transcripts.insert(path.into(), content.to_string());
        self
    }

    /// Whether a signal is still pending.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.signal.is_some()
    }

    /// Number of `take_signal` calls that found a signal.
    #[must_use]
    pub fn signal_takes(&self) -> u32 {
        self.signal_takes
    }
}

impl WorkflowStore for MemoryWorkflowStore {
    fn load_config(&self) -> Result<Option<ProjectConfig>> {
        if let Some(message) = &self.config_error {
            return Err(AutochainError::config(message.clone()));
        }
        Ok(self.config.clone())
    }

    fn take_signal(&mut self) -> Result<Option<String>> {
        let Some(signal) = self.signal.take() else {
            return Ok(None);
        };
        self.signal_takes += 1;
        if let Some(message) = &self.signal_error {
            return Err(AutochainError::signal(".planning/.auto-next", message.clone()));
        }
        Ok(Some(signal))
    }

    fn peek_signal(&self) -> Result<Option<String>> {
        Ok(self.signal.clone())
    }

    fn phase_artifacts(&self, phase: u32) -> Result<Option<PhaseArtifacts>> {
        Ok(self.phases.get(&phase).cloned())
    }

    fn read_state(&self) -> Result<Option<String>> {
        Ok(self.state.clone())
    }

    fn read_transcript(&self, path: &Path) -> Result<String> {
        self.transcripts
            .get(path)
            .cloned()
            .ok_or_else(|| AutochainError::transcript(format!("{} not found", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_is_empty() {
        let mut store = MemoryWorkflowStore::default();
        assert!(store.load_config().unwrap().is_none());
        assert!(store.take_signal().unwrap().is_none());
        assert!(store.phase_artifacts(1).unwrap().is_none());
        assert!(store.read_state().unwrap().is_none());
        assert_eq!(store.signal_takes(), 0);
    }

    #[test]
    fn test_take_signal_once() {
        let mut store = MemoryWorkflowStore::new().with_signal("plan-phase 1");
        assert!(store.peek_signal().unwrap().is_some());
        assert_eq!(store.take_signal().unwrap().as_deref(), Some("plan-phase 1"));
        assert!(store.take_signal().unwrap().is_none());
        assert_eq!(store.signal_takes(), 1);
    }

    #[test]
    fn test_signal_error_still_consumes() {
        let mut store = MemoryWorkflowStore::new()
            .with_signal("plan-phase 1")
            .with_signal_error("disk full");
        assert!(store.take_signal().is_err());
        assert!(!store.has_signal());
    }

    #[test]
    fn test_config_error() {
        let store = MemoryWorkflowStore::new()
            .with_auto_mode(true)
            .with_config_error("trailing comma");
        assert!(store.load_config().is_err());
    }

    #[test]
    fn test_missing_transcript_is_error() {
        let store = MemoryWorkflowStore::new();
        assert!(store.read_transcript(Path::new("/tmp/none.jsonl")).is_err());
    }
}
