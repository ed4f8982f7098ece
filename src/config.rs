//! Configuration and on-disk layout of a planning project.
//!
//! All project-relative paths the engine touches are resolved through
//! [`PlanningPaths`] so tests and the CLI agree on the layout:
//!
//! ```text
//! <project>/.planning/
//!   config.json        ProjectConfig (auto_mode)
//!   .auto-next         one-shot signal
//!   STATE.md           current phase (transcript mode only)
//!   phases/NN-name/    *-PLAN.md, *-SUMMARY.md
//! ```

use crate::error::{AutochainError, IntoAutochainError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding all workflow state, relative to the project root
pub const PLANNING_DIR: &str = ".planning";

/// Project configuration file name
pub const CONFIG_FILE: &str = "config.json";

/// One-shot signal file name
pub const SIGNAL_FILE: &str = ".auto-next";

/// Workflow state file consulted by the `AUTO-MODE ON` banner
pub const STATE_FILE: &str = "STATE.md";

/// Directory containing one sub-directory per phase
pub const PHASES_DIR: &str = "phases";

/// Suffix of plan artifacts inside a phase directory
pub const PLAN_SUFFIX: &str = "-PLAN.md";

/// Suffix of summary artifacts inside a phase directory
pub const SUMMARY_SUFFIX: &str = "-SUMMARY.md";

/// Token marking a plan as a gap-closure plan
pub const GAP_CLOSURE_MARKER: &str = "gap_closure";

/// Flag on a plan command requesting gap closure
pub const GAPS_FLAG: &str = "--gaps";

/// Prefix every injected command is rendered with
pub const COMMAND_NAMESPACE: &str = "/gsd:";

/// Gap-closure plans allowed in one phase before auto mode stops
pub const DEFAULT_GAP_CLOSURE_LIMIT: usize = 3;

/// Transcript lines inspected by the banner scanner
pub const DEFAULT_TAIL_LINES: usize = 200;

/// Deadline for the host to deliver hook input on stdin
pub const DEFAULT_INPUT_TIMEOUT_MS: u64 = 3000;

/// Resolved paths of a planning project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningPaths {
    root: PathBuf,
}

impl PlanningPaths {
    /// Create paths for the project rooted at `project_dir`.
    #[must_use]
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            root: project_dir.as_ref().to_path_buf(),
        }
    }

    /// The project root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<project>/.planning`
    #[must_use]
    pub fn planning_dir(&self) -> PathBuf {
        self.root.join(PLANNING_DIR)
    }

    /// `<project>/.planning/config.json`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.planning_dir().join(CONFIG_FILE)
    }

    /// `<project>/.planning/.auto-next`
    #[must_use]
    pub fn signal_path(&self) -> PathBuf {
        self.planning_dir().join(SIGNAL_FILE)
    }

    /// `<project>/.planning/STATE.md`
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.planning_dir().join(STATE_FILE)
    }

    /// `<project>/.planning/phases`
    #[must_use]
    pub fn phases_dir(&self) -> PathBuf {
        self.planning_dir().join(PHASES_DIR)
    }
}

/// Project configuration stored in `.planning/config.json`.
///
/// Only `auto_mode` is interpreted here. Every other key is kept in
/// `other` so that rewriting the file never drops settings owned by the
/// rest of the workflow tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub auto_mode: bool,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ProjectConfig {
    /// Load configuration from a planning project.
    ///
    /// Returns `Ok(None)` when the file does not exist. A file that exists
    /// but cannot be read or parsed is an error.
    pub fn load(paths: &PlanningPaths) -> Result<Option<Self>> {
        let path = paths.config_path();
        if !path.exists() {
            debug!("No project config at {}", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).into_config_error()?;
        Self::parse(&content)
            .map(Some)
            .map_err(|e| AutochainError::config_with_path(e.to_string(), path))
    }

    /// Parse configuration from JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Whether unattended continuation is enabled
    #[must_use]
    pub fn is_auto_mode(&self) -> bool {
        self.auto_mode
    }

    /// Write this configuration back to `.planning/config.json`,
    /// creating the planning directory if needed.
    pub fn save(&self, paths: &PlanningPaths) -> Result<()> {
        std::fs::create_dir_all(paths.planning_dir())?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_path(), format!("{json}\n"))?;
        Ok(())
    }

    /// Set `auto_mode`, creating the config file when it is missing.
    ///
    /// An existing file must be a JSON object; anything else is rejected
    /// rather than overwritten.
    pub fn set_auto_mode(paths: &PlanningPaths, enabled: bool) -> Result<Self> {
        let mut config = match Self::load(paths) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                return Err(AutochainError::InvalidConfig {
                    field: CONFIG_FILE.to_string(),
                    reason: format!("refusing to overwrite unparseable config: {e}"),
                })
            }
        };
        config.auto_mode = enabled;
        config.save(paths)?;
        Ok(config)
    }
}
