//! Parsing of the one-shot signal written by workflow steps.
//!
//! A signal names the next command, e.g. `execute-phase 3` or
//! `/gsd:plan-phase 4 --gaps`. Leading slashes and the namespace prefix are
//! optional; the command is always rendered back with [`COMMAND_NAMESPACE`].

use crate::config::{COMMAND_NAMESPACE, GAPS_FLAG};
use std::fmt;

/// Workflow verbs the engine emits on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    PlanPhase,
    ExecutePhase,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Self::PlanPhase => "plan-phase",
            Self::ExecutePhase => "execute-phase",
        }
    }
}

/// A parsed signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalCommand {
    /// Command words without namespace, single-space separated
    body: String,
    phase: Option<u32>,
    gap_closure: bool,
}

impl SignalCommand {
    /// Parse raw signal text. Returns `None` if nothing remains after
    /// trimming and stripping the namespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let unslashed = trimmed.trim_start_matches('/');
        let namespace = COMMAND_NAMESPACE.trim_start_matches('/');
        let stripped = unslashed.strip_prefix(namespace).unwrap_or(unslashed);

        let tokens: Vec<&str> = stripped.split_whitespace().collect();
        let (_, rest) = tokens.split_first()?;

        let phase = rest.iter().find_map(|t| t.parse::<u32>().ok());
        let gap_closure = rest.iter().any(|t| *t == GAPS_FLAG);

        Some(Self {
            body: tokens.join(" "),
            phase,
            gap_closure,
        })
    }

    /// Plan command for `phase`, optionally in gap-closure mode
    #[must_use]
    pub fn plan_phase(phase: u32, gaps: bool) -> Self {
        let body = if gaps {
            format!("{} {} {}", Verb::PlanPhase.as_str(), phase, GAPS_FLAG)
        } else {
            format!("{} {}", Verb::PlanPhase.as_str(), phase)
        };
        Self {
            body,
            phase: Some(phase),
            gap_closure: gaps,
        }
    }

    /// Execute command for `phase`
    #[must_use]
    pub fn execute_phase(phase: u32) -> Self {
        Self {
            body: format!("{} {}", Verb::ExecutePhase.as_str(), phase),
            phase: Some(phase),
            gap_closure: false,
        }
    }

    /// First numeric argument, if any
    #[must_use]
    pub fn phase(&self) -> Option<u32> {
        self.phase
    }

    /// Whether the command asks for a gap-closure re-plan
    #[must_use]
    pub fn is_gap_closure(&self) -> bool {
        self.gap_closure
    }

    /// The command to inject, e.g. `/gsd:execute-phase 3`
    #[must_use]
    pub fn command(&self) -> String {
        format!("{COMMAND_NAMESPACE}{}", self.body)
    }
}

impl fmt::Display for SignalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}
