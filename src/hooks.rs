//! Stop-hook protocol: what the host sends and what we answer.
//!
//! The host writes one JSON object to stdin and closes it. We answer with
//! at most one JSON object on stdout:
//!
//! - `{"decision":"block","reason":...}` to keep the session going
//! - `{"systemMessage":...}` to surface a guardrail without blocking
//! - nothing at all to let the session stop
//!
//! Reading stdin is bounded by a wall-clock timeout so an orphaned hook
//! never outlives a host that forgot to close the stream.

use crate::engine::{ContinuationEngine, Decision, EngineOptions};
use crate::error::{AutochainError, Result};
use crate::store::WorkflowStore;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Per-call context supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    /// True when the host is already continuing because of a previous block
    #[serde(default)]
    pub stop_hook_active: bool,

    #[serde(default)]
    pub transcript_path: Option<PathBuf>,

    #[serde(default)]
    pub session_id: Option<String>,

    /// Working directory of the session
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub hook_event_name: Option<String>,
}

impl InvocationContext {
    /// Parse hook input. Blank input yields `Ok(None)`.
    pub fn parse(input: &str) -> Result<Option<Self>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(input)
            .map(Some)
            .map_err(|e| AutochainError::InvalidInput {
                reason: e.to_string(),
            })
    }
}

/// JSON answer written to stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(
        default,
        rename = "systemMessage",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_message: Option<String>,
}

impl HookOutput {
    /// Block the stop and feed `reason` back to the assistant.
    #[must_use]
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            decision: Some("block".to_string()),
            reason: Some(reason.into()),
            system_message: None,
        }
    }

    /// Show `message` to the user without blocking the stop.
    #[must_use]
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            system_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Map an engine decision onto the wire. `NoDecision` produces no output.
    #[must_use]
    pub fn from_decision(decision: &Decision) -> Option<Self> {
        match decision {
            Decision::Continue { reason, .. } => Some(Self::block(reason.clone())),
            Decision::Guardrail { message } => Some(Self::notice(message.clone())),
            Decision::NoDecision(_) => None,
        }
    }

    /// True when this output blocks the stop
    #[must_use]
    pub fn is_block(&self) -> bool {
        self.decision.as_deref() == Some("block")
    }

    /// Serialize to a single-line JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Read all hook input from `reader`, giving up after `timeout`.
///
/// # Errors
///
/// Returns [`AutochainError::InputTimeout`] if the stream is not closed in
/// time, or an IO error if reading fails.
pub async fn read_hook_input<R>(mut reader: R, timeout: Duration) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut input = String::new();
    let read = tokio::time::timeout(timeout, reader.read_to_string(&mut input)).await;
    match read {
        Ok(Ok(bytes)) => {
            debug!("Read {} bytes of hook input", bytes);
            Ok(input)
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(AutochainError::InputTimeout {
            millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Write `output` as one JSON line to `out`.
///
/// # Errors
///
/// Returns an IO error if the host has already closed the stream.
pub fn write_hook_output<W: Write>(mut out: W, output: &HookOutput) -> Result<()> {
    writeln!(out, "{}", output.to_json()?)?;
    out.flush()?;
    Ok(())
}

/// Run the engine for one stop event and map the result onto the wire.
pub fn run_stop_hook<S: WorkflowStore>(
    store: S,
    options: EngineOptions,
    ctx: &InvocationContext,
) -> Option<HookOutput> {
    let mut engine = ContinuationEngine::new(store, options);
    let decision = engine.decide(ctx);
    HookOutput::from_decision(&decision)
}
