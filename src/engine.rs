//! The continuation decision engine.
//!
//! One call per host turn. The engine reads the project's auto-mode flag,
//! consumes the pending signal (or, in transcript mode, scans the session
//! transcript), applies the gap-closure guardrail and returns exactly one
//! [`Decision`].
//!
//! ```text
//! InvocationContext
//!    │
//!    ├─► re-entrant stop? ──────────────► discard signal, NoDecision
//!    ├─► auto_mode != true? ────────────► discard signal, NoDecision
//!    ├─► take signal (deleted on read)
//!    │     └─► gap closure over limit? ─► Guardrail
//!    └─► Continue { command }
//! ```
//!
//! No error escapes [`ContinuationEngine::decide`]: every store failure is
//! logged and becomes [`Decision::NoDecision`].

use crate::config::{DEFAULT_GAP_CLOSURE_LIMIT, DEFAULT_TAIL_LINES};
use crate::error::AutochainError;
use crate::hooks::InvocationContext;
use crate::signal::SignalCommand;
use crate::store::WorkflowStore;
use crate::transcript::{state_phase, Banner, TranscriptSignal, TranscriptWindow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Where the engine looks for the next step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Only the one-shot signal file
    #[default]
    Signal,
    /// Only banner scanning over the session transcript
    Transcript,
    /// Signal first, transcript when no signal is pending
    Auto,
}

/// Tunables for a single engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub mode: EngineMode,
    /// Let the signal path run even when the host reports a re-entrant stop.
    /// Transcript scanning ignores this and always refuses re-entrant stops.
    pub allow_reentry: bool,
    /// Gap-closure plans tolerated in one phase before stopping
    pub gap_closure_limit: usize,
    /// Transcript lines inspected by the banner scanner
    pub tail_lines: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mode: EngineMode::default(),
            allow_reentry: false,
            gap_closure_limit: DEFAULT_GAP_CLOSURE_LIMIT,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}

/// Why the engine chose not to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StayReason {
    /// The host is already continuing from a previous block
    Reentrant,
    /// Config missing or `auto_mode` not true
    AutoModeOff,
    /// Config present but unreadable or malformed
    ConfigError,
    /// No signal pending
    NoSignal,
    /// Signal could not be read or consumed
    SignalError,
    /// Signal consumed but blank
    EmptySignal,
    /// Host supplied no transcript, or it was empty
    NoTranscript,
    /// Transcript could not be read
    TranscriptError,
    /// A hard-stop marker is in the transcript window
    HardStop(&'static str),
    /// No actionable banner in the transcript window
    NoBanner,
    /// STATE.md missing or without a phase line
    NoState,
}

/// The engine's single output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the host stop normally
    NoDecision(StayReason),
    /// Block the stop and inject `command`
    Continue { command: String, reason: String },
    /// Loop protection tripped; stop and ask for manual review
    Guardrail { message: String },
}

impl Decision {
    fn continue_with(command: &SignalCommand, reason: String) -> Self {
        Self::Continue {
            command: command.command(),
            reason,
        }
    }

    /// True for [`Decision::Continue`]
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }

    /// The injected command, if continuing
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Continue { command, .. } => Some(command),
            _ => None,
        }
    }
}

/// Continuation engine over a [`WorkflowStore`].
#[derive(Debug)]
pub struct ContinuationEngine<S> {
    store: S,
    options: EngineOptions,
}

impl<S: WorkflowStore> ContinuationEngine<S> {
    #[must_use]
    pub fn new(store: S, options: EngineOptions) -> Self {
        Self { store, options }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Produce the decision for one host turn.
    pub fn decide(&mut self, ctx: &InvocationContext) -> Decision {
        let decision = self.evaluate(ctx);
        match &decision {
            Decision::Continue { command, .. } => info!("Auto-continuing with {}", command),
            Decision::Guardrail { message } => warn!("{}", message),
            Decision::NoDecision(reason) => debug!("No decision: {:?}", reason),
        }
        decision
    }

    fn evaluate(&mut self, ctx: &InvocationContext) -> Decision {
        if ctx.stop_hook_active && !self.options.allow_reentry {
            self.discard_signal();
            return Decision::NoDecision(StayReason::Reentrant);
        }

        if let Err(reason) = self.check_auto_mode() {
            self.discard_signal();
            return Decision::NoDecision(reason);
        }

        match self.options.mode {
            EngineMode::Signal => self.from_signal(),
            EngineMode::Transcript => self.from_transcript(ctx),
            EngineMode::Auto => match self.from_signal() {
                Decision::NoDecision(StayReason::NoSignal | StayReason::EmptySignal) => {
                    self.from_transcript(ctx)
                }
                decided => decided,
            },
        }
    }

    fn check_auto_mode(&self) -> Result<(), StayReason> {
        match self.store.load_config() {
            Ok(Some(config)) if config.is_auto_mode() => Ok(()),
            Ok(_) => Err(StayReason::AutoModeOff),
            Err(e) => {
                log_store_error("project config", &e);
                Err(StayReason::ConfigError)
            }
        }
    }

    // =========================================================================
    // Signal variant
    // =========================================================================

    /// Consume a pending signal without acting on it, so it cannot fire on a
    /// later turn. Transcript-only runs leave the signal alone.
    fn discard_signal(&mut self) {
        if self.options.mode == EngineMode::Transcript {
            return;
        }
        match self.store.take_signal() {
            Ok(Some(raw)) => debug!("Discarded signal {:?}", raw.trim()),
            Ok(None) => {}
            Err(e) => log_store_error("signal", &e),
        }
    }

    fn from_signal(&mut self) -> Decision {
        let raw = match self.store.take_signal() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Decision::NoDecision(StayReason::NoSignal),
            Err(e) => {
                log_store_error("signal", &e);
                return Decision::NoDecision(StayReason::SignalError);
            }
        };

        let Some(command) = SignalCommand::parse(&raw) else {
            return Decision::NoDecision(StayReason::EmptySignal);
        };

        if command.is_gap_closure() {
            if let Some(phase) = command.phase() {
                if let Some(guardrail) = self.gap_closure_guard(phase) {
                    return guardrail;
                }
            }
        }

        let reason = format!(
            "Auto-mode: Run {command} now. Execute it immediately without asking for confirmation."
        );
        Decision::continue_with(&command, reason)
    }

    /// Stop once a phase has accumulated too many gap-closure plans.
    ///
    /// A phase without a unique directory skips the guard.
    fn gap_closure_guard(&self, phase: u32) -> Option<Decision> {
        let artifacts = match self.store.phase_artifacts(phase) {
            Ok(Some(artifacts)) => artifacts,
            Ok(None) => return None,
            Err(e) => {
                log_store_error("phase directory", &e);
                return None;
            }
        };

        let limit = self.options.gap_closure_limit;
        if artifacts.gap_closure_plans >= limit {
            return Some(Decision::Guardrail {
                message: format!(
                    "Auto-mode: Gap closure attempted {} times for phase {} (limit {}). \
                     Stopping for manual review.",
                    artifacts.gap_closure_plans, phase, limit
                ),
            });
        }
        None
    }

    // =========================================================================
    // Transcript variant
    // =========================================================================

    fn from_transcript(&self, ctx: &InvocationContext) -> Decision {
        if ctx.stop_hook_active {
            return Decision::NoDecision(StayReason::Reentrant);
        }

        let Some(path) = ctx.transcript_path.as_deref() else {
            return Decision::NoDecision(StayReason::NoTranscript);
        };

        let content = match self.store.read_transcript(path) {
            Ok(content) => content,
            Err(e) => {
                log_store_error("transcript", &e);
                return Decision::NoDecision(StayReason::TranscriptError);
            }
        };

        let window = TranscriptWindow::from_tail(&content, self.options.tail_lines);
        if window.is_empty() {
            return Decision::NoDecision(StayReason::NoTranscript);
        }

        match window.classify() {
            TranscriptSignal::HardStop(marker) => {
                Decision::NoDecision(StayReason::HardStop(marker))
            }
            TranscriptSignal::Phase {
                banner: Banner::Planned,
                phase,
            } => {
                let command = SignalCommand::execute_phase(phase);
                let reason = format!("Auto-mode: Phase {phase} planned. Run {command}");
                Decision::continue_with(&command, reason)
            }
            TranscriptSignal::Phase {
                banner: Banner::Complete,
                phase,
            } => match phase.checked_add(1) {
                Some(next) => {
                    let command = SignalCommand::plan_phase(next, false);
                    let reason = format!("Auto-mode: Plan next phase. Run {command}");
                    Decision::continue_with(&command, reason)
                }
                None => Decision::NoDecision(StayReason::NoBanner),
            },
            TranscriptSignal::Phase {
                banner: Banner::GapsFound,
                phase,
            } => {
                if let Some(guardrail) = self.gap_closure_guard(phase) {
                    return guardrail;
                }
                let command = SignalCommand::plan_phase(phase, true);
                let reason = format!("Auto-mode: Gaps found. Run {command}");
                Decision::continue_with(&command, reason)
            }
            TranscriptSignal::AutoModeOn => self.from_state(),
            TranscriptSignal::Nothing => Decision::NoDecision(StayReason::NoBanner),
        }
    }

    /// Pick the next step for the phase recorded in STATE.md.
    fn from_state(&self) -> Decision {
        let state = match self.store.read_state() {
            Ok(Some(state)) => state,
            Ok(None) => return Decision::NoDecision(StayReason::NoState),
            Err(e) => {
                log_store_error("STATE.md", &e);
                return Decision::NoDecision(StayReason::NoState);
            }
        };

        let Some(phase) = state_phase(&state) else {
            return Decision::NoDecision(StayReason::NoState);
        };

        let artifacts = self.store.phase_artifacts(phase).unwrap_or_else(|e| {
            log_store_error("phase directory", &e);
            None
        });

        let command = match artifacts {
            Some(a) if a.is_executed() => match phase.checked_add(1) {
                Some(next) => SignalCommand::plan_phase(next, false),
                None => return Decision::NoDecision(StayReason::NoState),
            },
            Some(a) if a.plans > 0 => SignalCommand::execute_phase(phase),
            _ => SignalCommand::plan_phase(phase, false),
        };

        let reason = format!("Auto-mode: Starting. Run {command}");
        Decision::continue_with(&command, reason)
    }
}

fn log_store_error(what: &str, e: &AutochainError) {
    if e.is_silent() {
        debug!("Ignoring {}: {}", what, e);
    } else {
        warn!("Ignoring unreadable {}: {}", what, e);
    }
}
