//! Custom assertions for domain-specific testing.
//!
//! Provides expressive assertions over engine [`Decision`]s.

use crate::engine::{Decision, StayReason};

/// Assert that the engine decided to continue with `command`.
///
/// # Panics
///
/// Panics with a descriptive message if the decision differs.
///
/// # Example
///
/// ```rust,ignore
/// let decision = engine.decide(&ctx);
/// assert_continues_with(&decision, "/gsd:execute-phase 3");
/// ```
pub fn assert_continues_with(decision: &Decision, command: &str) {
    match decision {
        Decision::Continue { command: actual, .. } => assert_eq!(
            actual, command,
            "Expected continuation with {command:?}, got {actual:?}"
        ),
        other => panic!("Expected continuation with {command:?}, got {other:?}"),
    }
}

/// Assert that the engine stayed silent for `reason`.
///
/// # Panics
///
/// Panics if the engine continued, tripped a guardrail, or stayed silent
/// for a different reason.
pub fn assert_stays(decision: &Decision, reason: StayReason) {
    match decision {
        Decision::NoDecision(actual) => assert_eq!(
            *actual, reason,
            "Expected no decision because of {reason:?}, got {actual:?}"
        ),
        other => panic!("Expected no decision because of {reason:?}, got {other:?}"),
    }
}

/// Assert that the engine stopped at the gap-closure guardrail.
///
/// # Panics
///
/// Panics if the decision is not a guardrail.
pub fn assert_guardrail(decision: &Decision) {
    assert!(
        matches!(decision, Decision::Guardrail { .. }),
        "Expected guardrail, got {decision:?}"
    );
}
