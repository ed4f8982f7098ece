//! Banner scanning over the tail of a session transcript.
//!
//! Workflow skills print boxed banners such as `PHASE 3 PLANNED`. The
//! scanner looks at a bounded window of the transcript and evaluates an
//! ordered list of rules; the first rule that produces a match wins.
//!
//! ```text
//! hard stops ─► PLANNED ─► COMPLETE ─► GAPS FOUND ─► AUTO-MODE ON
//! ```
//!
//! Within one banner type the *last* occurrence in the window is used.

use regex::Regex;

/// Markers that forbid continuation whatever else the window contains.
pub const HARD_STOP_MARKERS: &[&str] = &["MILESTONE COMPLETE", "human_needed", "\u{2551}  ERROR"];

/// Banner announcing that auto mode was just switched on
pub const AUTO_MODE_ON_BANNER: &str = "AUTO-MODE ON";

/// Phase banners in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Planned,
    Complete,
    GapsFound,
}

impl Banner {
    /// Evaluation order of the phase banners
    pub const ORDER: [Banner; 3] = [Banner::Planned, Banner::Complete, Banner::GapsFound];

    /// Text that follows the phase number on the banner line
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Complete => "COMPLETE",
            Self::GapsFound => "GAPS FOUND",
        }
    }

    /// Line pattern capturing the phase number ahead of the keyword.
    ///
    /// `.` does not cross newlines, so each match is confined to one line.
    fn pattern(&self) -> Option<Regex> {
        let pattern = format!(r".*PHASE\s+(\d+).*{}", regex::escape(self.keyword()));
        Regex::new(&pattern).ok()
    }
}

/// What the transcript window says should happen next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptSignal {
    /// A hard-stop marker is present
    HardStop(&'static str),
    /// A phase banner with its phase number
    Phase { banner: Banner, phase: u32 },
    /// Auto mode was just enabled; the next step comes from STATE.md
    AutoModeOn,
    /// Nothing actionable
    Nothing,
}

/// The last `lines` lines of a transcript.
#[derive(Debug, Clone)]
pub struct TranscriptWindow {
    text: String,
}

impl TranscriptWindow {
    /// Keep the last `lines` lines of `content`.
    ///
    /// A trailing newline counts as an empty final line, so a transcript
    /// ending in `\n` keeps `lines - 1` lines of content.
    #[must_use]
    pub fn from_tail(content: &str, lines: usize) -> Self {
        let all: Vec<&str> = content.split('\n').collect();
        let start = all.len().saturating_sub(lines);
        Self {
            text: all[start..].join("\n"),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// First hard-stop marker present in the window
    #[must_use]
    pub fn hard_stop(&self) -> Option<&'static str> {
        HARD_STOP_MARKERS
            .iter()
            .copied()
            .find(|marker| self.text.contains(marker))
    }

    /// Phase number of the last `banner` line in the window.
    #[must_use]
    pub fn last_phase(&self, banner: Banner) -> Option<u32> {
        if !self.text.contains(banner.keyword()) {
            return None;
        }
        let re = banner.pattern()?;
        re.captures_iter(&self.text)
            .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
            .last()
    }

    /// Evaluate the rules in priority order.
    #[must_use]
    pub fn classify(&self) -> TranscriptSignal {
        if let Some(marker) = self.hard_stop() {
            return TranscriptSignal::HardStop(marker);
        }

        for banner in Banner::ORDER {
            if let Some(phase) = self.last_phase(banner) {
                return TranscriptSignal::Phase { banner, phase };
            }
        }

        if self.text.contains(AUTO_MODE_ON_BANNER) {
            return TranscriptSignal::AutoModeOn;
        }

        TranscriptSignal::Nothing
    }
}

/// Extract the current phase number from STATE.md (`Phase: 3 of 8`).
#[must_use]
pub fn state_phase(state: &str) -> Option<u32> {
    let re = Regex::new(r"Phase:\s*(\d+)").ok()?;
    re.captures(state)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
