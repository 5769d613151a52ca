//! Section visibility tracking.
//!
//! Replicates an intersection observer with a 50% threshold: the host
//! reports visibility ratios as they change, and [`SectionObserver`]
//! detects the rising edge — the moment a section crosses into
//! at-least-half visibility. Every fresh crossing counts; there is
//! deliberately no view-once debounce.

use std::collections::HashMap;

/// Fraction of a section's area that must be visible to count as a view.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// Tracks per-section visibility state and detects threshold crossings.
#[derive(Debug)]
pub struct SectionObserver {
    threshold: f64,
    visible: HashMap<String, bool>,
}

impl SectionObserver {
    /// Creates an observer with the standard 50% threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(VISIBILITY_THRESHOLD)
    }

    /// Creates an observer with a custom threshold.
    #[must_use]
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            visible: HashMap::new(),
        }
    }

    /// Reports a new visibility ratio for `section_id`.
    ///
    /// Returns `true` exactly when the section crosses from below the
    /// threshold to at or above it. Staying above, staying below, or
    /// dropping out all return `false`.
    pub fn update(&mut self, section_id: &str, ratio: f64) -> bool {
        let now_visible = ratio >= self.threshold;
        let was_visible = self
            .visible
            .insert(section_id.to_string(), now_visible)
            .unwrap_or(false);

        now_visible && !was_visible
    }
}

impl Default for SectionObserver {
    fn default() -> Self {
        Self::new()
    }
}
