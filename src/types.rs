//! Event types for visitor tracking.
//!
//! Every tracked interaction is an [`EventPayload`] variant; the payload's
//! [`EventKind`] is the event name forwarded to the tag pipeline. Payloads
//! serialize with snake_case parameter names to match the tag manager's
//! event-parameter conventions.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the random alphanumeric suffix in visitor IDs.
const VISITOR_ID_SUFFIX_LEN: usize = 9;

/// Prefix for all visitor IDs.
pub const VISITOR_ID_PREFIX: &str = "visitor_";

/// Classification of tracked events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PageView,
    ProjectClick,
    EmailClick,
    ResumeDownload,
    SocialClick,
    SectionView,
    TrafficSource,
    SessionEnd,
}

impl EventKind {
    /// Returns the event name as forwarded to the tag pipeline.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::ProjectClick => "project_click",
            Self::EmailClick => "email_click",
            Self::ResumeDownload => "resume_download",
            Self::SocialClick => "social_click",
            Self::SectionView => "section_view",
            Self::TrafficSource => "traffic_source",
            Self::SessionEnd => "session_end",
        }
    }

    /// Returns `true` for click-style interactions.
    ///
    /// These are the events that bump the total click counter and refresh
    /// the on-page counter display.
    #[must_use]
    pub fn is_interaction(self) -> bool {
        matches!(
            self,
            Self::ProjectClick | Self::EmailClick | Self::ResumeDownload | Self::SocialClick
        )
    }
}

/// Payload variants for tracked events.
///
/// Serializes internally tagged; parameter names stay snake_case for the
/// tag pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Initial page view.
    PageView {
        page_title: String,
        page_location: String,
    },
    /// Click in a project card or question-answer button region.
    ProjectClick {
        element: String,
        text: Option<String>,
    },
    /// Click on a `mailto:` link.
    EmailClick { email: String },
    /// Click on a PDF link or resume-labelled element.
    ResumeDownload,
    /// Click in a social-link region.
    SocialClick { platform: String },
    /// Section crossed the visibility threshold.
    SectionView { section: String },
    /// External referrer classified at load.
    TrafficSource {
        source: String,
        full_referrer: String,
    },
    /// Session ended; duration in whole seconds.
    SessionEnd {
        session_duration_seconds: u64,
        session_id: Uuid,
    },
}

impl EventPayload {
    /// Returns the [`EventKind`] for this payload.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PageView { .. } => EventKind::PageView,
            Self::ProjectClick { .. } => EventKind::ProjectClick,
            Self::EmailClick { .. } => EventKind::EmailClick,
            Self::ResumeDownload => EventKind::ResumeDownload,
            Self::SocialClick { .. } => EventKind::SocialClick,
            Self::SectionView { .. } => EventKind::SectionView,
            Self::TrafficSource { .. } => EventKind::TrafficSource,
            Self::SessionEnd { .. } => EventKind::SessionEnd,
        }
    }
}

/// Generates a visitor ID: `visitor_` followed by 9 lowercase alphanumeric
/// characters.
#[must_use]
pub fn generate_visitor_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();
    let suffix: String = (0..VISITOR_ID_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{VISITOR_ID_PREFIX}{suffix}")
}
