//! Page contract between the tracker and its host.
//!
//! The tracker never touches a document tree itself. The embedding host (a
//! webview shell or the CLI bridge) describes the page and its interactions
//! with the types in this module:
//!
//! - [`PageContext`]: the loaded page (title, location, fragment, referrer)
//! - [`ClickTarget`]: one click, pre-resolved to the nearest anchor and the
//!   recognized regions it landed in
//! - [`PageEvent`]: the JSONL wire form of the above, one event per line
//! - [`CounterDisplay`]: optional on-page counter elements
//!
//! Region markers correspond to the site's recognized selector categories
//! (project cards, question-answer buttons, social links); resolving which
//! regions enclose a clicked element is the host's job.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Recognized page regions a click can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// A project card.
    ProjectCard,
    /// A question-answer call-to-action button.
    QaButton,
    /// A social profile link.
    SocialLink,
}

/// A single click, as resolved by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickTarget {
    /// Tag name of the clicked element (e.g. `"A"`, `"BUTTON"`).
    pub tag: String,

    /// Href of the clicked element or its nearest enclosing anchor.
    pub href: Option<String>,

    /// Visible text content of the clicked element.
    pub text: Option<String>,

    /// Recognized regions enclosing the element.
    pub regions: Vec<Region>,
}

impl ClickTarget {
    /// Returns `true` if the click landed inside `region`.
    #[must_use]
    pub fn in_region(&self, region: Region) -> bool {
        self.regions.contains(&region)
    }
}

/// The loaded page as seen by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageContext {
    /// Document title.
    pub title: String,

    /// Full page URL.
    pub url: String,

    /// Path component of the URL.
    pub path: String,

    /// Hostname of the site itself, used to ignore self-referrals.
    pub host: String,

    /// URL fragment without the leading `#`, if present.
    pub fragment: Option<String>,

    /// Document referrer; `None` or empty means a direct visit.
    pub referrer: Option<String>,
}

/// One page event on the JSONL bridge, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// Page finished loading.
    Load(PageContext),
    /// User clicked somewhere.
    Click(ClickTarget),
    /// A section's visibility ratio changed.
    Section { id: String, ratio: f64 },
    /// Page is unloading.
    Unload,
}

/// Parses one JSONL line into a [`PageEvent`].
///
/// Blank lines yield `None` silently; malformed lines yield `None` with a
/// warning. The bridge never fails on bad input.
#[must_use]
pub fn parse_page_event(line: &str) -> Option<PageEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str(trimmed) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "Skipping malformed page event line");
            None
        }
    }
}

/// On-page counter elements.
///
/// The tracker refreshes these after page views and click-style
/// interactions. A host without counter elements simply attaches no
/// display, which makes every refresh a no-op.
pub trait CounterDisplay {
    /// Updates the displayed page-view count.
    fn set_view_count(&mut self, count: u64);

    /// Updates the displayed click count.
    fn set_click_count(&mut self, count: u64);
}
