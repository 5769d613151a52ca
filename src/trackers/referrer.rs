//! Traffic-source classification.
//!
//! Classifies the document referrer at page load. An empty referrer is a
//! direct visit; a referrer pointing at the site's own host is ignored
//! entirely; anything else is bucketed into a fixed set of sources by
//! substring match.

use std::fmt;

/// A classified traffic source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferrerSource {
    Google,
    LinkedIn,
    GitHub,
    Facebook,
    TwitterX,
    Other,
    Direct,
}

impl ReferrerSource {
    /// Display name used as the referrer counter key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::LinkedIn => "LinkedIn",
            Self::GitHub => "GitHub",
            Self::Facebook => "Facebook",
            Self::TwitterX => "Twitter/X",
            Self::Other => "other",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for ReferrerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved traffic-source attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// The classified source.
    pub source: ReferrerSource,

    /// The raw referrer URL; empty for direct visits.
    pub full_referrer: String,
}

/// Classifies a referrer against the site's own host.
///
/// Returns `None` for self-referrals (internal navigation), which are not
/// counted at all. A missing or empty referrer resolves to
/// [`ReferrerSource::Direct`].
#[must_use]
pub fn classify(referrer: Option<&str>, own_host: &str) -> Option<Attribution> {
    let referrer = referrer.unwrap_or("");
    if referrer.is_empty() {
        return Some(Attribution {
            source: ReferrerSource::Direct,
            full_referrer: String::new(),
        });
    }

    if !own_host.is_empty() && referrer.contains(own_host) {
        return None;
    }

    Some(Attribution {
        source: source_for_url(referrer),
        full_referrer: referrer.to_string(),
    })
}

/// Buckets an external referrer URL by substring match.
fn source_for_url(url: &str) -> ReferrerSource {
    let url = url.to_lowercase();
    if url.contains("google") {
        ReferrerSource::Google
    } else if url.contains("linkedin") {
        ReferrerSource::LinkedIn
    } else if url.contains("github") {
        ReferrerSource::GitHub
    } else if url.contains("facebook") {
        ReferrerSource::Facebook
    } else if url.contains("twitter") || url.contains("x.com") {
        ReferrerSource::TwitterX
    } else {
        ReferrerSource::Other
    }
}
