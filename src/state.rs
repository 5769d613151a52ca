//! Analytics counter state and schema migration.
//!
//! Earlier releases kept two overlapping schemas: a pair of single-key
//! counter blobs (`portfolio_views` / `portfolio_clicks_count`) and a richer
//! JSON blob, with an ad-hoc backfill between them on every load. This
//! module replaces that with one versioned [`AnalyticsState`] plus an
//! explicit one-time migration ([`migrate_legacy`]) guarded by a stored
//! schema-version marker. The legacy blobs are still read — for the
//! migration itself and for the raw view in [`AnalyticsSnapshot`] — but are
//! never written again.
//!
//! # Invariant
//!
//! `unique_visitors` always equals `visitor_timestamps.len()`, and the
//! timestamp list never holds a duplicate day+visitor composite key. All
//! mutation goes through [`AnalyticsState::record_visit`], which maintains
//! both halves.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{
    Storage, StorageError, LEGACY_CLICKS_KEY, LEGACY_VIEWS_KEY, SCHEMA_VERSION_KEY, STATE_KEY,
};

/// Current schema version of [`AnalyticsState`].
///
/// Version 1 is the implicit version of the legacy two-key schema;
/// version 2 introduced the single versioned blob.
pub const SCHEMA_VERSION: u32 = 2;

/// Versioned analytics counters, stored under
/// [`STATE_KEY`](crate::storage::STATE_KEY) as camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsState {
    /// Total page views.
    pub page_views: u64,

    /// Count of distinct day+visitor composite keys. Kept equal to
    /// `visitor_timestamps.len()`.
    pub unique_visitors: u64,

    /// Total resume-download interactions.
    pub resume_downloads: u64,

    /// Total email-link interactions.
    pub email_clicks: u64,

    /// Total click-style interactions of any category. Absorbs the legacy
    /// click counter.
    pub total_clicks: u64,

    /// Per-section view counts, keyed by section id.
    pub section_views: BTreeMap<String, u64>,

    /// Ordered, deduplicated `"<day>_<visitorId>"` composite keys.
    pub visitor_timestamps: Vec<String>,

    /// Per-source referrer counts, keyed by source display name.
    pub referrers: BTreeMap<String, u64>,

    /// When the state was last persisted.
    pub last_updated: DateTime<Utc>,
}

impl Default for AnalyticsState {
    fn default() -> Self {
        Self {
            page_views: 0,
            unique_visitors: 0,
            resume_downloads: 0,
            email_clicks: 0,
            total_clicks: 0,
            section_views: BTreeMap::new(),
            visitor_timestamps: Vec::new(),
            referrers: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl AnalyticsState {
    /// Records a visit for `visitor_id` on `day_key`.
    ///
    /// The composite key is appended only if not already present, and
    /// `unique_visitors` is recomputed from the list length. Returns `true`
    /// if this was the first visit for that day+visitor pair.
    pub fn record_visit(&mut self, day_key: &str, visitor_id: &str) -> bool {
        let composite = format!("{day_key}_{visitor_id}");
        if self.visitor_timestamps.iter().any(|k| k == &composite) {
            return false;
        }
        self.visitor_timestamps.push(composite);
        self.unique_visitors = self.visitor_timestamps.len() as u64;
        true
    }

    /// Increments the view counter for `section_id`.
    pub fn bump_section(&mut self, section_id: &str) {
        *self.section_views.entry(section_id.to_string()).or_insert(0) += 1;
    }

    /// Increments the referrer counter for `source`.
    pub fn bump_referrer(&mut self, source: &str) {
        *self.referrers.entry(source.to_string()).or_insert(0) += 1;
    }
}

/// Legacy page-view counter blob (`portfolio_views`). Read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyViews {
    /// Total recorded page views.
    pub total: u64,

    /// Timestamp of the most recent visit.
    pub last_visit: Option<DateTime<Utc>>,
}

/// Legacy click counter blob (`portfolio_clicks_count`). Read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyClicks {
    /// Total recorded clicks.
    pub total: u64,

    /// Timestamp of the most recent click.
    pub last: Option<DateTime<Utc>>,
}

/// Raw legacy blobs, exposed unmodified in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySnapshot {
    /// Contents of the legacy views key.
    pub views: LegacyViews,

    /// Contents of the legacy clicks key.
    pub clicks: LegacyClicks,
}

/// Forwarding status metadata included in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForwardingStatus {
    /// Whether tag forwarding is active.
    pub enabled: bool,

    /// The measurement id forwarding was configured with, if any.
    pub measurement_id: Option<String>,

    /// Human-readable note for the statistics view.
    pub message: String,
}

/// Read-only composite view over the versioned state, the raw legacy
/// blobs, and the forwarding status. Intended for a statistics display.
///
/// Counters that also existed in the legacy schema fall back to the legacy
/// total when the versioned value is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// Page views, preferring the versioned counter.
    pub page_views: u64,

    /// Distinct day+visitor pairs.
    pub unique_visitors: u64,

    /// Resume-download interactions.
    pub resume_downloads: u64,

    /// Email-link interactions.
    pub email_clicks: u64,

    /// Click-style interactions, preferring the versioned counter.
    pub total_clicks: u64,

    /// Per-section view counts.
    pub section_views: BTreeMap<String, u64>,

    /// Per-source referrer counts.
    pub referrers: BTreeMap<String, u64>,

    /// When the state was last persisted.
    pub last_updated: DateTime<Utc>,

    /// Raw legacy blobs.
    pub legacy: LegacySnapshot,

    /// Forwarding status metadata.
    pub forwarding: ForwardingStatus,
}

impl AnalyticsSnapshot {
    /// Builds a snapshot from the current state and the raw legacy blobs.
    #[must_use]
    pub fn compose(
        state: &AnalyticsState,
        legacy: LegacySnapshot,
        forwarding: ForwardingStatus,
    ) -> Self {
        let page_views = if state.page_views > 0 {
            state.page_views
        } else {
            legacy.views.total
        };
        let total_clicks = if state.total_clicks > 0 {
            state.total_clicks
        } else {
            legacy.clicks.total
        };

        Self {
            page_views,
            unique_visitors: state.unique_visitors,
            resume_downloads: state.resume_downloads,
            email_clicks: state.email_clicks,
            total_clicks,
            section_views: state.section_views.clone(),
            referrers: state.referrers.clone(),
            last_updated: state.last_updated,
            legacy,
            forwarding,
        }
    }
}

/// Runs the one-time migration from the legacy two-key schema.
///
/// Guarded by the stored schema-version marker: once the marker reaches
/// [`SCHEMA_VERSION`], subsequent calls are no-ops. Legacy totals are
/// applied only where the corresponding versioned counter is exactly zero
/// (the seed heuristic carried over from the legacy loader). The legacy
/// keys themselves are left in place; only an explicit reset removes them.
///
/// Returns `true` if any counter was backfilled.
///
/// # Errors
///
/// Returns `StorageError` if writing the migrated state or the marker
/// fails.
pub fn migrate_legacy<S: Storage>(store: &mut S) -> Result<bool, StorageError> {
    let stored_version: u32 = store
        .get(SCHEMA_VERSION_KEY)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    if stored_version >= SCHEMA_VERSION {
        return Ok(false);
    }

    let mut state: AnalyticsState = store.read_json_or_default(STATE_KEY);
    let views: LegacyViews = store.read_json_or_default(LEGACY_VIEWS_KEY);
    let clicks: LegacyClicks = store.read_json_or_default(LEGACY_CLICKS_KEY);

    let mut backfilled = false;
    if views.total > 0 && state.page_views == 0 {
        state.page_views = views.total;
        backfilled = true;
    }
    if clicks.total > 0 && state.total_clicks == 0 {
        state.total_clicks = clicks.total;
        backfilled = true;
    }

    if backfilled {
        state.last_updated = Utc::now();
        store.write_json(STATE_KEY, &state)?;
        info!(
            page_views = state.page_views,
            total_clicks = state.total_clicks,
            "Migrated legacy counters into versioned state"
        );
    }

    store.set(SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_string())?;
    Ok(backfilled)
}
