//! The visitor-analytics tracker.
//!
//! [`Tracker`] ties everything together: it establishes the visitor
//! identity, migrates and loads the counter state, classifies the events
//! its host feeds in, persists after every mutation, and forwards events
//! to the tag pipeline when the remote config has enabled it.
//!
//! The tracker is constructed explicitly by the composition root and
//! passed to interaction handlers; nothing in this crate installs a
//! global instance.
//!
//! # Failure policy
//!
//! After construction, nothing here returns an error: storage write
//! failures, network failures, and malformed data are logged and absorbed.
//! An analytics tracker must never take the hosting page down with it.
//!
//! # Example
//!
//! ```no_run
//! use folio_analytics::config::TrackerConfig;
//! use folio_analytics::page::PageContext;
//! use folio_analytics::storage::MemoryStore;
//! use folio_analytics::tracker::Tracker;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TrackerConfig::from_env().expect("config");
//!     let mut tracker = Tracker::new(config, MemoryStore::new()).expect("tracker");
//!
//!     tracker.init(PageContext::default()).await;
//!     println!("{}", serde_json::to_string_pretty(&tracker.snapshot()).unwrap());
//! }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{RemoteConfig, TrackerConfig};
use crate::error::Result;
use crate::page::{ClickTarget, CounterDisplay, PageContext};
use crate::state::{
    migrate_legacy, AnalyticsSnapshot, AnalyticsState, ForwardingStatus, LegacyClicks,
    LegacySnapshot, LegacyViews,
};
use crate::storage::{
    MemoryStore, Storage, StorageError, LEGACY_CLICKS_KEY, LEGACY_VIEWS_KEY,
    SESSION_DURATION_KEY, STATE_KEY, VISITOR_ID_KEY,
};
use crate::tag::TagPipeline;
use crate::trackers::interaction::{classify, Interaction};
use crate::trackers::referrer;
use crate::trackers::section::SectionObserver;
use crate::trackers::session::SessionTimer;
use crate::types::{generate_visitor_id, EventPayload};

/// HTTP request timeout for the remote-config fetch.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Note shown alongside forwarding status in the snapshot.
const FORWARDING_MESSAGE: &str = "Full analytics available in the tag manager dashboard";

/// The tracker. Generic over its persistent [`Storage`] backend.
pub struct Tracker<S: Storage> {
    config: TrackerConfig,
    store: S,
    session_store: MemoryStore,
    state: AnalyticsState,
    visitor_id: String,
    client: reqwest::Client,
    tag: TagPipeline,
    sections: SectionObserver,
    timer: SessionTimer,
    page: Option<PageContext>,
    display: Option<Box<dyn CounterDisplay>>,
}

impl<S: Storage> Tracker<S> {
    /// Builds a tracker over `store`.
    ///
    /// Establishes the visitor id (generating and persisting one on first
    /// run) and runs the schema migration before loading state. Does not
    /// touch the network; call [`init`](Self::init) for that.
    ///
    /// # Errors
    ///
    /// Returns an error only for construction-time storage failures; once
    /// built, the tracker degrades silently.
    pub fn new(config: TrackerConfig, mut store: S) -> Result<Self> {
        let visitor_id = get_or_create_visitor_id(&mut store)?;
        migrate_legacy(&mut store)?;
        let state = store.read_json_or_default(STATE_KEY);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to create HTTP client");

        let tag = TagPipeline::new(config.tag_origin.clone(), config.tag_queue_size);

        Ok(Self {
            config,
            store,
            session_store: MemoryStore::new(),
            state,
            visitor_id,
            client,
            tag,
            sections: SectionObserver::new(),
            timer: SessionTimer::start(),
            page: None,
            display: None,
        })
    }

    /// Attaches a counter display. Without one, refreshes are no-ops.
    #[must_use]
    pub fn with_display(mut self, display: Box<dyn CounterDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    /// Initializes tracking for a loaded page.
    ///
    /// Fetches the remote config (possibly enabling forwarding), records
    /// the page view, classifies the referrer, and refreshes the display.
    /// Every step degrades silently.
    pub async fn init(&mut self, page: PageContext) {
        self.load_remote_config().await;

        self.page = Some(page);
        self.increment_page_view();
        self.track_page_view();
        self.track_referrer();
        self.refresh_display();
    }

    async fn load_remote_config(&mut self) {
        let Some(url) = self.config.config_url.clone() else {
            debug!("No remote config URL set, forwarding stays off");
            return;
        };

        let Some(remote) = RemoteConfig::fetch(&self.client, &url).await else {
            return;
        };

        match remote.measurement_id_if_enabled() {
            Some(id) => {
                let id = id.to_string();
                self.tag.load(&id).await;
            }
            None => debug!("Remote config fetched but forwarding is disabled"),
        }
    }

    /// Records a page view.
    ///
    /// Bumps the view counter and appends the day+visitor composite key if
    /// this is the first view today, keeping the unique-visitor count equal
    /// to the number of stored composites.
    pub fn increment_page_view(&mut self) {
        self.state.page_views += 1;

        let day = day_key(Utc::now());
        let visitor_id = self.visitor_id.clone();
        if self.state.record_visit(&day, &visitor_id) {
            debug!(day = %day, "First visit for this day+visitor pair");
        }

        self.persist();
    }

    /// Forwards the page-view event and applies hash-based section
    /// tracking.
    fn track_page_view(&mut self) {
        let (title, url, fragment) = match &self.page {
            Some(page) => (page.title.clone(), page.url.clone(), page.fragment.clone()),
            None => return,
        };

        self.track_event(EventPayload::PageView {
            page_title: title,
            page_location: url,
        });

        // A load with a fragment counts as a view of that section,
        // independent of the visibility observer.
        if let Some(section) = fragment.filter(|f| !f.is_empty()) {
            self.state.bump_section(&section);
            self.persist();
        }
    }

    /// Classifies the referrer and records the traffic source.
    fn track_referrer(&mut self) {
        let (referrer, host) = match &self.page {
            Some(page) => (page.referrer.clone(), page.host.clone()),
            None => return,
        };

        let Some(attribution) = referrer::classify(referrer.as_deref(), &host) else {
            debug!("Self-referral ignored");
            return;
        };

        self.state.bump_referrer(attribution.source.as_str());
        self.persist();

        self.track_event(EventPayload::TrafficSource {
            source: attribution.source.as_str().to_string(),
            full_referrer: attribution.full_referrer,
        });
    }

    /// Handles one click from the host.
    ///
    /// A single click can match several interaction categories; each match
    /// updates its counter and fires its event.
    pub fn handle_click(&mut self, target: &ClickTarget) {
        for interaction in classify(target) {
            match interaction {
                Interaction::ProjectClick { element, text } => {
                    self.track_event(EventPayload::ProjectClick { element, text });
                }
                Interaction::EmailClick { email } => {
                    self.state.email_clicks += 1;
                    self.persist();
                    self.track_event(EventPayload::EmailClick { email });
                }
                Interaction::ResumeDownload => {
                    self.state.resume_downloads += 1;
                    self.persist();
                    self.track_event(EventPayload::ResumeDownload);
                }
                Interaction::SocialClick { platform } => {
                    self.track_event(EventPayload::SocialClick { platform });
                }
            }
        }
    }

    /// Reports a section visibility ratio from the host.
    ///
    /// Counts a view on every crossing into at-least-half visibility.
    pub fn observe_section(&mut self, section_id: &str, ratio: f64) {
        if !self.sections.update(section_id, ratio) {
            return;
        }

        self.state.bump_section(section_id);
        self.persist();
        self.track_event(EventPayload::SectionView {
            section: section_id.to_string(),
        });
    }

    /// Ends the session: stores the duration in the session store and
    /// forwards a session-end event. Best-effort, like any unload work.
    pub fn end_session(&mut self) {
        let duration = self.timer.elapsed_secs();

        if let Err(e) = self
            .session_store
            .set(SESSION_DURATION_KEY, &duration.to_string())
        {
            warn!(error = %e, "Failed to store session duration");
        }

        self.track_event(EventPayload::SessionEnd {
            session_duration_seconds: duration,
            session_id: self.timer.session_id(),
        });
    }

    /// Central event sink.
    ///
    /// Click-style events bump the total click counter and refresh the
    /// display. Every event is offered to the tag pipeline with the
    /// visitor id and current page path attached; the pipeline drops it
    /// if forwarding is off.
    pub fn track_event(&mut self, payload: EventPayload) {
        let kind = payload.kind();

        if kind.is_interaction() {
            self.state.total_clicks += 1;
            self.persist();
            self.refresh_display();
        }

        let mut params = match serde_json::to_value(&payload) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        params.remove("type");
        params.insert(
            "visitor_id".to_string(),
            Value::String(self.visitor_id.clone()),
        );
        let page_path = self
            .page
            .as_ref()
            .map(|p| p.path.clone())
            .unwrap_or_default();
        params.insert("page_path".to_string(), Value::String(page_path));

        self.tag.push_event(kind.as_str(), Value::Object(params));
    }

    /// Refreshes the attached counter display, if any.
    pub fn refresh_display(&mut self) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        display.set_view_count(self.state.page_views);
        display.set_click_count(self.state.total_clicks);
    }

    /// Resets all analytics data. Irreversible.
    ///
    /// Zeroes the versioned state and removes both legacy keys. The
    /// explicit confirmation step belongs to the caller.
    pub fn reset_all(&mut self) {
        self.state = AnalyticsState::default();
        self.persist();

        for key in [LEGACY_VIEWS_KEY, LEGACY_CLICKS_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove legacy key");
            }
        }

        self.refresh_display();
        info!("Analytics data reset");
    }

    /// Builds the read-only composite snapshot for a statistics view.
    #[must_use]
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let views: LegacyViews = self.store.read_json_or_default(LEGACY_VIEWS_KEY);
        let clicks: LegacyClicks = self.store.read_json_or_default(LEGACY_CLICKS_KEY);

        AnalyticsSnapshot::compose(
            &self.state,
            LegacySnapshot { views, clicks },
            ForwardingStatus {
                enabled: self.tag.is_enabled(),
                measurement_id: self.tag.measurement_id().map(str::to_string),
                message: FORWARDING_MESSAGE.to_string(),
            },
        )
    }

    /// The persistent visitor id.
    #[must_use]
    pub fn visitor_id(&self) -> &str {
        &self.visitor_id
    }

    /// The current counter state.
    #[must_use]
    pub fn state(&self) -> &AnalyticsState {
        &self.state
    }

    /// The tag pipeline.
    #[must_use]
    pub fn tag(&self) -> &TagPipeline {
        &self.tag
    }

    /// The duration recorded by the last [`end_session`](Self::end_session)
    /// call, if any.
    #[must_use]
    pub fn last_session_duration(&self) -> Option<u64> {
        self.session_store
            .get(SESSION_DURATION_KEY)
            .and_then(|v| v.parse().ok())
    }

    fn persist(&mut self) {
        self.state.last_updated = Utc::now();
        if let Err(e) = self.store.write_json(STATE_KEY, &self.state) {
            warn!(error = %e, "Failed to persist analytics state");
        }
    }

    #[cfg(test)]
    pub(crate) fn tag_mut(&mut self) -> &mut TagPipeline {
        &mut self.tag
    }
}

/// Reads the visitor id from the store, generating and persisting one if
/// absent.
fn get_or_create_visitor_id<S: Storage>(store: &mut S) -> std::result::Result<String, StorageError> {
    if let Some(id) = store.get(VISITOR_ID_KEY) {
        if !id.is_empty() {
            return Ok(id);
        }
    }

    let id = generate_visitor_id();
    store.set(VISITOR_ID_KEY, &id)?;
    info!("Generated new visitor id");
    Ok(id)
}

/// Calendar-day key in `Date.toDateString()` format, e.g.
/// `"Mon Jan 01 2024"` — the format already present in stored visitor
/// timestamps from earlier releases.
#[must_use]
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%a %b %d %Y").to_string()
}
