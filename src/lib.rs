//! folio-analytics - visitor analytics for a static portfolio site.
//!
//! This crate provides a lightweight tracker that records page views,
//! unique visitors, section engagement, referrer sources, and interaction
//! events (email clicks, resume downloads, social clicks), persisting them
//! to a local key-value store and optionally forwarding events to a
//! third-party tag manager.
//!
//! # Overview
//!
//! The tracker has no document-tree access of its own. The embedding host
//! describes the page and its interactions through the types in [`page`],
//! and the [`tracker::Tracker`] — constructed explicitly by the
//! composition root, never installed globally — classifies those inputs,
//! updates counters, and persists after every mutation. Tag forwarding is
//! gated by a remote feature-flag config fetched once at startup.
//!
//! # Failure policy
//!
//! Tracking failures never propagate to the host: malformed stored data
//! falls back to defaults, network failures leave forwarding disabled, and
//! storage write failures are logged and absorbed.
//!
//! # Modules
//!
//! - [`types`]: event kinds and payloads, visitor-id generation
//! - [`page`]: the host/page contract (context, clicks, JSONL events, display)
//! - [`storage`]: key-value stores and the defaulted-read accessor
//! - [`state`]: versioned counter state and legacy-schema migration
//! - [`config`]: environment configuration and the remote feature-flag config
//! - [`tag`]: the tag-forwarding pipeline
//! - [`trackers`]: interaction, referrer, section, and session trackers
//! - [`tracker`]: the tracker itself
//! - [`error`]: error types for construction-time failures

pub mod config;
pub mod error;
pub mod page;
pub mod state;
pub mod storage;
pub mod tag;
pub mod tracker;
pub mod trackers;
pub mod types;

pub use config::{RemoteConfig, TrackerConfig};
pub use error::{Result, TrackerError};
pub use page::{ClickTarget, CounterDisplay, PageContext, PageEvent, Region};
pub use state::{AnalyticsSnapshot, AnalyticsState, LegacyClicks, LegacyViews};
pub use storage::{JsonFileStore, MemoryStore, Storage, StorageError};
pub use tag::{TagCommand, TagPipeline};
pub use tracker::Tracker;
pub use types::{EventKind, EventPayload};
