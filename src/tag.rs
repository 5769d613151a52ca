//! Third-party tag forwarding pipeline.
//!
//! Models the tag manager integration: a script loaded once from a fixed
//! origin parameterized by the measurement id, and a command queue that
//! accepts `js` / `config` / `event` commands once the script is in place.
//!
//! # Design
//!
//! - **Best-effort**: loading the tag script is an enhancement, never a
//!   requirement. [`TagPipeline::load`] resolves whether the fetch succeeds
//!   or fails; on failure the pipeline simply stays disabled.
//! - **Idempotent load**: a measurement id that has already been through
//!   [`TagPipeline::load`] is not loaded again — one script element per id,
//!   as the tag manager expects.
//! - **Bounded queue**: commands are held in a FIFO queue with the oldest
//!   evicted at capacity, so an abandoned page cannot grow memory without
//!   bound.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_TAG_ORIGIN;

/// HTTP request timeout for the script fetch.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default command queue capacity.
const DEFAULT_QUEUE_SIZE: usize = 1000;

/// A command accepted by the tag pipeline once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum TagCommand {
    /// Bootstrap timestamp command.
    Js { timestamp: DateTime<Utc> },
    /// Measurement configuration command.
    Config { measurement_id: String },
    /// A tracked event with its parameters.
    Event { name: String, params: Value },
}

/// The tag forwarding pipeline.
///
/// Starts disabled; [`load`](Self::load) with a measurement id from an
/// enabled remote config is the only way to activate it.
pub struct TagPipeline {
    client: Client,
    script_origin: String,
    queue_size: usize,
    /// Measurement ids a script load was attempted for, successful or not.
    loaded: HashSet<String>,
    measurement_id: Option<String>,
    enabled: bool,
    queue: VecDeque<TagCommand>,
}

impl TagPipeline {
    /// Creates a disabled pipeline targeting `script_origin`.
    #[must_use]
    pub fn new(script_origin: String, queue_size: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            script_origin,
            queue_size,
            loaded: HashSet::new(),
            measurement_id: None,
            enabled: false,
            queue: VecDeque::new(),
        }
    }

    /// Creates a disabled pipeline with the default origin and queue size.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TAG_ORIGIN.to_string(), DEFAULT_QUEUE_SIZE)
    }

    /// Loads the tag script for `measurement_id`.
    ///
    /// Idempotent per id: a repeated call is a no-op, even if the first
    /// attempt failed — the script element stays in the document either
    /// way. On success the pipeline becomes enabled and
    /// the `js` and `config` bootstrap commands are queued. On failure the
    /// call still returns normally and the pipeline stays disabled.
    pub async fn load(&mut self, measurement_id: &str) {
        if measurement_id.is_empty() {
            return;
        }
        if !self.loaded.insert(measurement_id.to_string()) {
            debug!(measurement_id, "Tag script already loaded, skipping");
            return;
        }

        let result = self
            .client
            .get(&self.script_origin)
            .query(&[("id", measurement_id)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                self.push(TagCommand::Js {
                    timestamp: Utc::now(),
                });
                self.push(TagCommand::Config {
                    measurement_id: measurement_id.to_string(),
                });
                self.measurement_id = Some(measurement_id.to_string());
                self.enabled = true;
                info!(measurement_id, "Tag script loaded, forwarding enabled");
            }
            Ok(response) => {
                warn!(
                    measurement_id,
                    status = response.status().as_u16(),
                    "Tag script fetch failed, forwarding stays off"
                );
            }
            Err(e) => {
                warn!(
                    measurement_id,
                    error = %e,
                    "Tag script fetch failed, forwarding stays off"
                );
            }
        }
    }

    /// Queues an `event` command if forwarding is enabled.
    ///
    /// Returns `true` if the event was queued, `false` if forwarding is
    /// off and the event was dropped.
    pub fn push_event(&mut self, name: &str, params: Value) -> bool {
        if !self.enabled {
            debug!(event = name, "Forwarding disabled, dropping event");
            return false;
        }

        self.push(TagCommand::Event {
            name: name.to_string(),
            params,
        });
        true
    }

    fn push(&mut self, command: TagCommand) {
        while self.queue.len() >= self.queue_size {
            self.queue.pop_front();
        }
        self.queue.push_back(command);
    }

    /// Returns `true` if forwarding is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The measurement id forwarding was enabled with, if any.
    #[must_use]
    pub fn measurement_id(&self) -> Option<&str> {
        self.measurement_id.as_deref()
    }

    /// Queued commands, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = &TagCommand> {
        self.queue.iter()
    }

    /// Number of queued commands.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Enables forwarding without a script fetch. Test-only.
    #[cfg(test)]
    pub(crate) fn enable_for_tests(&mut self, measurement_id: &str) {
        self.measurement_id = Some(measurement_id.to_string());
        self.enabled = true;
    }
}
