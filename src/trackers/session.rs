//! Session duration timing.
//!
//! A session spans from tracker construction to page unload. Delivery of
//! the final duration is best-effort by nature — an unload handler can be
//! killed before its work completes — so the timer itself carries no
//! persistence; the tracker stores the duration where it can on unload.

use std::time::Instant;

use uuid::Uuid;

/// Wall-clock timer for the current session.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    session_id: Uuid,
    started_at: Instant,
}

impl SessionTimer {
    /// Starts timing a new session with a fresh session id.
    #[must_use]
    pub fn start() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Instant::now(),
        }
    }

    /// The id of this session.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Elapsed session time, rounded to whole seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs_f64().round() as u64
    }
}
