//! Event-capture trackers.
//!
//! Each tracker covers one capture concern and stays free of storage and
//! forwarding; the [`Tracker`](crate::tracker::Tracker) wires their results
//! into counters and events.
//!
//! - [`interaction`]: click classification into interaction categories
//! - [`referrer`]: traffic-source classification at page load
//! - [`section`]: section visibility threshold detection
//! - [`session`]: session duration timing

pub mod interaction;
pub mod referrer;
pub mod section;
pub mod session;

pub use interaction::Interaction;
pub use referrer::ReferrerSource;
pub use section::SectionObserver;
pub use session::SessionTimer;
