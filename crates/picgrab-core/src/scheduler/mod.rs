//! Grab-run scheduler.
//!
//! Drives one run end to end: fetch pages → extract candidates → resolve
//! variants → deduplicated concurrent download. Blocking libcurl work runs on
//! tokio's blocking pool; the consumer sees only [`RunEvent`]s.

mod events;
mod run;

pub use events::{EventSink, RunEvent};
pub use run::{collect_candidates, run_grab, GrabRequest};
