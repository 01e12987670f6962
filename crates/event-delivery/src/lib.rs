//! Reliable, in-order delivery of telemetry event payloads.
//!
//! This crate provides:
//! - EventQueue: internally synchronized FIFO of pending delivery jobs
//! - SendPolicy: retry, expiry, capacity and redirect limits
//! - EventPoster / HttpEventPoster: one HTTP POST per payload, outcome classified
//! - Dispatcher: sequential consumer draining the queue through a poster
//! - EventSenderService / EventSender: background worker and producer handle

mod dispatcher;
mod error;
mod policy;
mod poster;
mod queue;
mod service;

#[cfg(test)]
mod test_support;

pub use dispatcher::{Dispatcher, DrainSummary, DropReason};
pub use error::{DeliveryError, DeliveryResult};
pub use policy::SendPolicy;
pub use poster::{
    EventPoster, HttpEventPoster, PostOutcome, PosterConfig, APPLICATION_ERROR_MARKER,
};
pub use queue::{now_millis, DeliveryJob, EventQueue};
pub use service::{Activation, EventSender, EventSenderService};
