//! Background delivery service.
//!
//! Producers hold cheap [`EventSender`] handles and hand activations to a
//! single worker task over a bounded channel. The worker owns the
//! [`Dispatcher`], so drain cycles never overlap.

use crate::{
    now_millis, DeliveryJob, DeliveryResult, Dispatcher, EventPoster, EventQueue, HttpEventPoster,
    PosterConfig,
};
use delivery_config_and_utils::Config;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// One wake-up of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Queue this job, then drain.
    Deliver(DeliveryJob),
    /// Drain whatever is already queued.
    Wake,
}

/// Cloneable producer handle. Never blocks and never reports delivery failures.
///
/// Activations travel over a bounded channel sized by `channel_capacity`.
/// When the worker falls that far behind, the newest activation is logged
/// and dropped before it reaches the [`EventQueue`]; queue-size limits of the
/// [`SendPolicy`](crate::SendPolicy) apply only to jobs that got through.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Activation>,
}

impl EventSender {
    /// Hand a finalized event payload to the dispatcher.
    ///
    /// `enqueued_at` is the event creation time in epoch millis; expiry is
    /// measured from it.
    pub fn enqueue_for_delivery(&self, payload: impl Into<String>, enqueued_at: i64) {
        self.activate(Activation::Deliver(DeliveryJob::new(payload, enqueued_at)));
    }

    /// Same as [`enqueue_for_delivery`](Self::enqueue_for_delivery), stamped with the current time.
    pub fn enqueue_now(&self, payload: impl Into<String>) {
        self.enqueue_for_delivery(payload, now_millis());
    }

    /// Ask the dispatcher to retry queued jobs without adding a new one.
    pub fn wake(&self) {
        self.activate(Activation::Wake);
    }

    fn activate(&self, activation: Activation) {
        match self.sender.try_send(activation) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Dispatcher backlog full, dropping activation");
            }
            Err(TrySendError::Closed(_)) => {
                error!("Dispatcher is not running, dropping activation");
            }
        }
    }
}

/// Worker task owning a dispatcher.
pub struct EventSenderService<P> {
    sender: EventSender,
    worker: JoinHandle<Dispatcher<P>>,
}

impl EventSenderService<HttpEventPoster> {
    /// Build the HTTP poster, a fresh queue and start the worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> DeliveryResult<Self> {
        config.validate()?;
        let poster = HttpEventPoster::new(PosterConfig::from_config(config)?)?;
        let dispatcher = Dispatcher::new(Arc::new(EventQueue::new()), poster);
        Ok(Self::start(dispatcher, config.channel_capacity))
    }
}

impl<P: EventPoster + 'static> EventSenderService<P> {
    /// Spawn the worker loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(dispatcher: Dispatcher<P>, channel_capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel(channel_capacity.max(1));
        let mut dispatcher = dispatcher;

        let worker = tokio::spawn(async move {
            info!("Event dispatcher started");

            while let Some(activation) = receiver.recv().await {
                let incoming = match activation {
                    Activation::Deliver(job) => Some(job),
                    Activation::Wake => None,
                };
                let summary = dispatcher.handle(incoming).await;
                debug!(
                    delivered = summary.delivered,
                    dropped = summary.dropped,
                    remaining = summary.remaining,
                    "Activation handled"
                );
            }

            info!(
                remaining = dispatcher.queue().len(),
                "Event dispatcher stopped"
            );
            dispatcher
        });

        Self {
            sender: EventSender { sender },
            worker,
        }
    }

    /// A new producer handle.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Stop accepting activations and wait for the worker to finish.
    ///
    /// Completes once every outstanding [`EventSender`] clone has been dropped
    /// and queued activations are handled. Returns the dispatcher so callers
    /// can inspect what is still queued.
    pub async fn shutdown(self) -> DeliveryResult<Dispatcher<P>> {
        drop(self.sender);
        Ok(self.worker.await?)
    }
}
