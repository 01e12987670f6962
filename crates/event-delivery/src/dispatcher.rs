//! Sequential dispatcher draining the pending queue through a poster.

use crate::{now_millis, DeliveryJob, EventPoster, EventQueue, PostOutcome};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a job left the queue without being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The job failed transiently on every allowed cycle.
    AttemptsExhausted,
    /// The queue was at capacity when the job reached the head.
    QueueFull,
    /// Nothing to send.
    EmptyPayload,
    /// The event outlived its validity window.
    Expired,
    /// The collector kept redirecting past the redirect budget.
    RedirectsExhausted,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttemptsExhausted => "attempts_exhausted",
            Self::QueueFull => "queue_full",
            Self::EmptyPayload => "empty_payload",
            Self::Expired => "expired",
            Self::RedirectsExhausted => "redirects_exhausted",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened during one drain cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Jobs whose post completed (success or permanent failure).
    pub delivered: usize,
    /// Jobs discarded without completing a post.
    pub dropped: usize,
    /// Whether the cycle stopped on a transient failure.
    pub halted: bool,
    /// Queue length when the cycle ended.
    pub remaining: usize,
}

enum JobFate {
    Delivered,
    Dropped,
    Deferred,
}

/// Single consumer of an [`EventQueue`].
///
/// Each activation appends the incoming job, if any, then posts jobs from the
/// head one at a time. A transient failure puts the job back at the head and
/// ends the cycle, so no job is sent while an older one is waiting to retry.
pub struct Dispatcher<P> {
    queue: Arc<EventQueue>,
    poster: P,
}

impl<P: EventPoster> Dispatcher<P> {
    pub fn new(queue: Arc<EventQueue>, poster: P) -> Self {
        Self { queue, poster }
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn poster(&self) -> &P {
        &self.poster
    }

    /// Run one activation.
    pub async fn handle(&mut self, incoming: Option<DeliveryJob>) -> DrainSummary {
        if let Some(job) = incoming {
            self.queue.append(job);
        }
        self.drain().await
    }

    /// Post queued jobs until the queue is empty or a job must wait.
    pub async fn drain(&mut self) -> DrainSummary {
        let mut summary = DrainSummary::default();

        while let Some(job) = self.queue.remove_head() {
            match self.dispatch(job).await {
                JobFate::Delivered => summary.delivered += 1,
                JobFate::Dropped => summary.dropped += 1,
                JobFate::Deferred => {
                    summary.halted = true;
                    break;
                }
            }
        }

        summary.remaining = self.queue.len();
        debug!(
            delivered = summary.delivered,
            dropped = summary.dropped,
            halted = summary.halted,
            remaining = summary.remaining,
            "Drain cycle finished"
        );
        summary
    }

    async fn dispatch(&mut self, mut job: DeliveryJob) -> JobFate {
        let policy = self.poster.send_policy();

        if !policy.can_attempt(job.attempts()) {
            return drop_job(&job, DropReason::AttemptsExhausted);
        }

        // measured after the pop: at capacity, the job in hand is sacrificed
        if policy.is_queue_full(self.queue.len()) {
            return drop_job(&job, DropReason::QueueFull);
        }

        if job.payload().is_empty() {
            return drop_job(&job, DropReason::EmptyPayload);
        }

        let mut redirects = 0;
        while policy.can_follow_redirect(redirects) {
            if policy.is_expired(job.enqueued_at(), now_millis()) {
                return drop_job(&job, DropReason::Expired);
            }

            match self.poster.post(job.payload()).await {
                PostOutcome::Delivered => {
                    debug!(attempts = job.attempts(), redirects, "Event delivered");
                    return JobFate::Delivered;
                }
                PostOutcome::RetryLater => {
                    job.record_failed_attempt();
                    warn!(
                        attempts = job.attempts(),
                        queued = self.queue.len(),
                        "Event deferred, halting drain until next activation"
                    );
                    self.queue.reinsert_at_head(job);
                    return JobFate::Deferred;
                }
                PostOutcome::Redirected => {
                    redirects += 1;
                    debug!(redirects, "Retrying event after redirect");
                }
            }
        }

        drop_job(&job, DropReason::RedirectsExhausted)
    }
}

fn drop_job(job: &DeliveryJob, reason: DropReason) -> JobFate {
    warn!(
        reason = %reason,
        attempts = job.attempts(),
        enqueued_at = job.enqueued_at(),
        "Dropping event"
    );
    JobFate::Dropped
}
