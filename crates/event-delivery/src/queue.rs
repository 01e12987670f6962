//! Pending queue for event delivery.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One event payload awaiting transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryJob {
    payload: String,
    /// Creation time of the event, epoch millis.
    enqueued_at: i64,
    /// Delivery cycles that ended in a transient failure.
    attempts: u32,
}

impl DeliveryJob {
    /// Create a fresh job with no failed attempts.
    pub fn new(payload: impl Into<String>, enqueued_at: i64) -> Self {
        Self {
            payload: payload.into(),
            enqueued_at,
            attempts: 0,
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn enqueued_at(&self) -> i64 {
        self.enqueued_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn record_failed_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }
}

/// Double-ended FIFO of pending jobs, guarded by a single mutex.
///
/// Appends are unconditional; the capacity bound is enforced by the
/// dispatcher through its send policy.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Mutex<VecDeque<DeliveryJob>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job at the tail.
    pub fn append(&self, job: DeliveryJob) {
        self.pending.lock().push_back(job);
    }

    /// Remove and return the oldest job.
    pub fn remove_head(&self) -> Option<DeliveryJob> {
        self.pending.lock().pop_front()
    }

    /// Put a job back in front of every queued job.
    pub fn reinsert_at_head(&self, job: DeliveryJob) {
        self.pending.lock().push_front(job);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Drop every pending job. Reset hook for tests and harnesses.
    pub fn clear(&self) {
        self.pending.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn job(payload: &str) -> DeliveryJob {
        DeliveryJob::new(payload, now_millis())
    }

    #[test]
    fn test_new_job_has_no_attempts() {
        let job = DeliveryJob::new("payload_1", 42);
        assert_eq!(job.payload(), "payload_1");
        assert_eq!(job.enqueued_at(), 42);
        assert_eq!(job.attempts(), 0);
    }

    #[test]
    fn test_record_failed_attempt() {
        let mut job = job("payload_1");
        job.record_failed_attempt();
        job.record_failed_attempt();
        assert_eq!(job.attempts(), 2);
    }

    #[test]
    fn test_fifo_order() {
        let queue = EventQueue::new();
        queue.append(job("payload_1"));
        queue.append(job("payload_2"));
        queue.append(job("payload_3"));
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.remove_head().unwrap().payload(), "payload_1");
        assert_eq!(queue.remove_head().unwrap().payload(), "payload_2");
        assert_eq!(queue.remove_head().unwrap().payload(), "payload_3");
        assert!(queue.remove_head().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reinsert_at_head_becomes_oldest() {
        let queue = EventQueue::new();
        queue.append(job("payload_1"));
        queue.append(job("payload_2"));

        let head = queue.remove_head().unwrap();
        queue.append(job("payload_3"));
        queue.reinsert_at_head(head);

        let order: Vec<String> = std::iter::from_fn(|| queue.remove_head())
            .map(|j| j.payload().to_string())
            .collect();
        assert_eq!(order, vec!["payload_1", "payload_2", "payload_3"]);
    }

    #[test]
    fn test_clear() {
        let queue = EventQueue::new();
        queue.append(job("payload_1"));
        queue.append(job("payload_2"));
        queue.clear();
        assert_eq!(queue.len(), 0);
        assert!(queue.remove_head().is_none());
    }

    #[test]
    fn test_concurrent_appends() {
        let queue = Arc::new(EventQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        queue.append(job(&format!("producer-{}-{}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 800);
    }
}
