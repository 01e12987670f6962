//! Send policy: the limits every delivery decision is checked against.

use delivery_config_and_utils::PolicyConfig;

/// Retry, expiry, capacity and redirect limits.
///
/// Pure predicates only. A policy is owned by each poster and re-read by the
/// dispatcher for every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendPolicy {
    max_queue_size: usize,
    validity_duration_ms: u64,
    max_attempts: u32,
    max_redirect_attempts: u32,
}

impl SendPolicy {
    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 15;
    pub const DEFAULT_VALIDITY_DURATION_MS: u64 = 3_600_000;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_MAX_REDIRECT_ATTEMPTS: u32 = 3;

    pub fn new(
        max_queue_size: usize,
        validity_duration_ms: u64,
        max_attempts: u32,
        max_redirect_attempts: u32,
    ) -> Self {
        Self {
            max_queue_size,
            validity_duration_ms,
            max_attempts,
            max_redirect_attempts,
        }
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    pub fn validity_duration_ms(&self) -> u64 {
        self.validity_duration_ms
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_redirect_attempts(&self) -> u32 {
        self.max_redirect_attempts
    }

    /// Whether a queue holding `current_size` jobs is at capacity.
    pub fn is_queue_full(&self, current_size: usize) -> bool {
        current_size >= self.max_queue_size
    }

    /// Whether an event created at `enqueued_at` is stale at `now` (epoch millis).
    ///
    /// Events stamped in the future are never expired.
    pub fn is_expired(&self, enqueued_at: i64, now: i64) -> bool {
        let age = now.saturating_sub(enqueued_at);
        age > 0 && age.unsigned_abs() > self.validity_duration_ms
    }

    /// Whether a job that already failed `attempts` cycles may be tried again.
    pub fn can_attempt(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Whether another redirect may be followed after `redirect_count` of them.
    pub fn can_follow_redirect(&self, redirect_count: u32) -> bool {
        redirect_count < self.max_redirect_attempts
    }
}

impl Default for SendPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_QUEUE_SIZE,
            Self::DEFAULT_VALIDITY_DURATION_MS,
            Self::DEFAULT_MAX_ATTEMPTS,
            Self::DEFAULT_MAX_REDIRECT_ATTEMPTS,
        )
    }
}

impl From<&PolicyConfig> for SendPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self::new(
            config.max_queue_size,
            config.validity_duration_ms,
            config.max_attempts,
            config.max_redirect_attempts,
        )
    }
}
