//! Scripted poster for dispatcher and service tests.

use crate::{EventPoster, PostOutcome, SendPolicy};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

type Responder = Box<dyn Fn(&str) -> PostOutcome + Send>;

/// Records every posted payload and answers from a closure.
pub(crate) struct ScriptedPoster {
    policy: SendPolicy,
    respond: Responder,
    posted: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPoster {
    pub(crate) fn always(policy: SendPolicy, outcome: PostOutcome) -> Self {
        Self::with(policy, move |_| outcome)
    }

    pub(crate) fn with(
        policy: SendPolicy,
        respond: impl Fn(&str) -> PostOutcome + Send + 'static,
    ) -> Self {
        Self {
            policy,
            respond: Box::new(respond),
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared view of the payloads posted so far.
    pub(crate) fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.posted.clone()
    }
}

#[async_trait]
impl EventPoster for ScriptedPoster {
    fn send_policy(&self) -> SendPolicy {
        self.policy
    }

    async fn post(&mut self, payload: &str) -> PostOutcome {
        self.posted.lock().push(payload.to_string());
        (self.respond)(payload)
    }
}
