use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use super::client::InspectorClient;
use super::decision::Decision;
use super::message::{self, InspectionRequest, InspectionResponse};
use crate::broker::hooks::MessageEvent;
use crate::config::{FailurePolicy, InspectorSettings};
use crate::utils::error::InspectError;

/// Reason attached to publishes dropped by the fail-closed policy.
pub const UNAVAILABLE_REASON: &str = "inspector unavailable";

/// Asks the inspector service about every publish and turns its answer,
/// or its absence, into a [`Decision`].
#[derive(Debug)]
pub struct Inspector {
    client: InspectorClient,
    policy: FailurePolicy,
    // diagnostics only; never consulted for a decision
    calls: AtomicU64,
}

impl Inspector {
    pub fn new(client: InspectorClient, policy: FailurePolicy) -> Self {
        Self {
            client,
            policy,
            calls: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &InspectorSettings) -> Self {
        let client = InspectorClient::new(
            settings.host.clone(),
            settings.port,
            settings.timeout_duration(),
        );
        Self::new(client, settings.policy)
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Number of inspections started so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Inspects one publish. Never fails: inspector errors resolve through
    /// the failure policy.
    pub async fn inspect(&self, event: &MessageEvent) -> Decision {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if call < 9 || call % 10 == 0 {
            info!(call, topic = %event.topic, client = %event.client.id, "inspecting publish");
        } else {
            debug!(call, topic = %event.topic, client = %event.client.id, "inspecting publish");
        }

        match self.try_inspect(event).await {
            Ok(decision) => {
                match &decision {
                    Decision::Block(reason) => {
                        info!(topic = %event.topic, client = %event.client.id, %reason, "publish blocked")
                    }
                    other => {
                        debug!(topic = %event.topic, outcome = other.label(), "publish inspected")
                    }
                }
                decision
            }
            Err(e) => {
                let decision = match self.policy {
                    FailurePolicy::FailOpen => Decision::Allow,
                    FailurePolicy::FailClosed => Decision::Block(UNAVAILABLE_REASON.to_string()),
                };
                warn!(
                    topic = %event.topic,
                    cause = e.kind(),
                    error = %e,
                    outcome = decision.label(),
                    "inspection failed"
                );
                decision
            }
        }
    }

    /// Inspects one publish and reports any failure instead of applying the
    /// failure policy.
    pub async fn try_inspect(&self, event: &MessageEvent) -> Result<Decision, InspectError> {
        let request = build_request(event, chrono::Utc::now().timestamp());
        let encoded = message::encode_request(&request).map_err(InspectError::Encoding)?;
        let raw = self.client.call(&encoded).await?;
        let response = message::decode_response(&raw).map_err(InspectError::Decoding)?;
        Ok(decide(response))
    }
}

/// Fills every request field from the publish; absent identity becomes "".
pub fn build_request(event: &MessageEvent, timestamp: i64) -> InspectionRequest {
    InspectionRequest {
        topic: event.topic.clone(),
        payload: event.payload.clone(),
        username: event.client.username.clone().unwrap_or_default(),
        client_id: event.client.id.clone(),
        ip_address: event
            .client
            .address
            .map(|ip| ip.to_string())
            .unwrap_or_default(),
        timestamp,
    }
}

/// Maps a decoded response to a decision. Blocking wins over rewriting; an
/// empty replacement payload counts as no replacement.
pub fn decide(response: InspectionResponse) -> Decision {
    if response.should_block {
        return Decision::Block(response.block_reason);
    }
    match response.payload {
        Some(payload) if !payload.is_empty() => Decision::Rewrite(payload),
        _ => Decision::Allow,
    }
}
