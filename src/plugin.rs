//! Broker adapter for the inspector.
//!
//! Negotiates the hook API version, registers the inspector as a message
//! hook on start-up and removes it on shutdown. Everything interesting
//! happens in [`crate::inspector`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::broker::Broker;
use crate::broker::hooks::{HookId, HookStatus, MessageEvent, MessageHook};
use crate::config::InspectorSettings;
use crate::inspector::{self, Inspector};
use crate::utils::error::PluginError;

/// Hook API version this plugin is written against.
pub const PLUGIN_API_VERSION: i32 = 5;

/// Picks the plugin's API version from those the broker supports.
pub fn negotiate_version(supported: &[i32]) -> Option<i32> {
    supported
        .contains(&PLUGIN_API_VERSION)
        .then_some(PLUGIN_API_VERSION)
}

/// Message hook running every publish through an [`Inspector`].
#[derive(Debug, Clone)]
pub struct InspectionHook {
    inspector: Arc<Inspector>,
}

impl InspectionHook {
    pub fn new(inspector: Arc<Inspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl MessageHook for InspectionHook {
    async fn on_message(&self, event: &mut MessageEvent) -> HookStatus {
        let decision = self.inspector.inspect(event).await;
        inspector::apply(decision, event)
    }
}

/// A registered inspector plugin.
#[derive(Debug)]
pub struct InspectorPlugin {
    hook_id: HookId,
    inspector: Arc<Inspector>,
}

impl InspectorPlugin {
    /// Registers the inspection hook on `broker`.
    pub fn init(broker: &mut Broker, settings: &InspectorSettings) -> Result<Self, PluginError> {
        let offered = Broker::supported_hook_versions();
        if negotiate_version(offered).is_none() {
            return Err(PluginError::UnsupportedVersion {
                offered: offered.to_vec(),
                required: PLUGIN_API_VERSION,
            });
        }

        let inspector = Arc::new(Inspector::from_settings(settings));
        let hook_id = broker.register_hook(Arc::new(InspectionHook::new(inspector.clone())));
        info!(
            hook_id,
            host = %settings.host,
            port = settings.port,
            timeout_ms = settings.timeout,
            policy = ?settings.policy,
            "inspector plugin registered"
        );

        Ok(Self { hook_id, inspector })
    }

    pub fn inspector(&self) -> &Arc<Inspector> {
        &self.inspector
    }

    /// Removes the hook. Inspections already running hold their own
    /// reference and finish within their timeout.
    pub fn cleanup(self, broker: &mut Broker) -> bool {
        let removed = broker.unregister_hook(self.hook_id);
        info!(hook_id = self.hook_id, removed, "inspector plugin unregistered");
        removed
    }
}
