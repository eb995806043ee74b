use crate::broker::hooks::{HookStatus, MessageEvent};

/// Outcome of inspecting one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Block(String),
    Rewrite(Vec<u8>),
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allowed",
            Decision::Block(_) => "blocked",
            Decision::Rewrite(_) => "rewritten",
        }
    }
}

/// Applies `decision` to the in-flight publish.
///
/// Only `Rewrite` touches the event, and only its payload: the replacement is
/// moved into the event, which the broker owns from here on.
pub fn apply(decision: Decision, event: &mut MessageEvent) -> HookStatus {
    match decision {
        Decision::Allow => HookStatus::Continue,
        Decision::Block(_) => HookStatus::Suppress,
        Decision::Rewrite(payload) => {
            event.payload = payload;
            HookStatus::Continue
        }
    }
}
