//! Presence notifications layered on the addressing scheme.
//!
//! On connect the new agent receives `@whoami` with its own id as the only
//! field. On disconnect every remaining agent receives `#disconnected` with
//! the departed id. Neither sender is a live service; both are plain sender
//! labels.

use crate::hooks::{HubHooks, SendFailure};
use crate::hub::HubCore;
use msghub_types::{Id, Message};
use tracing::debug;

/// Sender label of the identity announcement.
pub const WHOAMI: &str = "@whoami";
/// Sender label of the departure broadcast.
pub const DISCONNECTED: &str = "#disconnected";

/// Hooks that announce identities and departures.
#[derive(Debug, Default, Clone, Copy)]
pub struct PresenceHooks;

impl<U: Default + Send + 'static> HubHooks<U> for PresenceHooks {
    fn on_connect(&self, hub: &mut HubCore<U>, id: &Id) {
        hub.send(Message::new(WHOAMI, id.clone(), [id.to_string()]));
    }

    fn on_disconnect(&self, hub: &mut HubCore<U>, id: &Id) {
        for to in hub.agent_ids() {
            hub.send(Message::new(DISCONNECTED, to, [id.to_string()]));
        }
    }

    fn on_send_failure(&self, _hub: &mut HubCore<U>, msg: &Message, reason: SendFailure) {
        debug!(from = %msg.from, to = %msg.to, %reason, "Dropped message");
    }
}
