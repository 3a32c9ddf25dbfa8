//! Server-resident message handlers.
//!
//! Services are addressed by identifiers carrying the service prefix and run
//! synchronously on the executor, so a handler must not block.

use crate::hub::HubCore;
use msghub_types::Message;

/// A handler for messages addressed to a service identifier.
pub trait Service<U = ()>: Send + Sync + 'static {
    fn handle(&self, hub: &mut HubCore<U>, msg: Message);
}

/// Adapter turning a closure into a [`Service`].
pub struct FnService<F>(F);

/// Wrap a closure as a service.
pub fn service_fn<U, F>(f: F) -> FnService<F>
where
    F: Fn(&mut HubCore<U>, Message) + Send + Sync + 'static,
{
    FnService(f)
}

impl<U, F> Service<U> for FnService<F>
where
    F: Fn(&mut HubCore<U>, Message) + Send + Sync + 'static,
{
    fn handle(&self, hub: &mut HubCore<U>, msg: Message) {
        (self.0)(hub, msg)
    }
}

/// Sends every message back to its sender, signed with the service id.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoService;

impl<U: Default + Send + 'static> Service<U> for EchoService {
    fn handle(&self, hub: &mut HubCore<U>, msg: Message) {
        hub.send(Message {
            from: msg.to,
            to: msg.from,
            data: msg.data,
        });
    }
}

/// Answers the sender with its own identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhoAmIService;

impl<U: Default + Send + 'static> Service<U> for WhoAmIService {
    fn handle(&self, hub: &mut HubCore<U>, msg: Message) {
        let data = vec![msg.from.to_string()];
        hub.send(Message {
            from: msg.to,
            to: msg.from,
            data,
        });
    }
}
