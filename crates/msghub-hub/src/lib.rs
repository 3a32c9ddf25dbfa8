//! msghub: A relay hub for addressed text messages.
//!
//! Connected peers ("agents") and server-resident handlers ("services")
//! exchange messages through a central [`Hub`]. All registry mutation and
//! routing runs as commands on a single executor task, so the agent and
//! service maps need no locks.
//!
//! ## Architecture
//!
//! - **Hub**: cloneable handle submitting commands to the executor
//! - **HubCore**: the registries, only ever touched by the executor
//! - **OutboundQueue**: bounded per-agent queue shared with that agent's writer
//! - **Connection pair**: reader and writer tasks bridging a transport to the hub
//! - **Client**: the minimal peer used by non-server participants

pub mod agent;
pub mod client;
pub mod connection;
pub mod hooks;
pub mod hub;
pub mod memory;
pub mod presence;
pub mod queue;
pub mod server;
pub mod service;
pub mod transport;

pub use agent::{Agent, Registration};
pub use client::Client;
pub use connection::serve_connection;
pub use hooks::{CounterIdGenerator, HubHooks, IdGenerator, NoopHooks, SendFailure};
pub use hub::{Hub, HubBuilder, HubCore};
pub use presence::PresenceHooks;
pub use queue::{EnqueueError, OutboundQueue};
pub use service::{service_fn, EchoService, Service, WhoAmIService};
pub use transport::{ConnectionGuard, FrameReader, FrameWriter};

pub use msghub_types::{
    decode, encode, ClientConfig, HubConfig, HubError, HubResult, Id, Message, OverflowPolicy,
    TransportError,
};
