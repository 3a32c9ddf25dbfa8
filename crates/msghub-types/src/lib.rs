//! Core types for the msghub relay.
//!
//! Everything here is transport- and runtime-agnostic: identifiers, the
//! message envelope, the unit-separator wire codec, configuration and the
//! shared error type.

pub mod codec;
pub mod config;
pub mod error;
pub mod id;
pub mod message;

pub use codec::{decode, encode, SEPARATOR};
pub use config::{load_config, ClientConfig, HubConfig, MsghubConfig, OverflowPolicy};
pub use error::{HubError, HubResult, TransportError};
pub use id::{Id, SERVICE_PREFIX};
pub use message::Message;
