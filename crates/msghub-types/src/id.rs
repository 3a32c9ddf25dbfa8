//! Identifiers for agents and services.
//!
//! An identifier is an opaque string. Identifiers that begin with
//! [`SERVICE_PREFIX`] name server-resident services; every other identifier
//! names a connected agent. There is no escaping: an agent id that happens to
//! start with the prefix routes to the service namespace.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Leading character that marks an identifier as a service address.
pub const SERVICE_PREFIX: char = '@';

/// Opaque agent or service identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Wrap a string as an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The empty identifier, used as `From` on client-originated messages.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Whether this identifier addresses a service.
    pub fn is_service(&self) -> bool {
        self.0.starts_with(SERVICE_PREFIX)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for Id {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_prefix() {
        assert!(Id::from("@echo").is_service());
        assert!(Id::from("@").is_service());
        assert!(!Id::from("42").is_service());
        assert!(!Id::from("").is_service());
        assert!(!Id::from("echo@host").is_service());
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(Id::from("7"), "seven");
        assert_eq!(map.get("7"), Some(&"seven"));
    }

    #[test]
    fn test_display_roundtrip() {
        let id = Id::new("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id, "abc");
    }
}
