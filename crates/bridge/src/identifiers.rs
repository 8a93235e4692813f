//! Newtype bridge identifiers.
//!
//! Every concept that has an identity is represented as a distinct newtype
//! wrapping a primitive, so a [`CallId`] can never be confused with some other
//! integer that happens to travel in the same envelope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Call identifiers
// ---------------------------------------------------------------------------

/// Identifies one call sent through a [`crate::Transport`].
///
/// Allocated by pre-incrementing a per-transport counter, so the first call of
/// every transport is `1` and identifiers are never reused while the
/// transport lives. Serialises as a bare integer (`"callId": 7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(u64);

impl CallId {
    /// Creates a call identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// Identifies a single [`crate::Transport`] instance.
///
/// Generated fresh for every transport and recorded on its log events so
/// activity from independent transports living in the same process can be
/// told apart. Never sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportId(Uuid);

impl TransportId {
    /// Generates a new random transport identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TransportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-backed identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// A method name as it appears on the wire (e.g. `"app.social.getFeeds"`).
    ///
    /// Namespaces build these by joining their prefix and the bare operation
    /// name with `.`; the transport itself never inspects the structure.
    MethodName
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_method_name_is_rejected() {
        assert!(MethodName::new("").is_none());
        assert_eq!(MethodName::new("getFeeds").unwrap().as_str(), "getFeeds");
    }

    #[test]
    fn call_id_serialises_as_bare_integer() {
        assert_eq!(serde_json::to_string(&CallId::new(7)).unwrap(), "7");
    }

    #[test]
    fn transport_ids_are_distinct() {
        assert_ne!(TransportId::new_random(), TransportId::new_random());
    }
}
