//! Messaging bridge between an embedded application and its host window.
//!
//! The embedded application and the privileged host share one untyped,
//! broadcast-style cross-window message channel. This crate turns it into
//! request/response calls: a [`Transport`] allocates call ids, posts call
//! envelopes, keeps a pending-call table and dispatches matching responses to
//! success or error callbacks. Domain namespaces sit on top through
//! [`MethodNamespace`].
//!
//! ## Architectural Layer
//!
//! **Protocol core + port definitions.** The windowing system is reached only
//! through [`window::ParentWindow`]; hosts supply the implementation.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CallId`, `MethodName`, `TransportId`) |
//! | [`types`] | Payloads, wire envelopes, call options, timestamps |
//! | [`errors`] | [`BridgeError`] |
//! | [`config`] | [`BridgeConfig`] and protocol defaults |
//! | [`window`] | The parent-window port and an in-memory implementation |
//! | [`transport`] | [`Transport`] |
//! | [`namespace`] | [`Method`] and [`MethodNamespace`] |
//!
//! ## Wire format
//!
//! Outbound, posted with target origin `"*"`:
//!
//! ```text
//! { "name": "app.social.getFeeds", "params": ..., "namespace": "Enplug",
//!   "callId": 1, "transient": false, "persistent": false }
//! ```
//!
//! Inbound:
//!
//! ```text
//! { "namespace": "Enplug", "callId": 1, "success": true, "data": ... }
//! ```

pub mod config;
pub mod errors;
pub mod identifiers;
pub mod namespace;
mod pending;
pub mod transport;
pub mod types;
pub mod window;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{BridgeConfig, DEFAULT_METHOD_SCOPE, DEFAULT_NAMESPACE, DEFAULT_TARGET_ORIGIN};
pub use errors::{BridgeError, CallbackKind};
pub use identifiers::{CallId, MethodName, TransportId};
pub use namespace::{Method, MethodNamespace};
pub use transport::Transport;
pub use types::{
    CallEnvelope, CallOptions, Callback, CallbackSlot, Payload, PendingCallSummary,
    ResponseEnvelope, Timestamp,
};
pub use window::{DeliveryError, MemoryWindow, MessageEvent, MessageListener, ParentWindow};
