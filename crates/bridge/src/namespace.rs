//! Method namespaces: the wire naming convention shared by every domain
//! namespace.
//!
//! [`Method`] is what [`Transport::factory`](crate::Transport::factory)
//! hands out: it joins its prefix and the operation name with `.`, stamps the
//! protocol namespace and delegates to `send`. [`MethodNamespace`] is the base
//! domain namespaces are built on; it derives the prefix from the configured
//! method scope and a namespace tag (`"app.social"`) and provides the argument
//! checks operations run before building a call.

use crate::types::{CallOptions, Payload};
use crate::{BridgeError, CallId, Transport};

/// A namespaced entry point into a [`Transport`].
#[derive(Debug, Clone)]
pub struct Method {
    transport: Transport,
    prefix: String,
}

impl Method {
    pub(crate) fn new(transport: Transport, prefix: String) -> Self {
        Self { transport, prefix }
    }

    /// Sends `options` with its name prefixed and the protocol namespace set.
    ///
    /// A missing or empty name stays missing and fails with
    /// [`BridgeError::MissingName`].
    pub fn call(&self, mut options: CallOptions) -> Result<CallId, BridgeError> {
        options.name = options
            .name
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}.{}", self.prefix, name));
        options.namespace = Some(self.transport.config().namespace.clone());
        self.transport.send(options)
    }
}

/// Base for domain namespaces such as social feeds.
#[derive(Debug, Clone)]
pub struct MethodNamespace {
    tag: String,
    method: Method,
}

impl MethodNamespace {
    /// Creates a namespace tagged `tag` on `transport`.
    ///
    /// Calls are named `"<method_scope>.<tag>.<operation>"`.
    pub fn new(transport: &Transport, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let prefix = format!("{}.{}", transport.config().method_scope, tag);
        Self {
            method: transport.factory(prefix),
            tag,
        }
    }

    /// The namespace tag (e.g. `"social"`).
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Sends a call through this namespace's [`Method`].
    pub fn method(&self, options: CallOptions) -> Result<CallId, BridgeError> {
        self.method.call(options)
    }

    /// Requires a non-empty string argument.
    pub fn validate_str(value: &str, message: &str) -> Result<(), BridgeError> {
        if value.is_empty() {
            return Err(invalid(message));
        }
        Ok(())
    }

    /// Requires an object argument.
    pub fn validate_object(value: &Payload, message: &str) -> Result<(), BridgeError> {
        if !value.is_object() {
            return Err(invalid(message));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> BridgeError {
    BridgeError::InvalidArgument {
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::window::MemoryWindow;
    use crate::BridgeConfig;

    fn posted_json(window: &MemoryWindow) -> Vec<Value> {
        window
            .posted()
            .iter()
            .map(|p| serde_json::from_str(&p.message).unwrap())
            .collect()
    }

    #[test]
    fn method_prefixes_name_and_stamps_namespace() {
        let window = MemoryWindow::new();
        let transport = Transport::new(window.clone(), BridgeConfig::default()).unwrap();
        let method = transport.factory("dashboard");

        let id = method.call(CallOptions::new("setHeader").params("Title")).unwrap();

        assert_eq!(id, CallId::new(1));
        let sent = posted_json(&window);
        assert_eq!(sent[0]["name"], "dashboard.setHeader");
        assert_eq!(sent[0]["namespace"], "Enplug");
    }

    #[test]
    fn method_without_name_is_rejected() {
        let window = MemoryWindow::new();
        let transport = Transport::new(window.clone(), BridgeConfig::default()).unwrap();
        let method = transport.factory("app");

        assert_eq!(
            method.call(CallOptions::default()),
            Err(BridgeError::MissingName)
        );
        assert!(window.posted().is_empty());
    }

    #[test]
    fn namespace_prefix_uses_scope_and_tag() {
        let config = BridgeConfig {
            method_scope: "dashboard".to_owned(),
            ..BridgeConfig::default()
        };
        let window = MemoryWindow::new();
        let transport = Transport::new(window.clone(), config).unwrap();
        let ns = MethodNamespace::new(&transport, "social");

        ns.method(CallOptions::new("getFeeds")).unwrap();

        assert_eq!(ns.tag(), "social");
        assert_eq!(posted_json(&window)[0]["name"], "dashboard.social.getFeeds");
    }

    #[test]
    fn validation_helpers() {
        assert!(MethodNamespace::validate_str("abc", "msg").is_ok());
        assert_eq!(
            MethodNamespace::validate_str("", "No assetid provided."),
            Err(BridgeError::InvalidArgument {
                message: "No assetid provided.".to_owned()
            })
        );
        assert!(MethodNamespace::validate_object(&json!({"id": 1}), "msg").is_ok());
        assert!(MethodNamespace::validate_object(&json!(null), "msg").is_err());
        assert!(MethodNamespace::validate_object(&json!([1]), "msg").is_err());
    }
}
