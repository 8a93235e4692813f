//! Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::BridgeError;

/// Protocol tag stamped on every envelope of this protocol family.
pub const DEFAULT_NAMESPACE: &str = "Enplug";

/// Destination restriction used when posting. The wildcard supports the
/// various developer localhosts an app may be embedded from.
pub const DEFAULT_TARGET_ORIGIN: &str = "*";

/// Implementation-specific prefix namespaces put in front of their tag.
pub const DEFAULT_METHOD_SCOPE: &str = "app";

/// Settings for a [`crate::Transport`] and the namespaces built on it.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Protocol tag written to outbound calls and required on inbound responses.
    pub namespace: String,

    /// Destination restriction passed to [`crate::window::ParentWindow::post_message`].
    pub target_origin: String,

    /// Origins whose messages are accepted. Empty accepts every origin and
    /// relies on namespace filtering alone.
    pub trusted_origins: Vec<String>,

    /// Prefix namespaces prepend to their tag (`"app"` or `"dashboard"`).
    pub method_scope: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            target_origin: DEFAULT_TARGET_ORIGIN.to_owned(),
            trusted_origins: Vec::new(),
            method_scope: DEFAULT_METHOD_SCOPE.to_owned(),
        }
    }
}

impl BridgeConfig {
    /// Checks the config for values that would make the bridge unusable.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.namespace.is_empty() {
            return Err(BridgeError::Configuration {
                message: "namespace must not be empty".to_owned(),
            });
        }
        if self.target_origin.is_empty() {
            return Err(BridgeError::Configuration {
                message: "target_origin must not be empty".to_owned(),
            });
        }
        if self.trusted_origins.iter().any(String::is_empty) {
            return Err(BridgeError::Configuration {
                message: "trusted_origins must not contain empty entries".to_owned(),
            });
        }
        Ok(())
    }

    /// Returns `true` if messages from `origin` may be processed.
    pub fn trusts_origin(&self, origin: &str) -> bool {
        self.trusted_origins.is_empty() || self.trusted_origins.iter().any(|o| o == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.namespace, "Enplug");
        assert_eq!(config.target_origin, "*");
        config.validate().unwrap();
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let config = BridgeConfig {
            namespace: String::new(),
            ..BridgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::Configuration { .. })
        ));
    }

    #[test]
    fn allow_list_restricts_origins_only_when_set() {
        let mut config = BridgeConfig::default();
        assert!(config.trusts_origin("http://localhost:8080"));

        config.trusted_origins = vec!["https://dashboard.enplug.com".to_owned()];
        assert!(config.trusts_origin("https://dashboard.enplug.com"));
        assert!(!config.trusts_origin("http://localhost:8080"));
    }
}
