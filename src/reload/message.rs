//! Live Update Message Protocol
//!
//! JSON messages sent over WebSocket to browser viewers.
//!
//! # Message Types
//!
//! - `connected`: Sent once after the handshake
//! - `update`: A watched file finished rendering

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveMessage {
    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Rendered content for `path` changed
    Update { path: String },
}

impl LiveMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn update(path: impl Into<String>) -> Self {
        Self::Update { path: path.into() }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"connected"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_json() {
        let json = LiveMessage::update("/docs/a.md").to_json();
        assert_eq!(json, r#"{"type":"update","path":"/docs/a.md"}"#);
    }

    #[test]
    fn test_connected_json() {
        let value: serde_json::Value =
            serde_json::from_str(&LiveMessage::connected().to_json()).unwrap();
        assert_eq!(value["type"], "connected");
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    }
}
