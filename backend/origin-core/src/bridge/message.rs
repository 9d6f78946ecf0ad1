use crate::error::bridge::BridgeError;

use common::ErrorLocation;

use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Id carried by flushed early-queue commands; no result is expected for it.
pub const UNCORRELATED_ID: u64 = 0;

/// Native to page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutboundMessage {
    Execute { id: u64, code: String },
}

impl OutboundMessage {
    pub fn execute(id: u64, code: impl Into<String>) -> Self {
        Self::Execute {
            id,
            code: code.into(),
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Self::Execute { id, .. } => *id,
        }
    }

    /// JSON form handed to the engine's structured-message transport.
    pub fn to_json(&self) -> Result<Value, BridgeError> {
        serde_json::to_value(self).map_err(|e| BridgeError::Encode {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Page to native.
///
/// `ok` and `error` are reported by the content script but are not forwarded to
/// result callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InboundMessage {
    Ready,
    Result {
        id: u64,
        #[serde(default)]
        ok: Option<bool>,
        #[serde(default)]
        error: Option<String>,
    },
}

impl InboundMessage {
    /// Parse a message from the page.
    ///
    /// Returns `Ok(None)` for kinds this side does not handle.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Decode`] when the value has no string `kind` or a known
    /// kind has malformed fields.
    pub fn parse(value: &Value) -> Result<Option<Self>, BridgeError> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::Decode {
                message: format!("Message has no kind: {value}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match kind {
            "ready" | "result" => Ok(Some(serde_json::from_value(value.clone())?)),
            _ => Ok(None),
        }
    }
}
