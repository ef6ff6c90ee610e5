//! Messages exchanged with the document server.
//!
//! Local edits go out as `document.edit` messages naming a command kind and
//! its payload. The server echoes edits from other clients in the same shape,
//! and announces session start and the end of the initial sync.

use crate::commands::{CommandError, CommandKind};
use crate::scene::SceneError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Forward or reverse effect of a local command
    #[serde(rename = "document.edit")]
    Edit { command: CommandKind, data: Value },
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// A session started; ids minted locally should use `id_prefix`
    #[serde(rename = "document.open")]
    Open {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id_prefix: Option<String>,
    },
    /// An edit made elsewhere. The kind is kept as text so that unknown
    /// kinds surface as [`ProtocolError::UnknownCommand`].
    #[serde(rename = "document.edit")]
    Edit { command: String, data: Value },
    /// Initial sync finished
    #[serde(rename = "document.loaded")]
    Loaded,
    /// Error reported by the server
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        msg: String,
    },
    /// Anything else (presence, chat, ...), ignored by the editor
    #[serde(other)]
    Other,
}

impl ServerMessage {
    /// Parse one JSON message.
    pub fn from_json(text: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ClientMessage {
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Errors raised while handling server messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown command kind: {0}")]
    UnknownCommand(String),

    #[error("Malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: CommandKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl From<SceneError> for ProtocolError {
    fn from(err: SceneError) -> Self {
        ProtocolError::Command(err.into())
    }
}

/// Result type for protocol handling.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_client_message_wire_shape() {
        let msg = ClientMessage::Edit {
            command: CommandKind::ShapeDelete,
            data: json!({"id": "id-3"}),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "document.edit", "command": "shape.delete", "data": {"id": "id-3"}})
        );
    }

    #[test]
    fn test_server_messages() {
        assert_eq!(
            ServerMessage::from_json(r#"{"type": "document.open", "id_prefix": "c7"}"#).unwrap(),
            ServerMessage::Open {
                id_prefix: Some("c7".into())
            }
        );
        assert_eq!(
            ServerMessage::from_json(r#"{"type": "document.loaded"}"#).unwrap(),
            ServerMessage::Loaded
        );
        assert_eq!(
            ServerMessage::from_json(r#"{"type": "client.join", "name": "x"}"#).unwrap(),
            ServerMessage::Other
        );
        let edit = ServerMessage::from_json(
            r#"{"type": "document.edit", "command": "shape.star", "data": {}}"#,
        )
        .unwrap();
        assert!(matches!(edit, ServerMessage::Edit { ref command, .. } if command == "shape.star"));
        assert!(matches!(
            ServerMessage::from_json("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
