use std::fmt;

use dockio_frame::FrameError;

/// The unit of data a stream was in the middle of when its input ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// A top-level JSON value.
    JsonValue,
    /// A multiplexed stdout/stderr frame.
    MultiplexedFrame,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::JsonValue => f.write_str("JSON data"),
            Unit::MultiplexedFrame => f.write_str("multiplexed chunk"),
        }
    }
}

/// Errors surfaced by streaming adapters and aggregators.
///
/// Every variant is terminal: a stream that yields one is closed afterwards.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The request never produced a response, or the body failed mid-transfer.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// A complete JSON value could not be decoded.
    #[error("malformed JSON data: {0}")]
    Json(#[from] serde_json::Error),

    /// A byte that cannot start or continue a top-level JSON value.
    #[error("malformed JSON data: unexpected byte 0x{byte:02x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: u64 },

    /// A single JSON value outgrew the configured buffer limit.
    #[error("JSON value too large ({size} bytes buffered, max {max})")]
    ValueTooLarge { size: usize, max: usize },

    /// The remote end reported an error object in-band.
    #[error("{message}")]
    Remote {
        message: String,
        data: serde_json::Value,
    },

    /// Input ended while a value or frame was only partially buffered.
    #[error("stream ended within incomplete {0}")]
    Truncated(Unit),

    /// Multiplexed framing was invalid.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// An aggregator was handed a stream that was already closed.
    #[error("stream already ended, looks like it could not be opened")]
    NotReadable,

    /// A pending aggregation was cancelled by its consumer.
    #[error("cancelled")]
    Cancelled,
}

impl StreamError {
    /// Build a [`StreamError::Remote`] from an in-band error object.
    ///
    /// The message is the `error` member when it is a string, otherwise its
    /// JSON rendering.
    pub fn remote(data: serde_json::Value) -> Self {
        let message = match data.get("error") {
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => data.to_string(),
        };
        Self::Remote { message, data }
    }

    /// The original payload of an in-band error, if this is one.
    pub fn remote_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Remote { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns true for errors caused by undecodable or truncated input.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Json(_)
                | Self::UnexpectedByte { .. }
                | Self::ValueTooLarge { .. }
                | Self::Truncated(_)
                | Self::Frame(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn remote_uses_error_string_as_message() {
        let err = StreamError::remote(json!({"error": "pull access denied", "errorDetail": {}}));
        assert_eq!(err.to_string(), "pull access denied");
        assert_eq!(
            err.remote_data().and_then(|data| data.get("errorDetail")),
            Some(&json!({}))
        );
    }

    #[test]
    fn remote_renders_non_string_error() {
        let err = StreamError::remote(json!({"error": {"code": 7}}));
        assert_eq!(err.to_string(), r#"{"code":7}"#);
    }

    #[test]
    fn truncation_messages() {
        assert_eq!(
            StreamError::Truncated(Unit::JsonValue).to_string(),
            "stream ended within incomplete JSON data"
        );
        assert_eq!(
            StreamError::Truncated(Unit::MultiplexedFrame).to_string(),
            "stream ended within incomplete multiplexed chunk"
        );
    }

    #[test]
    fn classification() {
        assert!(StreamError::Truncated(Unit::JsonValue).is_malformed());
        assert!(!StreamError::Cancelled.is_malformed());
        assert!(!StreamError::remote(json!({"error": "x"})).is_malformed());
    }
}
