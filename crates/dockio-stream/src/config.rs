use dockio_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};

use crate::event::EventName;

/// Default maximum size of one buffered JSON value: 16 MiB.
pub const DEFAULT_MAX_JSON_VALUE: usize = 16 * 1024 * 1024;

/// Limits and routing applied by the JSON and demultiplexing adapters.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Maximum payload of one multiplexed frame. Default: anything the wire can carry.
    pub max_frame_payload: usize,
    /// Maximum bytes buffered for a single JSON value. Default: 16 MiB.
    pub max_json_value_size: usize,
    /// Event that stderr frames are emitted on. `None` merges them into `data`.
    pub stderr_event: Option<EventName>,
}

impl StreamConfig {
    /// Route stderr frames to `event` instead of the data channel.
    pub fn with_stderr_event(mut self, event: impl Into<EventName>) -> Self {
        self.stderr_event = Some(event.into());
        self
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_frame_payload,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_frame_payload: DEFAULT_MAX_PAYLOAD,
            max_json_value_size: DEFAULT_MAX_JSON_VALUE,
            stderr_event: None,
        }
    }
}
