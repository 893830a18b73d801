//! Real-time connection settings.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue depth. When a client cannot keep up,
    /// further events for that connection are dropped rather than buffered
    /// unboundedly.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}
