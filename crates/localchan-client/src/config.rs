use localchan_frame::FrameConfig;
use localchan_transport::RetryPolicy;

/// Settings for [`connect_with_config`](crate::connect_with_config).
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// How to dial the endpoint.
    pub retry: RetryPolicy,
    /// Payload limit and stream timeouts once connected.
    pub frame: FrameConfig,
}

impl ClientConfig {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_frame(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }
}
