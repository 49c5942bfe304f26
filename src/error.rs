/// Boxed error type used at every store/channel seam
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Monitor error taxonomy
///
/// `TransientStore` abandons the remaining work of the current phase and is
/// retried on the next tick. `ChannelDelivery` is logged per recipient and
/// never aborts sibling deliveries. `Configuration` downgrades the action to
/// a no-op logged at low severity.
#[derive(Debug, Clone)]
pub enum MonitorError {
    TransientStore(String),
    ChannelDelivery {
        channel: &'static str,
        recipient: String,
        reason: String,
    },
    Configuration(String),
}

impl MonitorError {
    /// Shorthand for a store failure
    pub fn store(msg: impl Into<String>) -> Self {
        MonitorError::TransientStore(msg.into())
    }

    /// Shorthand for a configuration no-op
    pub fn config(msg: impl Into<String>) -> Self {
        MonitorError::Configuration(msg.into())
    }
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::TransientStore(msg) => write!(f, "store error: {}", msg),
            MonitorError::ChannelDelivery {
                channel,
                recipient,
                reason,
            } => write!(f, "{} delivery to {} failed: {}", channel, recipient, reason),
            MonitorError::Configuration(msg) => write!(f, "configuration: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {}
