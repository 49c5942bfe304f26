use async_trait::async_trait;

/// Outbound email channel. Failures are reported, never swallowed.
#[async_trait]
pub trait EmailSender {
    /// Error type for this channel
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Self::Error>;
}

/// Outbound SMS channel. Failures are reported, never swallowed.
#[async_trait]
pub trait SmsSender {
    /// Error type for this channel
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    async fn send(&self, to: &str, message: &str) -> Result<(), Self::Error>;
}
