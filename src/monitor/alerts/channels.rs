// Alert Channel Trait

use crate::Result;
use crate::monitor::types::Finding;
use async_trait::async_trait;

/// Alert channel trait - implement this for custom alert channels
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Deliver one finding through this channel
    async fn send_alert(&self, finding: &Finding) -> Result<()>;

    /// Get the channel name for logging and alert records
    fn channel_name(&self) -> &str;

    /// Test the channel connectivity (optional)
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}
