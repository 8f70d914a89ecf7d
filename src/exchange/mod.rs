pub mod simulated;

pub use simulated::*;

use async_trait::async_trait;

use crate::notifications::ActivityLog;

/// Remote game server the results would come from
#[async_trait]
pub trait GameServer: Send + Sync {
    /// Connect and fetch the latest results, reporting progress to `log`
    async fn connect(&self, log: &mut ActivityLog) -> anyhow::Result<()>;
}
