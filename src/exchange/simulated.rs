use async_trait::async_trait;
use std::time::Duration;

use super::GameServer;
use crate::config::ServerSettings;
use crate::notifications::ActivityLog;

/// Stand-in server: waits a fixed delay, performs no I/O
pub struct SimulatedServer {
    settings: ServerSettings,
}

impl SimulatedServer {
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl GameServer for SimulatedServer {
    async fn connect(&self, log: &mut ActivityLog) -> anyhow::Result<()> {
        log.info("Connecting to server...");
        log.info(format!("Server: {}", self.settings.url));
        log.info(format!("Game UID: {}", self.settings.game_uid));

        tokio::time::sleep(Duration::from_millis(self.settings.connect_delay_ms)).await;

        log.success("Connected successfully. Fetched latest results (simulated).");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Severity;

    #[tokio::test]
    async fn test_simulated_connect() {
        let settings = ServerSettings {
            connect_delay_ms: 5,
            ..ServerSettings::default()
        };
        let server = SimulatedServer::new(settings.clone());
        let mut log = ActivityLog::default();

        server.connect(&mut log).await.unwrap();

        let entries = log.recent(10);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].severity, Severity::Success);
        assert!(entries[2].message.contains(&settings.url));
    }
}
