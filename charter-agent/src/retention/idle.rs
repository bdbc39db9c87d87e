//! Idle-timeout retention policy

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use super::RetentionStrategy;
use crate::node::Computer;

/// Terminates a node once its computer has been idle for too long
#[derive(Debug, Clone)]
pub struct IdleRetentionPolicy {
    idle_minutes: u32,
    check_interval: Duration,
}

impl IdleRetentionPolicy {
    /// Creates a policy
    ///
    /// # Arguments
    /// * `idle_minutes` - Idle time before termination; 0 disables it
    /// * `check_interval` - Delay between checks
    pub fn new(idle_minutes: u32, check_interval: Duration) -> Self {
        Self {
            idle_minutes,
            check_interval,
        }
    }

    /// Configured idle timeout in minutes
    pub fn idle_minutes(&self) -> u32 {
        self.idle_minutes
    }

    /// Delay between checks
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(u64::from(minutes) * 60)),
        }
    }

    /// True when `computer` is online and has been idle past the timeout
    pub fn is_expired(&self, computer: &dyn Computer) -> bool {
        let Some(timeout) = self.idle_timeout() else {
            return false;
        };

        if !computer.is_idle() || computer.is_offline() {
            return false;
        }

        computer
            .idle_since()
            .is_some_and(|since| since.elapsed() > timeout)
    }
}

#[async_trait]
impl RetentionStrategy for IdleRetentionPolicy {
    async fn check(&self, computer: &dyn Computer) -> Duration {
        if self.is_expired(computer) {
            info!("Disconnecting idle computer {}", computer.name());

            if let Some(node) = computer.node() {
                match node.terminate().await {
                    Ok(()) => {
                        computer.remove_node();
                    }
                    Err(e) => warn!("Failed to terminate {}: {}", computer.name(), e),
                }
            }
        }

        self.check_interval
    }
}
