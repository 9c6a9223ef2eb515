use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MailError, MailTransport, OutboundMessage, TransportConfig};

/// Keeps delivered messages in memory instead of sending them.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<(TransportConfig, OutboundMessage)>>,
    failures_left: AtomicU32,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` sends fail with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(TransportConfig, OutboundMessage)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(_, m)| m.to == address)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(
        &self,
        config: &TransportConfig,
        message: &OutboundMessage,
    ) -> Result<(), MailError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MailError::Transport("simulated relay failure".to_string()));
        }
        self.sent.lock().push((config.clone(), message.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
