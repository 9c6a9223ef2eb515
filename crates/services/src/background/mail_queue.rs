use std::sync::Arc;
use std::time::Duration;

use pos_config::QueueSettings;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::mail::{MailJob, MailTemplates, MailTransport, OutboundMessage};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Mail queue is full")]
    QueueFull,
    #[error("Mail queue is closed")]
    Closed,
}

/// Hand-off point for mail work. A successful `submit` means the job was
/// accepted for delivery, not that it was delivered.
pub trait MailDispatcher: Send + Sync {
    fn submit(&self, job: MailJob) -> Result<(), DispatchError>;
}

/// Bounded in-process queue drained by a background worker.
///
/// Each job is rendered once and delivered with up to `max_attempts` tries,
/// waiting `retry_backoff_ms * attempt` between them.
pub struct MailQueue {
    tx: mpsc::Sender<MailJob>,
}

impl MailQueue {
    pub fn start(
        settings: &QueueSettings,
        templates: Arc<MailTemplates>,
        transport: Arc<dyn MailTransport>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(settings.capacity.max(1));
        let worker = MailWorker {
            rx,
            delivery: Arc::new(Delivery {
                templates,
                transport,
                max_attempts: settings.max_attempts.max(1),
                backoff: Duration::from_millis(settings.retry_backoff_ms),
            }),
        };
        let handle = tokio::spawn(worker.run());
        (Self { tx }, handle)
    }
}

impl MailDispatcher for MailQueue {
    fn submit(&self, job: MailJob) -> Result<(), DispatchError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::QueueFull,
            TrySendError::Closed(_) => DispatchError::Closed,
        })
    }
}

struct MailWorker {
    rx: mpsc::Receiver<MailJob>,
    delivery: Arc<Delivery>,
}

impl MailWorker {
    async fn run(mut self) {
        info!(transport = %self.delivery.transport.name(), "Mail worker started");
        while let Some(job) = self.rx.recv().await {
            let delivery = Arc::clone(&self.delivery);
            tokio::spawn(async move {
                delivery.deliver(job).await;
            });
        }
        info!("Mail worker stopped");
    }
}

struct Delivery {
    templates: Arc<MailTemplates>,
    transport: Arc<dyn MailTransport>,
    max_attempts: u32,
    backoff: Duration,
}

impl Delivery {
    /// Returns whether the message reached the transport.
    async fn deliver(&self, job: MailJob) -> bool {
        let (html, text) = match self.templates.render(&job.template, &job.context) {
            Ok(bodies) => bodies,
            Err(e) => {
                error!(template = %job.template, to = %job.to, error = %e, "Dropping mail job");
                return false;
            }
        };
        let message = OutboundMessage {
            to: job.to.clone(),
            subject: job.subject.clone(),
            html,
            text,
        };

        for attempt in 1..=self.max_attempts {
            match self.transport.send(&job.transport, &message).await {
                Ok(()) => {
                    info!(to = %message.to, template = %job.template, attempt, "Mail delivered");
                    return true;
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(to = %message.to, attempt, error = %e, "Mail delivery failed, retrying");
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => {
                    error!(to = %message.to, attempts = attempt, error = %e, "Mail delivery gave up");
                }
            }
        }
        false
    }
}
