use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use tracing::debug;

use super::{MailError, MailTransport, OutboundMessage, Security, TransportConfig};

/// Delivers over SMTP, opening a connection with the per-message transport config.
#[derive(Debug, Default, Clone)]
pub struct SmtpMailer;

impl SmtpMailer {
    pub fn new() -> Self {
        Self
    }

    fn build_message(config: &TransportConfig, message: &OutboundMessage) -> Result<Message, MailError> {
        let from_address = config
            .from_address
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;
        let from = Mailbox::new(config.from_name.clone(), from_address);
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))
    }

    fn build_transport(config: &TransportConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = match config.security {
            Security::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            Security::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            Security::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        config: &TransportConfig,
        message: &OutboundMessage,
    ) -> Result<(), MailError> {
        let email = Self::build_message(config, message)?;
        let transport = Self::build_transport(config)?;

        let response = transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        debug!(host = %config.host, code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
