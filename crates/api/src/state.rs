use std::sync::Arc;

use mongodb::Database;
use pos_config::Settings;
use pos_services::{
    AccountService, AuthService, InvitationService, MailDispatcher, MailQueue,
    mail::{MailError, MailTemplates, MailTransport, SmtpMailer},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub accounts: Arc<AccountService>,
    pub invitations: Arc<InvitationService>,
}

impl AppState {
    /// Starts the mail worker against SMTP.
    pub fn new(db: Database, settings: Settings) -> Result<Self, MailError> {
        Self::with_transport(db, settings, Arc::new(SmtpMailer::new()))
    }

    pub fn with_transport(
        db: Database,
        settings: Settings,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, MailError> {
        let templates = Arc::new(MailTemplates::new()?);
        let (queue, _worker) = MailQueue::start(&settings.queue, templates, transport);
        Ok(Self::with_dispatcher(db, settings, Arc::new(queue)))
    }

    pub fn with_dispatcher(
        db: Database,
        settings: Settings,
        dispatcher: Arc<dyn MailDispatcher>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let accounts = Arc::new(AccountService::new(
            &db,
            auth.clone(),
            settings.tenancy.clone(),
        ));
        let invitations = Arc::new(InvitationService::new(
            &db,
            auth.clone(),
            dispatcher,
            &settings,
        ));

        Self {
            db,
            settings,
            auth,
            accounts,
            invitations,
        }
    }
}
