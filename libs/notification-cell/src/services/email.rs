use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, instrument};

use shared_config::AppConfig;

use crate::error::NotificationError;
use crate::models::{AppointmentSummary, EmailMessage, NotificationEvent};
use crate::services::templates;

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_confirmation(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError>;

    async fn send_cancellation(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError>;

    async fn send_completion(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError>;

    async fn send_email_confirmation(
        &self,
        user_name: &str,
        user_email: &str,
        confirmation_url: &str,
    ) -> Result<(), NotificationError>;
}

/// Routes an event to the matching dispatcher operation.
pub async fn dispatch(
    dispatcher: &dyn NotificationDispatcher,
    event: &NotificationEvent,
) -> Result<(), NotificationError> {
    match event {
        NotificationEvent::AppointmentConfirmed(summary) => dispatcher.send_confirmation(summary).await,
        NotificationEvent::AppointmentCancelled(summary) => dispatcher.send_cancellation(summary).await,
        NotificationEvent::AppointmentCompleted(summary) => dispatcher.send_completion(summary).await,
        NotificationEvent::EmailConfirmation { user_name, user_email, confirmation_url } => {
            dispatcher.send_email_confirmation(user_name, user_email, confirmation_url).await
        }
    }
}

/// Picks the HTTP mail API when configured, otherwise logs messages only.
pub fn dispatcher_from_config(config: &AppConfig) -> Arc<dyn NotificationDispatcher> {
    if config.is_email_configured() {
        info!("Using HTTP mail API at {}", config.email_api_url);
        Arc::new(HttpEmailDispatcher::new(config))
    } else {
        info!("Mail API not configured, notifications will only be logged");
        Arc::new(LogDispatcher::new(&config.firm_name, &config.email_from))
    }
}

/// Sends rendered messages as JSON to a transactional mail API.
pub struct HttpEmailDispatcher {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
    firm_name: String,
}

impl HttpEmailDispatcher {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build mail HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
            firm_name: config.firm_name.clone(),
        }
    }

    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn post(&self, message: EmailMessage) -> Result<(), NotificationError> {
        let response = self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Mail API error ({}): {}", status, body);
            return Err(NotificationError::Rejected { status: status.as_u16(), body });
        }

        debug!("Mail accepted by API");
        Ok(())
    }

    async fn send_event(&self, event: NotificationEvent) -> Result<(), NotificationError> {
        let message = templates::render(&event, &self.firm_name, &self.from);
        self.post(message).await
    }
}

#[async_trait]
impl NotificationDispatcher for HttpEmailDispatcher {
    async fn send_confirmation(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError> {
        self.send_event(NotificationEvent::AppointmentConfirmed(appointment.clone())).await
    }

    async fn send_cancellation(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError> {
        self.send_event(NotificationEvent::AppointmentCancelled(appointment.clone())).await
    }

    async fn send_completion(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError> {
        self.send_event(NotificationEvent::AppointmentCompleted(appointment.clone())).await
    }

    async fn send_email_confirmation(
        &self,
        user_name: &str,
        user_email: &str,
        confirmation_url: &str,
    ) -> Result<(), NotificationError> {
        self.send_event(NotificationEvent::EmailConfirmation {
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
            confirmation_url: confirmation_url.to_string(),
        })
        .await
    }
}

/// Renders messages and writes them to the log instead of sending.
pub struct LogDispatcher {
    firm_name: String,
    from: String,
}

impl LogDispatcher {
    pub fn new(firm_name: &str, from: &str) -> Self {
        Self {
            firm_name: firm_name.to_string(),
            from: from.to_string(),
        }
    }

    fn log(&self, event: NotificationEvent) -> Result<(), NotificationError> {
        let message = templates::render(&event, &self.firm_name, &self.from);
        info!(
            kind = event.kind(),
            to = %message.to,
            subject = %message.subject,
            "Mail not sent (no mail API configured)"
        );
        debug!("Mail body:\n{}", message.text);
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn send_confirmation(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError> {
        self.log(NotificationEvent::AppointmentConfirmed(appointment.clone()))
    }

    async fn send_cancellation(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError> {
        self.log(NotificationEvent::AppointmentCancelled(appointment.clone()))
    }

    async fn send_completion(&self, appointment: &AppointmentSummary) -> Result<(), NotificationError> {
        self.log(NotificationEvent::AppointmentCompleted(appointment.clone()))
    }

    async fn send_email_confirmation(
        &self,
        user_name: &str,
        user_email: &str,
        confirmation_url: &str,
    ) -> Result<(), NotificationError> {
        self.log(NotificationEvent::EmailConfirmation {
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
            confirmation_url: confirmation_url.to_string(),
        })
    }
}
