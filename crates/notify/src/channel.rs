use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use gpsflow_core::domain::request::Request;

use crate::compose::{ComposeError, MessageComposer};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("vendor channel rejected the notification (status {status})")]
    Rejected { status: u16 },
    #[error("vendor channel transport failed: {0}")]
    Transport(String),
}

/// Delivers the composed vendor message. Implementations report success only
/// when the message has actually been handed off; the workflow couples the
/// `Completed` transition to that answer.
#[async_trait]
pub trait VendorNotifier: Send + Sync {
    async fn notify(&self, request: &Request) -> Result<DeliveryReceipt, NotifyError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VirtualEmail {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// Demo mailbox: delivery appends to an in-process list, newest first. Also
/// the default notifier in tests.
pub struct MailboxNotifier {
    composer: MessageComposer,
    mailbox: Arc<Mutex<Vec<VirtualEmail>>>,
}

impl MailboxNotifier {
    pub fn new(composer: MessageComposer) -> Self {
        Self { composer, mailbox: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn emails(&self) -> Vec<VirtualEmail> {
        match self.mailbox.lock() {
            Ok(emails) => emails.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl VendorNotifier for MailboxNotifier {
    async fn notify(&self, request: &Request) -> Result<DeliveryReceipt, NotifyError> {
        let message = self.composer.compose(request).await?;
        let delivered_at = Utc::now();
        let email = VirtualEmail {
            id: format!("msg-{}", Uuid::new_v4().simple()),
            to: message.to,
            subject: message.subject,
            body: message.body,
            timestamp: delivered_at,
        };
        let message_id = email.id.clone();

        match self.mailbox.lock() {
            Ok(mut emails) => emails.insert(0, email),
            Err(poisoned) => poisoned.into_inner().insert(0, email),
        }

        Ok(DeliveryReceipt { message_id, delivered_at })
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    request_id: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// HTTP delivery to the vendor gateway. Non-2xx responses and transport
/// errors both fail the dispatch; nothing is committed on the request.
pub struct WebhookNotifier {
    composer: MessageComposer,
    client: reqwest::Client,
    url: String,
    token: Option<SecretString>,
}

impl WebhookNotifier {
    pub fn new(
        composer: MessageComposer,
        url: impl Into<String>,
        token: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|error| NotifyError::Transport(error.to_string()))?;
        Ok(Self { composer, client, url: url.into(), token })
    }
}

#[async_trait]
impl VendorNotifier for WebhookNotifier {
    async fn notify(&self, request: &Request) -> Result<DeliveryReceipt, NotifyError> {
        let message = self.composer.compose(request).await?;
        let payload = WebhookPayload {
            request_id: &request.id.0,
            to: &message.to,
            subject: &message.subject,
            body: &message.body,
        };

        let mut builder = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|error| NotifyError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected { status: status.as_u16() });
        }

        Ok(DeliveryReceipt {
            message_id: format!("msg-{}", Uuid::new_v4().simple()),
            delivered_at: Utc::now(),
        })
    }
}

/// Test double for the failure path: always reports a transport error.
#[derive(Default)]
pub struct FailingNotifier;

#[async_trait]
impl VendorNotifier for FailingNotifier {
    async fn notify(&self, _request: &Request) -> Result<DeliveryReceipt, NotifyError> {
        Err(NotifyError::Transport("vendor gateway unreachable".to_string()))
    }
}

/// Runtime-selected delivery channel; which one is active is a config
/// decision, not a type decision.
pub enum DispatchChannel {
    Mailbox(MailboxNotifier),
    Webhook(WebhookNotifier),
}

impl DispatchChannel {
    pub fn mode_label(&self) -> &'static str {
        match self {
            Self::Mailbox(_) => "mailbox",
            Self::Webhook(_) => "webhook",
        }
    }
}

#[async_trait]
impl VendorNotifier for DispatchChannel {
    async fn notify(&self, request: &Request) -> Result<DeliveryReceipt, NotifyError> {
        match self {
            Self::Mailbox(notifier) => notifier.notify(request).await,
            Self::Webhook(notifier) => notifier.notify(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use gpsflow_core::domain::actor::{Actor, Role};
    use gpsflow_core::domain::request::{NewRequest, Request, RequestType, VehicleRef};

    use crate::compose::MessageComposer;

    use super::{FailingNotifier, MailboxNotifier, NotifyError, VendorNotifier};

    fn request(vehicle_number: &str) -> Request {
        Request::submitted(
            NewRequest {
                vehicles: vec![VehicleRef::new(vehicle_number)],
                city: "Bangalore".to_string(),
                client_name: "Amazon".to_string(),
                driver_details: Vec::new(),
                request_type: RequestType::GpsInstallation,
                vendor_name: None,
            },
            &Actor {
                id: "u1".to_string(),
                name: "John Operator".to_string(),
                role: Role::FieldOperator,
            },
        )
    }

    fn mailbox() -> MailboxNotifier {
        MailboxNotifier::new(
            MessageComposer::new("logistics-ops@vendor-gateway.com").expect("composer"),
        )
    }

    #[tokio::test]
    async fn mailbox_delivery_yields_a_receipt_and_stores_the_email() {
        let notifier = mailbox();
        let request = request("KA-01-ME-1234");

        let receipt = notifier.notify(&request).await.expect("delivery");

        let emails = notifier.emails();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].id, receipt.message_id);
        assert_eq!(emails[0].to, "logistics-ops@vendor-gateway.com");
        assert!(emails[0].body.contains("KA-01-ME-1234"));
    }

    #[tokio::test]
    async fn mailbox_keeps_newest_email_first() {
        let notifier = mailbox();

        notifier.notify(&request("KA-01-ME-1234")).await.expect("first");
        let second = notifier.notify(&request("MH-12-AB-5678")).await.expect("second");

        let emails = notifier.emails();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].id, second.message_id);
    }

    #[tokio::test]
    async fn failing_notifier_reports_transport_errors() {
        let error = FailingNotifier
            .notify(&request("KA-01-ME-1234"))
            .await
            .expect_err("must fail");
        assert!(matches!(error, NotifyError::Transport(_)));
    }
}
