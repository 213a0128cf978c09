use async_trait::async_trait;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;

use gpsflow_core::domain::request::Request;

/// External drafting collaborator (an LLM in production). Strictly a text
/// generator: it never decides whether a dispatch happens.
#[async_trait]
pub trait DraftClient: Send + Sync {
    async fn draft(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComposedMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("template rendering failed: {0}")]
    Template(#[from] tera::Error),
}

const VENDOR_TEMPLATE_NAME: &str = "vendor_dispatch";

const VENDOR_TEMPLATE: &str = "\
Dear Vendor Team,

A GPS installation request has cleared review and is approved for dispatch.

Request ID: {{ request_id }}
Client: {{ client_name }}
Location: {{ city }}
Vehicles: {{ vehicle_numbers }}

Please schedule installation at the earliest and confirm back on this
channel.

Regards,
Vendor Coordination
";

/// Builds the vendor dispatch message for a request snapshot. When a draft
/// client is attached its text is preferred; any drafting failure falls back
/// to the deterministic template so dispatch never depends on the drafting
/// collaborator being up.
pub struct MessageComposer {
    vendor_email: String,
    templates: Tera,
    draft_client: Option<Box<dyn DraftClient>>,
}

impl MessageComposer {
    pub fn new(vendor_email: impl Into<String>) -> Result<Self, ComposeError> {
        let mut templates = Tera::default();
        templates.add_raw_template(VENDOR_TEMPLATE_NAME, VENDOR_TEMPLATE)?;
        Ok(Self { vendor_email: vendor_email.into(), templates, draft_client: None })
    }

    pub fn with_draft_client(mut self, draft_client: Box<dyn DraftClient>) -> Self {
        self.draft_client = Some(draft_client);
        self
    }

    pub async fn compose(&self, request: &Request) -> Result<ComposedMessage, ComposeError> {
        let subject = format!(
            "ACTION REQUIRED: GPS Installation Request #{}",
            short_reference(&request.id.0)
        );

        let body = match &self.draft_client {
            Some(client) => match client.draft(&draft_prompt(request)).await {
                Ok(drafted) if !drafted.trim().is_empty() => drafted,
                Ok(_) => self.fallback_body(request)?,
                Err(error) => {
                    tracing::warn!(
                        event_name = "notify.draft_failed",
                        request_id = %request.id,
                        error = %error,
                        "draft client failed; using template fallback"
                    );
                    self.fallback_body(request)?
                }
            },
            None => self.fallback_body(request)?,
        };

        Ok(ComposedMessage { to: self.vendor_email.clone(), subject, body })
    }

    fn fallback_body(&self, request: &Request) -> Result<String, ComposeError> {
        let mut context = tera::Context::new();
        context.insert("request_id", &request.id.0);
        context.insert("client_name", &request.client_name);
        context.insert("city", &request.city);
        context.insert("vehicle_numbers", &vehicle_list(request));
        Ok(self.templates.render(VENDOR_TEMPLATE_NAME, &context)?)
    }
}

fn vehicle_list(request: &Request) -> String {
    request
        .vehicles
        .iter()
        .map(|vehicle| vehicle.vehicle_number.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn short_reference(id: &str) -> String {
    let tail = &id[id.len().saturating_sub(6)..];
    tail.to_ascii_uppercase()
}

fn draft_prompt(request: &Request) -> String {
    format!(
        "Draft a professional vendor installation request email for the following \
         GPS installation:\n\
         Client: {}\n\
         Location: {}\n\
         Vehicles: {}\n\
         Request ID: {}\n\
         Status: Approved for dispatch.\n\n\
         The tone should be formal and urgent. Include specific vehicle details if available.",
        request.client_name,
        request.city,
        vehicle_list(request),
        request.id.0,
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use gpsflow_core::domain::actor::{Actor, Role};
    use gpsflow_core::domain::request::{NewRequest, Request, RequestType, VehicleRef};

    use super::{DraftClient, MessageComposer};

    struct CannedDraftClient(&'static str);

    #[async_trait]
    impl DraftClient for CannedDraftClient {
        async fn draft(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenDraftClient;

    #[async_trait]
    impl DraftClient for BrokenDraftClient {
        async fn draft(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("drafting backend unreachable")
        }
    }

    fn request() -> Request {
        Request::submitted(
            NewRequest {
                vehicles: vec![
                    VehicleRef::new("KA-01-ME-1234"),
                    VehicleRef::new("MH-12-AB-5678"),
                ],
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

    #[tokio::test]
    async fn template_fallback_includes_request_context() {
        let composer = MessageComposer::new("logistics-ops@vendor-gateway.com").expect("composer");
        let request = request();

        let message = composer.compose(&request).await.expect("compose");

        assert_eq!(message.to, "logistics-ops@vendor-gateway.com");
        assert!(message.subject.starts_with("ACTION REQUIRED: GPS Installation Request #"));
        assert!(message.body.contains("Amazon"));
        assert!(message.body.contains("Bangalore"));
        assert!(message.body.contains("KA-01-ME-1234, MH-12-AB-5678"));
        assert!(message.body.contains(&request.id.0));
    }

    #[tokio::test]
    async fn drafted_body_is_preferred_when_the_client_answers() {
        let composer = MessageComposer::new("logistics-ops@vendor-gateway.com")
            .expect("composer")
            .with_draft_client(Box::new(CannedDraftClient("Drafted dispatch body.")));

        let message = composer.compose(&request()).await.expect("compose");
        assert_eq!(message.body, "Drafted dispatch body.");
    }

    #[tokio::test]
    async fn draft_failure_falls_back_to_the_template() {
        let composer = MessageComposer::new("logistics-ops@vendor-gateway.com")
            .expect("composer")
            .with_draft_client(Box::new(BrokenDraftClient));

        let message = composer.compose(&request()).await.expect("compose");
        assert!(message.body.contains("approved for dispatch"));
    }

    #[tokio::test]
    async fn subject_uses_the_uppercased_id_tail() {
        let composer = MessageComposer::new("ops@vendor.example").expect("composer");
        let mut request = request();
        request.id.0 = "REQ-abc123xyz".to_string();

        let message = composer.compose(&request).await.expect("compose");
        assert!(message.subject.ends_with("#123XYZ"));
    }
}
