use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::actor::{Actor, ReviewerRole};
use crate::domain::request::{RequestStatus, RequestType};

/// Wire marker for the creation entry's missing prior status.
pub const NONE_STATUS: &str = "NONE";

/// One immutable record of a single state transition. History is append-only:
/// entries are never rewritten, reordered, or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: String,
    pub user_name: String,
    pub action: String,
    #[serde(with = "status_from_wire")]
    pub status_from: Option<RequestStatus>,
    pub status_to: RequestStatus,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl AuditEntry {
    pub fn new(
        actor: &Actor,
        action: impl Into<String>,
        status_from: Option<RequestStatus>,
        status_to: RequestStatus,
    ) -> Self {
        Self {
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            action: action.into(),
            status_from,
            status_to,
            timestamp: Utc::now(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn creation(actor: &Actor, request_type: RequestType) -> Self {
        Self::new(
            actor,
            format!("Initial Submission ({})", request_type.human_label()),
            None,
            RequestStatus::ParallelReview,
        )
    }

    pub fn approval(actor: &Actor, reviewer: ReviewerRole, status_to: RequestStatus) -> Self {
        Self::new(
            actor,
            format!("{} Approved", reviewer.short_label()),
            Some(RequestStatus::ParallelReview),
            status_to,
        )
    }

    pub fn batch_approval(actor: &Actor, status_to: RequestStatus) -> Self {
        Self::new(actor, "RH Batch Approval", Some(RequestStatus::ParallelReview), status_to)
    }

    pub fn rejection(actor: &Actor, reviewer: ReviewerRole, reason: &str) -> Self {
        Self::new(
            actor,
            format!("{} Rejected", reviewer.short_label()),
            Some(RequestStatus::ParallelReview),
            RequestStatus::Halted,
        )
        .with_notes(reason)
    }

    pub fn dispatch(actor: &Actor) -> Self {
        Self::new(
            actor,
            "Vendor Dispatched",
            Some(RequestStatus::VendorCoordination),
            RequestStatus::Completed,
        )
    }
}

/// Serializes the creation entry's absent prior status as the literal
/// `"NONE"` the rest of the system expects on the wire.
mod status_from_wire {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::domain::request::RequestStatus;

    use super::NONE_STATUS;

    pub fn serialize<S>(value: &Option<RequestStatus>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(status) => status.serialize(serializer),
            None => serializer.serialize_str(NONE_STATUS),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<RequestStatus>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == NONE_STATUS {
            return Ok(None);
        }
        raw.parse::<RequestStatus>().map(Some).map_err(serde::de::Error::custom)
    }
}
