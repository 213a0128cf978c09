use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use gpsflow_core::audit::AuditEntry;
use gpsflow_core::convergence::{self, ReviewDecision, TransitionError};
use gpsflow_core::domain::actor::{Actor, ReviewerRole, Role};
use gpsflow_core::domain::request::{
    NewRequest, Request, RequestId, RequestType, VehicleRef,
};
use gpsflow_core::errors::ValidationError;
use gpsflow_core::stats::{self, RequestStats};
use gpsflow_db::store::{RequestStore, StoreError, VehicleDirectory};
use gpsflow_notify::channel::{NotifyError, VendorNotifier};

use crate::visibility::visible_to;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("request `{0}` not found")]
    NotFound(RequestId),
    #[error("role {actual:?} may not perform this operation (requires {required:?})")]
    RoleNotPermitted { required: Role, actual: Role },
    #[error("request `{0}` was updated concurrently; reload and retry")]
    Conflict(RequestId),
    #[error("store failure: {0}")]
    Store(StoreError),
    #[error("vendor dispatch failed: {0}")]
    Dispatch(#[from] NotifyError),
}

impl From<StoreError> for WorkflowError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::RevisionConflict { id, .. } => Self::Conflict(id),
            other => Self::Store(other),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BatchApprovalReport {
    pub approved: Vec<Request>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub id: RequestId,
    pub error: String,
}

/// The workflow service. `S` owns durability and concurrency control, `V`
/// answers registration lookups, `N` is the external dispatch collaborator.
pub struct WorkflowService<S, V, N> {
    store: S,
    directory: V,
    notifier: N,
}

impl<S, V, N> WorkflowService<S, V, N>
where
    S: RequestStore,
    V: VehicleDirectory,
    N: VendorNotifier,
{
    pub fn new(store: S, directory: V, notifier: N) -> Self {
        Self { store, directory, notifier }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// A submission is a GPS installation exactly when every vehicle on it
    /// is pre-registered; anything else is a new trip.
    pub async fn derive_request_type(
        &self,
        vehicles: &[VehicleRef],
    ) -> Result<RequestType, WorkflowError> {
        for vehicle in vehicles {
            if !self.directory.is_registered(&vehicle.vehicle_number).await? {
                return Ok(RequestType::NewTrip);
            }
        }
        Ok(RequestType::GpsInstallation)
    }

    pub async fn create_request(
        &self,
        input: NewRequest,
        actor: &Actor,
    ) -> Result<Request, WorkflowError> {
        require_role(actor, Role::FieldOperator)?;
        input.validate()?;

        if input.request_type == RequestType::GpsInstallation {
            for vehicle in &input.vehicles {
                if !self.directory.is_registered(&vehicle.vehicle_number).await? {
                    return Err(ValidationError::UnregisteredVehicle {
                        vehicle_number: vehicle.vehicle_number.clone(),
                    }
                    .into());
                }
            }
        }

        let request = Request::submitted(input, actor);
        self.store.insert(request.clone()).await?;

        info!(
            event_name = "workflow.request_created",
            request_id = %request.id,
            request_type = request.request_type.as_str(),
            created_by = %request.created_by,
            "request submitted into parallel review"
        );

        Ok(request)
    }

    /// One reviewer's approve/reject. The write is guarded on the revision
    /// read here, so "the other flag is already set" is decided atomically
    /// with setting this reviewer's flag.
    pub async fn review(
        &self,
        request_id: &RequestId,
        actor: &Actor,
        reviewer: ReviewerRole,
        decision: ReviewDecision,
    ) -> Result<Request, WorkflowError> {
        require_role(actor, reviewer.role())?;
        let decision = normalize_decision(decision)?;

        let request = self
            .store
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(request_id.clone()))?;

        let updated = self
            .apply_review(request, actor, reviewer, &decision, false)
            .await?;

        info!(
            event_name = "workflow.review_applied",
            request_id = %updated.id,
            reviewer = reviewer.short_label(),
            status = updated.status.as_str(),
            "review decision committed"
        );

        Ok(updated)
    }

    /// Regional Head clearance sweep: the approve branch applied to every
    /// request still awaiting the RH flag. Items commit independently; a
    /// failure is reported for its request and does not touch the others.
    pub async fn batch_approve(&self, actor: &Actor) -> Result<BatchApprovalReport, WorkflowError> {
        require_role(actor, Role::RegionalHead)?;

        let queue = self.store.list_awaiting_rh().await?;
        let mut report = BatchApprovalReport::default();

        for request in queue {
            let id = request.id.clone();
            match self
                .apply_review(request, actor, ReviewerRole::RegionalHead, &ReviewDecision::Approve, true)
                .await
            {
                Ok(updated) => report.approved.push(updated),
                Err(error) => report.failures.push(BatchFailure { id, error: error.to_string() }),
            }
        }

        info!(
            event_name = "workflow.batch_approval_finished",
            approved = report.approved.len(),
            failed = report.failures.len(),
            "batch approval sweep finished"
        );

        Ok(report)
    }

    /// Vendor dispatch: notification first, commit second. If the
    /// collaborator fails nothing is written and the request stays in
    /// vendor coordination, retryable.
    pub async fn dispatch_to_vendor(
        &self,
        request_id: &RequestId,
        actor: &Actor,
    ) -> Result<Request, WorkflowError> {
        require_role(actor, Role::VendorCoordinator)?;

        let mut request = self
            .store
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(request_id.clone()))?;

        let next_status =
            convergence::dispatch(request.status, request.notification_timestamp.is_some())?;

        let receipt = self.notifier.notify(&request).await?;

        let expected_revision = request.revision;
        request.status = next_status;
        request.notification_timestamp = Some(receipt.delivered_at);
        request.updated_at = Utc::now();
        request.revision += 1;
        request.history.push(AuditEntry::dispatch(actor));

        self.store.update(request.clone(), expected_revision).await?;

        info!(
            event_name = "workflow.vendor_dispatched",
            request_id = %request.id,
            message_id = %receipt.message_id,
            "vendor notification delivered and request completed"
        );

        Ok(request)
    }

    /// Role-scoped listing, most recently created first.
    pub async fn list_requests(&self, actor: &Actor) -> Result<Vec<Request>, WorkflowError> {
        let requests = self.store.list_all().await?;
        Ok(visible_to(actor, requests))
    }

    /// Statistics over the actor-visible snapshot.
    pub async fn stats(&self, actor: &Actor) -> Result<RequestStats, WorkflowError> {
        let requests = self.list_requests(actor).await?;
        Ok(stats::snapshot(&requests, Utc::now()))
    }

    async fn apply_review(
        &self,
        mut request: Request,
        actor: &Actor,
        reviewer: ReviewerRole,
        decision: &ReviewDecision,
        batch: bool,
    ) -> Result<Request, WorkflowError> {
        let outcome = convergence::review(
            request.status,
            request.rh_approval,
            request.payment_approval,
            reviewer,
            decision,
        )?;

        let entry = match decision {
            ReviewDecision::Approve if batch => AuditEntry::batch_approval(actor, outcome.status),
            ReviewDecision::Approve => AuditEntry::approval(actor, reviewer, outcome.status),
            ReviewDecision::Reject { reason } => AuditEntry::rejection(actor, reviewer, reason),
        };

        let expected_revision = request.revision;
        request.status = outcome.status;
        request.rh_approval = outcome.rh_approval;
        request.payment_approval = outcome.payment_approval;
        request.rejection_reason = outcome.rejection_reason;
        request.updated_at = Utc::now();
        request.revision += 1;
        request.history.push(entry);

        self.store.update(request.clone(), expected_revision).await?;
        Ok(request)
    }
}

fn require_role(actor: &Actor, required: Role) -> Result<(), WorkflowError> {
    if actor.role == required {
        Ok(())
    } else {
        Err(WorkflowError::RoleNotPermitted { required, actual: actor.role })
    }
}

fn normalize_decision(decision: ReviewDecision) -> Result<ReviewDecision, WorkflowError> {
    match decision {
        ReviewDecision::Reject { reason } => {
            let trimmed = reason.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::BlankRejectionReason.into());
            }
            Ok(ReviewDecision::Reject { reason: trimmed.to_string() })
        }
        approve => Ok(approve),
    }
}
