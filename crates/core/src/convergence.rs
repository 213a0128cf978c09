//! Approval convergence: the pure transition rules for the request
//! lifecycle. Two reviewers act independently and in any order; whichever
//! acts second converges the request into vendor coordination. Rejection
//! from either reviewer halts the request outright.
//!
//! Everything here is side-effect-free over plain values so the rules can
//! be exercised without a store.

use thiserror::Error;

use crate::domain::actor::ReviewerRole;
use crate::domain::request::RequestStatus;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

/// The next value of `(status, flags, rejection_reason)` after a review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub status: RequestStatus,
    pub rh_approval: bool,
    pub payment_approval: bool,
    pub rejection_reason: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("request is not in parallel review (current status {status})")]
    NotInParallelReview { status: RequestStatus },
    #[error("{reviewer:?} has already recorded approval")]
    AlreadyApproved { reviewer: ReviewerRole },
    #[error("request is not awaiting vendor dispatch (current status {status})")]
    NotAwaitingDispatch { status: RequestStatus },
    #[error("vendor notification was already dispatched")]
    AlreadyDispatched,
}

/// Applies one reviewer's decision. Legal only from `ParallelReview`; a
/// rejection halts regardless of flag state and leaves the acting flag
/// unset, an approval sets the acting flag and converges to
/// `VendorCoordination` exactly when the other flag is already set.
pub fn review(
    status: RequestStatus,
    rh_approval: bool,
    payment_approval: bool,
    reviewer: ReviewerRole,
    decision: &ReviewDecision,
) -> Result<ReviewOutcome, TransitionError> {
    if status != RequestStatus::ParallelReview {
        return Err(TransitionError::NotInParallelReview { status });
    }

    match decision {
        ReviewDecision::Reject { reason } => Ok(ReviewOutcome {
            status: RequestStatus::Halted,
            rh_approval,
            payment_approval,
            rejection_reason: Some(reason.clone()),
        }),
        ReviewDecision::Approve => {
            let (own, other) = match reviewer {
                ReviewerRole::RegionalHead => (rh_approval, payment_approval),
                ReviewerRole::PaymentTeam => (payment_approval, rh_approval),
            };
            if own {
                return Err(TransitionError::AlreadyApproved { reviewer });
            }

            let next = if other {
                RequestStatus::VendorCoordination
            } else {
                RequestStatus::ParallelReview
            };
            let (rh_approval, payment_approval) = match reviewer {
                ReviewerRole::RegionalHead => (true, payment_approval),
                ReviewerRole::PaymentTeam => (rh_approval, true),
            };

            Ok(ReviewOutcome { status: next, rh_approval, payment_approval, rejection_reason: None })
        }
    }
}

/// Vendor dispatch: the only transition out of `VendorCoordination`, and
/// only when no notification timestamp has been recorded yet.
pub fn dispatch(
    status: RequestStatus,
    already_notified: bool,
) -> Result<RequestStatus, TransitionError> {
    if status != RequestStatus::VendorCoordination {
        return Err(TransitionError::NotAwaitingDispatch { status });
    }
    if already_notified {
        return Err(TransitionError::AlreadyDispatched);
    }

    Ok(RequestStatus::Completed)
}
