//! Workflow service - the mutating operations over the request lifecycle
//!
//! Wraps the pure convergence engine with authorization, input validation,
//! audit-log updates and guarded writes against the durable store, plus the
//! role-scoped read side. Every mutation is a single atomic
//! read-modify-write on one request document; concurrent writers lose with
//! a retryable conflict instead of silently clobbering each other.

pub mod visibility;
pub mod workflow;

pub use visibility::visible_to;
pub use workflow::{
    BatchApprovalReport, BatchFailure, WorkflowError, WorkflowService,
};
