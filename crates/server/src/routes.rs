use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use gpsflow_core::convergence::ReviewDecision;
use gpsflow_core::domain::actor::{Actor, ReviewerRole};
use gpsflow_core::domain::request::{NewRequest, Request, RequestId};
use gpsflow_core::stats::RequestStats;
use gpsflow_service::{BatchApprovalReport, WorkflowError};

use crate::bootstrap::Service;

#[derive(Clone)]
pub struct AppState {
    service: Arc<Service>,
}

pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route("/requests", post(create_request).get(list_requests))
        .route("/requests/batch-approve", post(batch_approve))
        .route("/requests/{id}/review", post(review_request))
        .route("/requests/{id}/dispatch", post(dispatch_request))
        .route("/stats", get(stats))
        .with_state(AppState { service })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(error: WorkflowError) -> ApiError {
    let status = match &error {
        WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
        WorkflowError::Transition(_) | WorkflowError::Conflict(_) => StatusCode::CONFLICT,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::RoleNotPermitted { .. } => StatusCode::FORBIDDEN,
        WorkflowError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        WorkflowError::Dispatch(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorBody { error: error.to_string() }))
}

#[derive(Debug, Deserialize)]
struct CreateRequestBody {
    actor: Actor,
    request: NewRequest,
}

async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<Request>), ApiError> {
    let created = state
        .service
        .create_request(body.request, &body.actor)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct ReviewBody {
    actor: Actor,
    reviewer: ReviewerRole,
    approve: bool,
    reason: Option<String>,
}

async fn review_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<Request>, ApiError> {
    let decision = if body.approve {
        ReviewDecision::Approve
    } else {
        ReviewDecision::Reject { reason: body.reason.unwrap_or_default() }
    };

    let updated = state
        .service
        .review(&RequestId(id), &body.actor, body.reviewer, decision)
        .await
        .map_err(error_response)?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
struct ActorBody {
    actor: Actor,
}

async fn batch_approve(
    State(state): State<AppState>,
    Json(body): Json<ActorBody>,
) -> Result<Json<BatchApprovalReport>, ApiError> {
    let report = state.service.batch_approve(&body.actor).await.map_err(error_response)?;
    Ok(Json(report))
}

async fn dispatch_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActorBody>,
) -> Result<Json<Request>, ApiError> {
    let completed = state
        .service
        .dispatch_to_vendor(&RequestId(id), &body.actor)
        .await
        .map_err(error_response)?;
    Ok(Json(completed))
}

async fn list_requests(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<Vec<Request>>, ApiError> {
    let requests = state.service.list_requests(&actor).await.map_err(error_response)?;
    Ok(Json(requests))
}

async fn stats(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<RequestStats>, ApiError> {
    let stats = state.service.stats(&actor).await.map_err(error_response)?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use gpsflow_core::domain::request::RequestStatus;
    use gpsflow_db::store::{SqlRequestStore, SqlVehicleDirectory};
    use gpsflow_db::{connect_with_settings, fixtures, migrations};
    use gpsflow_notify::channel::{DispatchChannel, MailboxNotifier};
    use gpsflow_notify::compose::MessageComposer;
    use gpsflow_service::WorkflowService;

    use super::router;

    async fn test_router() -> axum::Router {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let directory = SqlVehicleDirectory::new(pool.clone());
        fixtures::seed(&directory).await.expect("seed");

        let service = WorkflowService::new(
            SqlRequestStore::new(pool.clone()),
            directory,
            DispatchChannel::Mailbox(MailboxNotifier::new(
                MessageComposer::new("logistics-ops@vendor-gateway.com").expect("composer"),
            )),
        );
        router(Arc::new(service))
    }

    fn post_json(uri: &str, payload: &Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn operator_actor() -> Value {
        json!({ "id": "u1", "name": "John Operator", "role": "FIELD_OPERATOR" })
    }

    #[tokio::test]
    async fn lifecycle_over_http_reaches_completed() {
        let app = test_router().await;

        let create = app
            .clone()
            .oneshot(post_json(
                "/requests",
                &json!({
                    "actor": operator_actor(),
                    "request": {
                        "vehicles": [{ "vehicle_number": "KA-01-ME-1234" }],
                        "city": "Bangalore",
                        "client_name": "Amazon",
                        "driver_details": [],
                        "request_type": "GPS_INSTALLATION",
                        "vendor_name": null
                    }
                }),
            ))
            .await
            .expect("create response");
        assert_eq!(create.status(), StatusCode::CREATED);
        let created = body_json(create).await;
        assert_eq!(created["status"], "PARALLEL_REVIEW");
        let id = created["id"].as_str().expect("id").to_string();

        let rh = app
            .clone()
            .oneshot(post_json(
                &format!("/requests/{id}/review"),
                &json!({
                    "actor": { "id": "u2", "name": "Sarah Regional", "role": "REGIONAL_HEAD" },
                    "reviewer": "REGIONAL_HEAD",
                    "approve": true
                }),
            ))
            .await
            .expect("rh response");
        assert_eq!(rh.status(), StatusCode::OK);

        let pt = app
            .clone()
            .oneshot(post_json(
                &format!("/requests/{id}/review"),
                &json!({
                    "actor": { "id": "u3", "name": "Mike Payment", "role": "PAYMENT_TEAM" },
                    "reviewer": "PAYMENT_TEAM",
                    "approve": true
                }),
            ))
            .await
            .expect("pt response");
        let converged = body_json(pt).await;
        assert_eq!(converged["status"], "VENDOR_COORDINATION");

        let dispatch = app
            .clone()
            .oneshot(post_json(
                &format!("/requests/{id}/dispatch"),
                &json!({
                    "actor": { "id": "u4", "name": "Sauren Vendor", "role": "VENDOR_COORDINATOR" }
                }),
            ))
            .await
            .expect("dispatch response");
        assert_eq!(dispatch.status(), StatusCode::OK);
        let completed = body_json(dispatch).await;
        assert_eq!(completed["status"], RequestStatus::Completed.as_str());
        assert!(completed["notification_timestamp"].is_string());
        assert_eq!(completed["history"].as_array().expect("history").len(), 4);
    }

    #[tokio::test]
    async fn blank_rejection_reason_maps_to_bad_request() {
        let app = test_router().await;

        let create = app
            .clone()
            .oneshot(post_json(
                "/requests",
                &json!({
                    "actor": operator_actor(),
                    "request": {
                        "vehicles": [{ "vehicle_number": "MH-12-AB-5678" }],
                        "city": "Pune",
                        "client_name": "Flipkart",
                        "driver_details": [],
                        "request_type": "GPS_INSTALLATION",
                        "vendor_name": null
                    }
                }),
            ))
            .await
            .expect("create response");
        let created = body_json(create).await;
        let id = created["id"].as_str().expect("id").to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/requests/{id}/review"),
                &json!({
                    "actor": { "id": "u2", "name": "Sarah Regional", "role": "REGIONAL_HEAD" },
                    "reviewer": "REGIONAL_HEAD",
                    "approve": false,
                    "reason": "   "
                }),
            ))
            .await
            .expect("review response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("message").contains("rejection reason"));
    }

    #[tokio::test]
    async fn unknown_request_maps_to_not_found() {
        let app = test_router().await;

        let response = app
            .oneshot(post_json(
                "/requests/REQ-MISSING01/dispatch",
                &json!({
                    "actor": { "id": "u4", "name": "Sauren Vendor", "role": "VENDOR_COORDINATOR" }
                }),
            ))
            .await
            .expect("dispatch response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn field_operator_listing_is_scoped_by_query_actor() {
        let app = test_router().await;

        app.clone()
            .oneshot(post_json(
                "/requests",
                &json!({
                    "actor": operator_actor(),
                    "request": {
                        "vehicles": [{ "vehicle_number": "KA-01-ME-1234" }],
                        "city": "Bangalore",
                        "client_name": "Amazon",
                        "driver_details": [],
                        "request_type": "GPS_INSTALLATION",
                        "vendor_name": null
                    }
                }),
            ))
            .await
            .expect("create response");

        let listing = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/requests?id=u9&name=Priya%20Operator&role=FIELD_OPERATOR")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("list response");
        assert_eq!(listing.status(), StatusCode::OK);

        let body = body_json(listing).await;
        assert_eq!(body.as_array().expect("array").len(), 0);
    }
}
