use std::time::Instant;

use serde::Serialize;

use crate::commands::CommandResult;
use gpsflow_core::config::{AppConfig, LoadOptions};
use gpsflow_core::convergence::ReviewDecision;
use gpsflow_core::domain::actor::{Actor, ReviewerRole, Role};
use gpsflow_core::domain::request::{NewRequest, RequestStatus, RequestType, VehicleRef};
use gpsflow_db::store::{InMemoryRequestStore, InMemoryVehicleDirectory};
use gpsflow_db::{connect_with_settings, fixtures, migrations};
use gpsflow_notify::channel::MailboxNotifier;
use gpsflow_notify::compose::MessageComposer;
use gpsflow_service::WorkflowService;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config_started = Instant::now();
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms: config_started.elapsed().as_millis() as u64,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms: config_started.elapsed().as_millis() as u64,
                message: error.to_string(),
            });
            checks.push(skipped("db_connectivity"));
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("workflow_lifecycle"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("workflow_lifecycle"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let db_started = Instant::now();
    let db_result = runtime.block_on(async {
        connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
    });

    let pool = match db_result {
        Ok(pool) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Pass,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("connected using `{}`", config.database.url),
            });
            Some(pool)
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("failed to connect: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            None
        }
    };

    if let Some(pool) = pool {
        let migration_started = Instant::now();
        let migration_result = runtime.block_on(async { migrations::run_pending(&pool).await });
        runtime.block_on(async {
            pool.close().await;
        });

        match migration_result {
            Ok(()) => checks.push(SmokeCheck {
                name: "migration_visibility",
                status: SmokeStatus::Pass,
                elapsed_ms: migration_started.elapsed().as_millis() as u64,
                message: "migrations are visible and executable".to_string(),
            }),
            Err(error) => checks.push(SmokeCheck {
                name: "migration_visibility",
                status: SmokeStatus::Fail,
                elapsed_ms: migration_started.elapsed().as_millis() as u64,
                message: format!("migration execution failed: {error}"),
            }),
        }
    }

    let lifecycle_started = Instant::now();
    let lifecycle_result =
        runtime.block_on(run_lifecycle(config.notifier.vendor_email.clone()));
    match lifecycle_result {
        Ok(()) => checks.push(SmokeCheck {
            name: "workflow_lifecycle",
            status: SmokeStatus::Pass,
            elapsed_ms: lifecycle_started.elapsed().as_millis() as u64,
            message: "create, converge, and dispatch completed with a four-entry audit trail"
                .to_string(),
        }),
        Err(message) => checks.push(SmokeCheck {
            name: "workflow_lifecycle",
            status: SmokeStatus::Fail,
            elapsed_ms: lifecycle_started.elapsed().as_millis() as u64,
            message,
        }),
    }

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// End-to-end lifecycle against in-memory collaborators: submission, both
/// approvals in parallel-review order, vendor dispatch into the mailbox.
async fn run_lifecycle(vendor_email: String) -> Result<(), String> {
    let directory = InMemoryVehicleDirectory::default();
    fixtures::seed(&directory).await.map_err(|error| error.to_string())?;

    let composer = MessageComposer::new(vendor_email).map_err(|error| error.to_string())?;
    let service = WorkflowService::new(
        InMemoryRequestStore::default(),
        directory,
        MailboxNotifier::new(composer),
    );

    let operator =
        Actor { id: "smoke-u1".to_string(), name: "Smoke Operator".to_string(), role: Role::FieldOperator };
    let regional_head =
        Actor { id: "smoke-u2".to_string(), name: "Smoke Regional".to_string(), role: Role::RegionalHead };
    let payment_team =
        Actor { id: "smoke-u3".to_string(), name: "Smoke Payment".to_string(), role: Role::PaymentTeam };
    let vendor_coordinator = Actor {
        id: "smoke-u4".to_string(),
        name: "Smoke Vendor".to_string(),
        role: Role::VendorCoordinator,
    };

    let request = service
        .create_request(
            NewRequest {
                vehicles: vec![VehicleRef::new("KA-01-ME-1234")],
                city: "Bangalore".to_string(),
                client_name: "Amazon".to_string(),
                driver_details: Vec::new(),
                request_type: RequestType::GpsInstallation,
                vendor_name: None,
            },
            &operator,
        )
        .await
        .map_err(|error| error.to_string())?;

    service
        .review(&request.id, &regional_head, ReviewerRole::RegionalHead, ReviewDecision::Approve)
        .await
        .map_err(|error| error.to_string())?;
    service
        .review(&request.id, &payment_team, ReviewerRole::PaymentTeam, ReviewDecision::Approve)
        .await
        .map_err(|error| error.to_string())?;
    let completed = service
        .dispatch_to_vendor(&request.id, &vendor_coordinator)
        .await
        .map_err(|error| error.to_string())?;

    if completed.status != RequestStatus::Completed
        || completed.notification_timestamp.is_none()
        || completed.history.len() != 4
    {
        return Err("lifecycle finished in an unexpected state".to_string());
    }

    Ok(())
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
