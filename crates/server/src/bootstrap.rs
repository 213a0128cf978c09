use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use gpsflow_core::config::{AppConfig, ChannelMode, ConfigError, LoadOptions};
use gpsflow_db::store::{SqlRequestStore, SqlVehicleDirectory};
use gpsflow_db::{connect_with_settings, migrations, DbPool};
use gpsflow_notify::channel::{DispatchChannel, MailboxNotifier, NotifyError, WebhookNotifier};
use gpsflow_notify::compose::{ComposeError, MessageComposer};
use gpsflow_service::WorkflowService;

pub type Service = WorkflowService<SqlRequestStore, SqlVehicleDirectory, DispatchChannel>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<Service>,
    pub channel_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notification composer setup failed: {0}")]
    Compose(#[from] ComposeError),
    #[error("notification channel setup failed: {0}")]
    Notifier(#[from] NotifyError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let channel = build_channel(&config)?;
    let channel_mode = channel.mode_label();

    let service = Arc::new(WorkflowService::new(
        SqlRequestStore::new(db_pool.clone()),
        SqlVehicleDirectory::new(db_pool.clone()),
        channel,
    ));

    Ok(Application { config, db_pool, service, channel_mode })
}

fn build_channel(config: &AppConfig) -> Result<DispatchChannel, BootstrapError> {
    let composer = MessageComposer::new(config.notifier.vendor_email.clone())?;

    match config.notifier.channel {
        ChannelMode::Mailbox => Ok(DispatchChannel::Mailbox(MailboxNotifier::new(composer))),
        ChannelMode::Webhook => {
            let url = config.notifier.webhook_url.clone().ok_or_else(|| {
                ConfigError::Validation(
                    "notifier.webhook_url is required for the webhook channel".to_string(),
                )
            })?;
            let notifier = WebhookNotifier::new(
                composer,
                url,
                config.notifier.webhook_token.clone(),
                config.notifier.timeout_secs,
            )?;
            Ok(DispatchChannel::Webhook(notifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use gpsflow_core::config::{ChannelMode, ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_prepares_schema_and_mailbox_channel() {
        let app = bootstrap(overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed against an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('request', 'vehicle')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables to be available after bootstrap");
        assert_eq!(table_count, 2, "bootstrap should expose the request and vehicle tables");

        assert_eq!(app.channel_mode, "mailbox");
        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_when_webhook_channel_lacks_a_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                notifier_channel: Some(ChannelMode::Webhook),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("notifier.webhook_url"));
    }
}
