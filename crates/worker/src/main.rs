use std::sync::Arc;

use anyhow::Context;
use keystone_db::repositories::TaskQueueRepo;
use keystone_engine::{TaskRouter, TaskWorker};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keystone_worker::config::WorkerConfig;
use keystone_worker::processors;
use keystone_worker::queue::PgTaskSource;

const ABANDONED_TASK_MESSAGE: &str = "Worker stopped before the task completed";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keystone_worker=debug,keystone_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env()?;
    tracing::info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        unhandled_task_policy = ?config.unhandled_task_policy,
        "Loaded worker configuration",
    );

    let pool = keystone_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    keystone_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let abandoned = TaskQueueRepo::reset_in_progress(&pool, ABANDONED_TASK_MESSAGE)
        .await
        .context("Failed to reset abandoned tasks")?;
    if abandoned > 0 {
        tracing::warn!(count = abandoned, "Failed tasks abandoned by a previous worker");
    }

    // A task type claimed twice is a configuration error: refuse to start.
    let router = TaskRouter::build(processors::all(&pool), config.unhandled_task_policy)
        .context("Invalid task processor configuration")?;

    let worker = TaskWorker::new(Arc::new(router), PgTaskSource::new(pool))
        .with_poll_interval(config.poll_interval);

    let cancel = CancellationToken::new();
    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { worker.run(cancel).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install Ctrl-C handler")?;
    tracing::info!("Received SIGINT (Ctrl-C), stopping worker");
    cancel.cancel();

    let stats = handle.await.context("Worker task panicked")?;
    tracing::info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        unhandled = stats.unhandled,
        "Worker stopped",
    );
    Ok(())
}
