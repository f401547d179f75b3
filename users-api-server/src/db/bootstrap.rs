use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("database ping failed: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("database did not answer within {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Startup liveness check: one round trip, bounded by `timeout`.
pub async fn ensure_liveness(pool: &PgPool, timeout: Duration) -> Result<(), LivenessError> {
    tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(pool))
        .await
        .map_err(|_| LivenessError::TimedOut(timeout))??;

    info!("database connection verified");
    Ok(())
}
