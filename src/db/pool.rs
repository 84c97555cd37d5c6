use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

// Analytics queries are few but heavy; a small pool with a short acquire
// timeout keeps a saturated database from queueing dashboard requests.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created");

    Ok(pool)
}
