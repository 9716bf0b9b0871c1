use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{validate_schema_name, DatabaseConfig};
use crate::error::Result;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
    schema: Option<String>,
}

impl DatabaseManager {
    /// Open a pool against the configured database.
    ///
    /// When a schema is configured every pooled connection gets
    /// `search_path = <schema>, public`, so unqualified table names resolve
    /// inside that schema.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT);

        if let Some(schema) = &config.schema {
            validate_schema_name(schema)?;
            let set_search_path = format!("SET search_path TO {schema}, public");
            options = options.after_connect(move |conn, _meta| {
                let statement = set_search_path.clone();
                Box::pin(async move {
                    conn.execute(statement.as_str()).await?;
                    Ok(())
                })
            });
        }

        let pool = options.connect_with(config.connect_options()?).await?;

        info!(
            database = %config.display_url(),
            schema = ?config.schema,
            "Connected to PostgreSQL"
        );

        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
        debug!("PostgreSQL pool closed");
    }
}
