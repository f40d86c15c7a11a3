//! Redshift backend over the Postgres wire protocol

use crate::error::{pg_error_message, DbError, DbResult};
use crate::traits::{Connector, Database, LoadDiagnostic, QueryResult};
use async_trait::async_trait;
use rsw_core::sql_utils::quote_ident;
use rsw_core::ConnectionParams;
use std::time::Duration;
use tokio_postgres::{Client, Config as PgConfig, NoTls, SimpleQueryMessage};

/// Idle time before TCP keepalive probes start
const KEEPALIVES_IDLE: Duration = Duration::from_secs(60);

/// Load errors raised by the most recent statement of the session
const LOAD_ERRORS_SQL: &str = "SELECT colname, line_number, err_reason \
     FROM stl_load_errors WHERE query = pg_last_query_id()";

/// Open Redshift connection
pub struct RedshiftBackend {
    client: Client,
}

impl RedshiftBackend {
    /// Wrap an already-connected client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn simple_query(&self, sql: &str) -> DbResult<Vec<SimpleQueryMessage>> {
        Ok(self.client.simple_query(sql).await?)
    }
}

#[async_trait]
impl Database for RedshiftBackend {
    async fn execute(&self, sql: &str) -> DbResult<u64> {
        let messages = self.simple_query(sql).await?;
        Ok(messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(n) => *n,
                _ => 0,
            })
            .sum())
    }

    async fn query(&self, sql: &str) -> DbResult<QueryResult> {
        let messages = self.simple_query(sql).await?;
        let mut result = QueryResult::default();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                if result.columns.is_empty() {
                    result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                result
                    .rows
                    .push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
            }
        }
        Ok(result)
    }

    async fn load_errors(&self) -> DbResult<Vec<LoadDiagnostic>> {
        let result = self.query(LOAD_ERRORS_SQL).await?;
        Ok(result
            .rows
            .iter()
            .map(|row| {
                let text = |i: usize| {
                    row.get(i)
                        .and_then(|v| v.as_deref())
                        .unwrap_or_default()
                        .trim()
                        .to_string()
                };
                LoadDiagnostic {
                    column: text(0),
                    line: text(1).parse().ok(),
                    reason: text(2),
                }
            })
            .collect())
    }

    fn db_type(&self) -> &'static str {
        "redshift"
    }
}

/// Opens Redshift connections from validated connection parameters
#[derive(Debug, Clone)]
pub struct RedshiftConnector {
    params: ConnectionParams,
}

impl RedshiftConnector {
    /// Create a connector, rejecting parameter sets with a missing field.
    pub fn new(params: ConnectionParams) -> DbResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    fn pg_config(&self) -> PgConfig {
        let p = &self.params;
        let mut pg = PgConfig::new();
        pg.host(p.host.as_deref().unwrap_or_default())
            .port(p.port_or_default())
            .dbname(p.database.as_deref().unwrap_or_default())
            .user(p.user.as_deref().unwrap_or_default())
            .password(p.password.as_deref().unwrap_or_default())
            .application_name("rsw")
            .keepalives(true)
            .keepalives_idle(KEEPALIVES_IDLE);
        pg
    }
}

#[async_trait]
impl Connector for RedshiftConnector {
    async fn connect(&self) -> DbResult<Box<dyn Database>> {
        log::info!("Connecting to {}...", self.describe());

        let (client, connection) = self
            .pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| DbError::ConnectionError(pg_error_message(&e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("Redshift connection error: {e}");
            }
        });

        let search_path = format!("SET search_path TO {};", quote_ident(self.params.schema_name()));
        client.simple_query(&search_path).await?;

        Ok(Box::new(RedshiftBackend::new(client)))
    }

    fn describe(&self) -> String {
        format!(
            "host '{}' port {} database '{}' schema '{}'",
            self.params.host.as_deref().unwrap_or_default(),
            self.params.port_or_default(),
            self.params.database.as_deref().unwrap_or_default(),
            self.params.schema_name()
        )
    }
}
