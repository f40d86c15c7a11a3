//! `testConnection` action

use crate::commands::common::UserError;
use anyhow::Result;
use rsw_core::AppConfig;
use rsw_db::{Connector, RedshiftConnector};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ConnectionStatus {
    pub(crate) status: &'static str,
}

pub(crate) async fn execute(config: &AppConfig) -> Result<ConnectionStatus> {
    // Missing parameters surface as themselves, not as a connection failure.
    let connector = RedshiftConnector::new(config.db.clone())?;
    check(&connector).await
}

/// Open one connection and run a trivial query on it. No retries.
pub(crate) async fn check(connector: &dyn Connector) -> Result<ConnectionStatus> {
    let probe = async {
        let conn = connector.connect().await?;
        conn.query("SELECT current_date").await
    };
    probe
        .await
        .map_err(|e| UserError(format!("Connection failed: '{e}'")))?;
    Ok(ConnectionStatus { status: "success" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsw_db::testing::{FlakyConnector, RecordingConnector, RecordingDatabase};
    use rsw_db::QueryResult;

    #[tokio::test]
    async fn test_check_succeeds() {
        let db = RecordingDatabase::new();
        db.respond_to(
            "current_date",
            QueryResult::single_column("date", &["2024-05-01"]),
        );

        let status = check(&RecordingConnector::new(db.clone())).await.unwrap();

        assert_eq!(status, ConnectionStatus { status: "success" });
        assert_eq!(db.statements(), vec!["SELECT current_date"]);
    }

    #[tokio::test]
    async fn test_check_failure_is_user_error() {
        let connector = FlakyConnector::new(1);

        let err = check(&connector).await.unwrap_err();

        assert!(err.is::<UserError>());
        assert!(err
            .to_string()
            .starts_with("Connection failed: '[D001] Database connection failed:"));
        assert_eq!(connector.attempt_count(), 1);
    }
}
