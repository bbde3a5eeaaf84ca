//! SQL Server connection.
//!
//! A single TDS connection is opened at startup and held for the life of the
//! process. Statements run one at a time; concurrent callers queue on the
//! connection mutex. No pooling, no explicit transactions.

use crate::db::SqlRunner;
use crate::db::types::row_to_record;
use crate::error::{AgentResult, ConfigError};
use crate::models::ResultSet;
use async_trait::async_trait;
use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

type TdsClient = Client<Compat<TcpStream>>;

/// Placeholder in the connection-string template replaced by the database password.
pub const PASSWORD_PLACEHOLDER: &str = "{your_password_here}";

/// Substitute the password into a connection-string template.
pub fn render_connection_string(template: &str, password: &str) -> String {
    template.replace(PASSWORD_PLACEHOLDER, password)
}

/// Parse an ADO/ODBC style `key=value;...` connection string.
pub fn parse_connection_string(connection_string: &str) -> Result<Config, ConfigError> {
    Config::from_ado_string(connection_string).map_err(|e| ConfigError::InvalidConnectionString {
        message: e.to_string(),
    })
}

pub struct MssqlClient {
    client: Mutex<TdsClient>,
}

impl MssqlClient {
    /// Open the connection described by `connection_string`.
    pub async fn connect(connection_string: &str) -> AgentResult<Self> {
        let config = parse_connection_string(connection_string)?;
        let addr = config.get_addr();
        info!(addr = %addr, "Connecting to SQL Server");

        let tcp = TcpStream::connect(addr).await?;
        tcp.set_nodelay(true)?;
        let client = Client::connect(config, tcp.compat_write()).await?;

        info!("Connected to SQL Server");
        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

#[async_trait]
impl SqlRunner for MssqlClient {
    async fn run_sql(&self, sql: &str) -> AgentResult<ResultSet> {
        debug!(sql = %sql, "Running SQL");
        let mut client = self.client.lock().await;
        let mut stream = client.simple_query(sql).await?;
        let columns = stream
            .columns()
            .await?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect::<Vec<_>>())
            .unwrap_or_default();
        let rows = stream.into_first_result().await?;

        let records = rows
            .into_iter()
            .map(|row| row_to_record(&columns, row))
            .collect::<Vec<_>>();

        debug!(rows = records.len(), "SQL returned");
        Ok(ResultSet::new(columns, records))
    }
}
