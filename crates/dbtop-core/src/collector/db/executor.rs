//! Query transports.

use std::path::PathBuf;
use std::process::Command;

use postgres::{Client, Config, NoTls, SimpleQueryMessage};
use tracing::{debug, info};

use super::{Query, QueryError, Rows};

/// Connection parameters shared by both transports.
///
/// Unset fields are left to libpq-style defaults of the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub password: Option<String>,
}

impl ConnectionParams {
    /// Driver configuration. Values are passed as-is, so no quoting is involved.
    pub fn to_config(&self) -> Config {
        let user = self
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "postgres".to_string());
        let mut config = Config::new();
        config
            .host(self.host.as_deref().unwrap_or("localhost"))
            .port(self.port.unwrap_or(5432))
            .user(&user)
            .dbname(self.database.as_deref().unwrap_or(&user))
            .application_name("dbtop");
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            config.password(password);
        }
        config
    }

    /// Connection flags for `psql`-compatible clients.
    pub fn client_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(database) = &self.database {
            args.extend(["-d".to_string(), database.clone()]);
        }
        if let Some(user) = &self.user {
            args.extend(["-U".to_string(), user.clone()]);
        }
        if let Some(host) = &self.host {
            args.extend(["-h".to_string(), host.clone()]);
        }
        if let Some(port) = self.port {
            args.extend(["-p".to_string(), port.to_string()]);
        }
        args
    }
}

/// Native protocol executor built on the `postgres` crate.
///
/// Connects lazily and drops the client after any error so the next cycle reconnects.
pub struct PgExecutor {
    config: Config,
    client: Option<Client>,
}

impl PgExecutor {
    pub fn new(params: &ConnectionParams) -> Self {
        Self {
            config: params.to_config(),
            client: None,
        }
    }

    fn ensure_connected(&mut self) -> Result<&mut Client, QueryError> {
        if self.client.is_none() {
            let client = self
                .config
                .connect(NoTls)
                .map_err(|e| QueryError::Connection(format_postgres_error(&e)))?;
            info!("connected to database");
            self.client = Some(client);
        }
        self.client
            .as_mut()
            .ok_or_else(|| QueryError::Connection("not connected".to_string()))
    }
}

impl super::QueryExecutor for PgExecutor {
    fn execute(&mut self, query: &Query) -> Result<Rows, QueryError> {
        let client = self.ensure_connected()?;
        match client.simple_query(&query.sql) {
            Ok(messages) => Ok(messages
                .into_iter()
                .filter_map(|m| match m {
                    SimpleQueryMessage::Row(row) => Some(
                        (0..row.len())
                            .map(|i| row.get(i).unwrap_or("").to_string())
                            .collect(),
                    ),
                    _ => None,
                })
                .collect()),
            Err(e) => {
                let closed = client.is_closed();
                self.client = None;
                let msg = format_postgres_error(&e);
                if closed {
                    Err(QueryError::Connection(msg))
                } else {
                    Err(QueryError::Query(msg))
                }
            }
        }
    }
}

pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else {
            msg
        }
    }
}

/// Executor that shells out to a command-line client (`gsql`, `psql`).
///
/// Runs `<program> -X -t -A -F | -c <sql>` and splits each non-empty output line on `|`.
/// The password is passed via `PGPASSWORD`, never on the command line.
#[derive(Debug, Clone)]
pub struct CliExecutor {
    program: PathBuf,
    params: ConnectionParams,
}

impl CliExecutor {
    pub fn new(program: impl Into<PathBuf>, params: ConnectionParams) -> Self {
        Self {
            program: program.into(),
            params,
        }
    }

    fn command(&self, sql: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-X", "-t", "-A", "-F", "|", "-c", sql])
            .args(self.params.client_args());
        if let Some(password) = self.params.password.as_deref().filter(|p| !p.is_empty()) {
            cmd.env("PGPASSWORD", password);
        }
        cmd
    }
}

impl super::QueryExecutor for CliExecutor {
    fn execute(&mut self, query: &Query) -> Result<Rows, QueryError> {
        let program = self.program.display().to_string();
        debug!(program = %program, kind = ?query.kind, "running query via client");

        let output = self
            .command(&query.sql)
            .output()
            .map_err(|source| QueryError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(QueryError::ClientExit {
                program,
                status: output.status.to_string(),
                stderr: if stderr.is_empty() {
                    "no error output".to_string()
                } else {
                    stderr
                },
            });
        }

        Ok(split_unaligned(
            &String::from_utf8_lossy(&output.stdout),
            query.columns,
        ))
    }
}

/// Splits unaligned `|`-separated output. Separators past the last column stay in the text.
fn split_unaligned(stdout: &str, columns: usize) -> Rows {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            if columns > 0 {
                line.splitn(columns, '|').map(str::to_string).collect()
            } else {
                line.split('|').map(str::to_string).collect()
            }
        })
        .collect()
}
