use crate::config::{Config, ErrorStatusMode};
use crate::mysql::MySqlConnector;
use crate::session::{ConnectionParams, Connector};
use tracing::{debug, info};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3306;
const DEFAULT_USER: &str = "root@localhost";
const DEFAULT_DATABASE: &str = "test";

pub struct AppState<C> {
    pub connector: C,
    // Copied into every connect call; no connection is held here
    pub params: ConnectionParams,
    pub error_status: ErrorStatusMode,
}

impl<C: Connector> AppState<C> {
    pub fn new(connector: C, params: ConnectionParams, error_status: ErrorStatusMode) -> Self {
        AppState {
            connector,
            params,
            error_status,
        }
    }
}

impl AppState<MySqlConnector> {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let params = connection_params(cfg)?;
        info!(
            "Target database: {}@{}:{}/{}",
            params.user, params.host, params.port, params.database
        );

        let error_status = cfg.error_status.unwrap_or_default();
        debug!("Error status mode: {:?}", error_status);

        Ok(AppState::new(MySqlConnector, params, error_status))
    }
}

pub fn connection_params(cfg: &Config) -> anyhow::Result<ConnectionParams> {
    let db = &cfg.database;
    let params = ConnectionParams {
        host: db.host.clone().unwrap_or_else(|| DEFAULT_HOST.into()),
        port: db.port.unwrap_or(DEFAULT_PORT),
        user: db.user.clone().unwrap_or_else(|| DEFAULT_USER.into()),
        password: db.password.clone().unwrap_or_default(),
        database: db.database.clone().unwrap_or_else(|| DEFAULT_DATABASE.into()),
    };

    for (field, value) in [
        ("host", &params.host),
        ("user", &params.user),
        ("database", &params.database),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("Invalid database config: '{}' must not be empty", field);
        }
    }
    Ok(params)
}
