use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Database {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

/// How a failed query is reflected in the HTTP status line.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusMode {
    /// Failures are still answered with 200; only the body carries the error.
    #[default]
    Verbatim,
    /// Connect failures answer 503, query failures 500.
    Mapped,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub listen: Option<String>,
    // Path the row dump route is mounted on. Defaults to `/`.
    pub route: Option<String>,
    // Defaults to `verbatim`.
    pub error_status: Option<ErrorStatusMode>,
    #[serde(default)]
    pub database: Database,
}

/// Location of the TOML config: `ROW_DUMP_CONFIG`, or `config.toml` in the
/// working directory.
pub fn config_path<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("ROW_DUMP_CONFIG")
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "config.toml".into())
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let cfg_str = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read config file '{}': {}", path, e))?;
        let mut cfg: Config = toml::from_str(&cfg_str)?;
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Overlay `ROW_DUMP_DB_*` values on top of the `[database]` table.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("ROW_DUMP_DB_HOST") {
            self.database.host = Some(host);
        }
        if let Some(port) = lookup("ROW_DUMP_DB_PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid ROW_DUMP_DB_PORT '{}': {}", port, e))?;
            self.database.port = Some(port);
        }
        if let Some(user) = lookup("ROW_DUMP_DB_USER") {
            self.database.user = Some(user);
        }
        if let Some(password) = lookup("ROW_DUMP_DB_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(name) = lookup("ROW_DUMP_DB_NAME") {
            self.database.database = Some(name);
        }
        Ok(())
    }
}
