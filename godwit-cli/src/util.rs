//! Small CLI helpers.

use anyhow::{anyhow, Result};
use url::Url;

use godwit_core::Config;

/// Fold a database URL into the configuration.
pub fn apply_url(config: &mut Config, url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)?;
    let subprotocol = match url.scheme() {
        "postgres" | "postgresql" => "postgresql",
        "mysql" | "mariadb" => "mysql",
        "h2" => "h2",
        "sqlserver" | "mssql" => "sqlserver",
        other => return Err(anyhow!("Unsupported database scheme: {}", other)),
    };
    config.db.subprotocol = subprotocol.to_string();
    if let Some(host) = url.host_str() {
        config.db.host = host.to_string();
    }
    config.db.port = url.port();
    let database = url.path().trim_start_matches('/');
    if !database.is_empty() {
        config.db.database = Some(database.to_string());
    }
    if !url.username().is_empty() {
        config.db.user = Some(url.username().to_string());
    }
    if let Some(password) = url.password() {
        config.db.password = Some(password.to_string());
    }
    Ok(())
}
