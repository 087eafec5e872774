// backupper/src/backup/resolver.rs
use crate::backup::dump_command::DumpAdapter;
use crate::config::TargetConfig;
use crate::errors::{BackupError, Result};
use crate::utils::check_dir;
use std::path::PathBuf;

/// Everything the executor needs for one target, fully validated. Resolution
/// either produces this or the first failing check, never a partial value.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub adapter: DumpAdapter,
    /// Remote address in `[username@]host[:port]` form.
    pub url: String,
    /// Remote-shell password; key-based auth when absent.
    pub password: Option<String>,
    pub database: String,
    pub db_username: String,
    pub db_password: Option<String>,
    pub dump_options: Option<String>,
    /// Validated (and created, if needed) local dump directory.
    pub outdir: PathBuf,
    /// Secondary copy directory, re-validated at copy time.
    pub extra_copy: Option<PathBuf>,
}

/// Merges a target section over the `default` section field by field and
/// validates the result. Directory creation is the only side effect.
pub fn resolve(defaults: &TargetConfig, target: &TargetConfig) -> Result<ResolvedTarget> {
    let merged = merge(defaults, target);

    let outdir = merged
        .dump
        .as_deref()
        .and_then(check_dir)
        .ok_or_else(|| validation("Invalid directory where to save database dump"))?;
    let database = merged
        .database
        .ok_or_else(|| validation("Please specify the database name!"))?;
    let host = merged
        .host
        .ok_or_else(|| validation("Please specify the host!"))?;

    // IPv6 hosts get bracketed when a port follows, keeping the address
    // unambiguous for the transport.
    let mut url = if merged.port.is_some() && host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host
    };
    if let Some(username) = &merged.username {
        url = format!("{}@{}", username, url);
    }
    if let Some(port) = merged.port {
        url = format!("{}:{}", url, port);
    }

    let adapter = DumpAdapter::parse(merged.adapter.as_deref().unwrap_or("mysql"))?;

    Ok(ResolvedTarget {
        adapter,
        url,
        password: merged.password,
        database,
        db_username: merged.db_username.unwrap_or_else(|| "root".to_string()),
        db_password: merged.db_password,
        dump_options: merged.dump_options,
        outdir,
        extra_copy: merged.extra_copy,
    })
}

fn validation(message: &str) -> BackupError {
    BackupError::Validation(message.to_string())
}

/// Target-specific values win over defaults, per field.
fn merge(defaults: &TargetConfig, target: &TargetConfig) -> TargetConfig {
    TargetConfig {
        adapter: target.adapter.clone().or_else(|| defaults.adapter.clone()),
        host: target.host.clone().or_else(|| defaults.host.clone()),
        port: target.port.or(defaults.port),
        username: target.username.clone().or_else(|| defaults.username.clone()),
        password: target.password.clone().or_else(|| defaults.password.clone()),
        database: target.database.clone().or_else(|| defaults.database.clone()),
        db_username: target
            .db_username
            .clone()
            .or_else(|| defaults.db_username.clone()),
        db_password: target
            .db_password
            .clone()
            .or_else(|| defaults.db_password.clone()),
        dump_options: target
            .dump_options
            .clone()
            .or_else(|| defaults.dump_options.clone()),
        dump: target.dump.clone().or_else(|| defaults.dump.clone()),
        extra_copy: target
            .extra_copy
            .clone()
            .or_else(|| defaults.extra_copy.clone()),
        disabled: target.disabled.or(defaults.disabled),
    }
}
