// backupper/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One named backup target. Every field is optional here; the resolver merges
/// each target over the `default` section and decides what is actually
/// required. The same shape doubles as the `default` section itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub adapter: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
    pub dump_options: Option<String>,
    pub dump: Option<PathBuf>,
    pub extra_copy: Option<PathBuf>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    pub from: Option<String>,
    pub to: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub authentication: Option<String>,
}

impl MailerConfig {
    /// Delivery needs at least from, to and password; address, port and
    /// authentication mode all have defaults.
    pub fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some() && self.password.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub defaults: TargetConfig,
    pub mailer: MailerConfig,
    /// Enabled targets in configuration-file order.
    pub targets: Vec<(String, TargetConfig)>,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        Self::parse(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })
    }

    /// Splits the top-level sections: `default` and `mailer` are reserved,
    /// everything else is a target. Targets marked `disabled` are dropped
    /// here, before any of them reaches the backup flow.
    fn parse(content: &str) -> Result<Self> {
        let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;

        let mut defaults = TargetConfig::default();
        let mut mailer = MailerConfig::default();
        let mut targets = Vec::new();

        for (key, value) in root {
            match key.as_str() {
                "default" => {
                    defaults = serde_json::from_value(value).context("Invalid 'default' section")?
                }
                "mailer" => {
                    mailer = serde_json::from_value(value).context("Invalid 'mailer' section")?
                }
                _ => {
                    let target: TargetConfig = serde_json::from_value(value)
                        .with_context(|| format!("Invalid configuration for target '{}'", key))?;
                    if target.disabled != Some(true) {
                        targets.push((key, target));
                    }
                }
            }
        }

        Ok(AppConfig {
            defaults,
            mailer,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "default": { "username": "deploy", "dump": "/var/backups" },
        "mailer": { "from": "backup@example.com", "to": "ops@example.com", "password": "hunter2" },
        "db1": { "host": "db1.example.com", "database": "app_production" },
        "db2": { "host": "db2.example.com", "database": "analytics", "disabled": true },
        "db3": { "host": "db3.example.com", "database": "blog", "adapter": "postgresql" }
    }"#;

    #[test]
    fn parse_splits_sections_and_keeps_target_order() -> Result<()> {
        let config = AppConfig::parse(SAMPLE)?;

        assert_eq!(config.defaults.username.as_deref(), Some("deploy"));
        assert_eq!(
            config.defaults.dump,
            Some(PathBuf::from("/var/backups"))
        );
        assert!(config.mailer.is_complete());

        let keys: Vec<&str> = config.targets.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["db1", "db3"]);
        Ok(())
    }

    #[test]
    fn parse_excludes_disabled_targets() -> Result<()> {
        let config = AppConfig::parse(SAMPLE)?;
        assert!(config.targets.iter().all(|(k, _)| k != "db2"));
        Ok(())
    }

    #[test]
    fn parse_tolerates_missing_default_and_mailer() -> Result<()> {
        let config = AppConfig::parse(r#"{ "only": { "host": "h", "database": "d" } }"#)?;
        assert!(config.defaults.host.is_none());
        assert!(!config.mailer.is_complete());
        assert_eq!(config.targets.len(), 1);
        Ok(())
    }

    #[test]
    fn mailer_without_password_is_incomplete() {
        let mailer = MailerConfig {
            from: Some("a@example.com".into()),
            to: Some("b@example.com".into()),
            ..MailerConfig::default()
        };
        assert!(!mailer.is_complete());
    }

    #[test]
    fn parse_rejects_malformed_target_section() {
        let result = AppConfig::parse(r#"{ "db1": { "port": "not-a-number" } }"#);
        assert!(result.is_err());
    }
}
