// backupper/src/backup/logic.rs
use crate::backup::{executor, resolver};
use crate::config::AppConfig;
use crate::remote::RemoteTransport;
use crate::report::{Report, TargetOutcome, mailer};
use chrono::Local;

/// Runs every enabled target in configuration order, optionally restricted
/// to the keys in `only`. One target failing never stops the batch: every
/// outcome lands in the returned report, and the report email goes out
/// best-effort once the loop is done. Nothing escapes this function.
pub fn run_backup_flow(
    config: &AppConfig,
    only: Option<&[String]>,
    transport: &dyn RemoteTransport,
) -> Report {
    let mut report = Report::new();

    for (key, target) in &config.targets {
        if let Some(keys) = only {
            if !keys.iter().any(|k| k == key) {
                continue;
            }
        }

        println!("[{}] ⬇️  backing up {}...", Local::now(), key);

        let resolved = match resolver::resolve(&config.defaults, target) {
            Ok(resolved) => resolved,
            Err(e) => {
                eprintln!("❌ {}", e);
                report.record(key, TargetOutcome::Failed(e.to_string()));
                continue;
            }
        };

        match executor::execute(key, &resolved, transport) {
            Ok(artifact) => report.record(key, TargetOutcome::Success(artifact)),
            Err(e) => {
                eprintln!("❌ {}", e);
                report.record(key, TargetOutcome::Failed(e.to_string()));
            }
        }
    }

    mailer::deliver(&report, &config.mailer);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;
    use crate::errors::{BackupError, Result};
    use crate::remote::RemoteSession;
    use std::cell::RefCell;
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    /// Fake transport that records connection attempts and every command the
    /// executor sends, and serves a fixed payload for every download.
    struct FakeTransport {
        connects: RefCell<Vec<String>>,
        commands: Rc<RefCell<Vec<String>>>,
        fail_connect_to: Option<String>,
        fail_execute: bool,
    }

    impl FakeTransport {
        fn new() -> Self {
            FakeTransport {
                connects: RefCell::new(Vec::new()),
                commands: Rc::new(RefCell::new(Vec::new())),
                fail_connect_to: None,
                fail_execute: false,
            }
        }

        fn failing_for(url: &str) -> Self {
            FakeTransport {
                fail_connect_to: Some(url.to_string()),
                ..FakeTransport::new()
            }
        }

        fn failing_execute() -> Self {
            FakeTransport {
                fail_execute: true,
                ..FakeTransport::new()
            }
        }
    }

    impl RemoteTransport for FakeTransport {
        fn connect(&self, url: &str, _password: Option<&str>) -> Result<Box<dyn RemoteSession>> {
            self.connects.borrow_mut().push(url.to_string());
            if self.fail_connect_to.as_deref() == Some(url) {
                return Err(BackupError::Connection(
                    url.to_string(),
                    "connection refused".to_string(),
                ));
            }
            Ok(Box::new(FakeSession {
                commands: Rc::clone(&self.commands),
                fail_execute: self.fail_execute,
            }))
        }
    }

    struct FakeSession {
        commands: Rc<RefCell<Vec<String>>>,
        fail_execute: bool,
    }

    impl RemoteSession for FakeSession {
        fn execute(&mut self, command: &str) -> Result<()> {
            self.commands.borrow_mut().push(command.to_string());
            if self.fail_execute {
                return Err(BackupError::Command {
                    status: 2,
                    stderr: "mysqldump: Got error: 1045".to_string(),
                });
            }
            Ok(())
        }

        fn download(&mut self, _remote_path: &str, local_path: &Path) -> Result<()> {
            let mut file = File::create(local_path)?;
            file.write_all(b"BZh91AY&SY fake dump")?;
            Ok(())
        }
    }

    fn target(host: &str, database: &str, dump: PathBuf) -> TargetConfig {
        TargetConfig {
            host: Some(host.to_string()),
            database: Some(database.to_string()),
            dump: Some(dump),
            ..TargetConfig::default()
        }
    }

    fn config_with(targets: Vec<(&str, TargetConfig)>) -> AppConfig {
        AppConfig {
            defaults: TargetConfig::default(),
            mailer: crate::config::MailerConfig::default(),
            targets: targets
                .into_iter()
                .map(|(k, t)| (k.to_string(), t))
                .collect(),
        }
    }

    #[test]
    fn one_report_entry_per_target_in_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_with(vec![
            ("db1", target("h1", "app", dir.path().to_path_buf())),
            ("db2", target("h2", "analytics", dir.path().to_path_buf())),
        ]);

        let transport = FakeTransport::new();
        let report = run_backup_flow(&config, None, &transport);

        let keys: Vec<&str> = report.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["db1", "db2"]);
        assert_eq!(report.success_count(), 2);
        Ok(())
    }

    #[test]
    fn validation_failure_skips_the_transport_entirely() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut broken = target("ignored", "app", dir.path().to_path_buf());
        broken.host = None;
        let config = config_with(vec![
            ("db1", broken),
            ("db2", target("h2", "analytics", dir.path().to_path_buf())),
        ]);

        let transport = FakeTransport::new();
        let report = run_backup_flow(&config, None, &transport);

        match report.get("db1") {
            Some(TargetOutcome::Failed(msg)) => {
                assert_eq!(msg, "Please specify the host!")
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // Only db2 ever reached the transport.
        assert_eq!(*transport.connects.borrow(), vec!["h2".to_string()]);
        assert_eq!(report.success_count(), 1);
        Ok(())
    }

    #[test]
    fn transport_failure_is_isolated_to_its_target() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_with(vec![
            ("db1", target("down", "app", dir.path().to_path_buf())),
            ("db2", target("up", "analytics", dir.path().to_path_buf())),
        ]);

        let transport = FakeTransport::failing_for("down");
        let report = run_backup_flow(&config, None, &transport);

        assert!(matches!(report.get("db1"), Some(TargetOutcome::Failed(_))));
        assert!(matches!(report.get("db2"), Some(TargetOutcome::Success(_))));
        assert_eq!(report.len(), 2);
        Ok(())
    }

    #[test]
    fn only_filter_restricts_but_keeps_config_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_with(vec![
            ("db1", target("h1", "a", dir.path().to_path_buf())),
            ("db2", target("h2", "b", dir.path().to_path_buf())),
            ("db3", target("h3", "c", dir.path().to_path_buf())),
        ]);

        let transport = FakeTransport::new();
        // Filter order deliberately reversed; iteration order must win.
        let only = vec!["db3".to_string(), "db1".to_string()];
        let report = run_backup_flow(&config, Some(&only), &transport);

        let keys: Vec<&str> = report.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["db1", "db3"]);
        Ok(())
    }

    #[test]
    fn dump_runs_under_pipefail_and_temp_file_is_removed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_with(vec![("db1", target("h1", "app", dir.path().to_path_buf()))]);

        let transport = FakeTransport::new();
        run_backup_flow(&config, None, &transport);

        let commands = transport.commands.borrow();
        assert_eq!(commands.len(), 2);
        // A dump that fails inside the pipe must not be masked by bzip2.
        assert!(commands[0].starts_with("set -o pipefail; mysqldump 'app'"));
        assert_eq!(commands[1], "rm '/tmp/db1__app.sql.bz2'");
        Ok(())
    }

    #[test]
    fn failing_remote_dump_is_a_failed_outcome() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_with(vec![("db1", target("h1", "app", dir.path().to_path_buf()))]);

        let transport = FakeTransport::failing_execute();
        let report = run_backup_flow(&config, None, &transport);

        match report.get("db1") {
            Some(TargetOutcome::Failed(msg)) => assert!(msg.contains("mysqldump")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn local_filename_starts_with_a_second_resolution_timestamp() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_with(vec![(
            "db2",
            target("h2", "mydb", dir.path().to_path_buf()),
        )]);

        let transport = FakeTransport::new();
        let report = run_backup_flow(&config, None, &transport);

        let artifact = match report.get("db2") {
            Some(TargetOutcome::Success(artifact)) => artifact,
            other => panic!("unexpected outcome: {:?}", other),
        };
        let name = artifact
            .path
            .file_name()
            .expect("dump has a filename")
            .to_string_lossy()
            .into_owned();
        // Second-resolution prefix keeps repeated runs from colliding.
        let (prefix, rest) = name.split_at(19);
        chrono::NaiveDateTime::parse_from_str(prefix, "%Y-%m-%d_%H-%M-%S")?;
        assert_eq!(rest, "__db2__mydb.sql.bz2");
        Ok(())
    }

    #[test]
    fn successful_run_records_artifact_details() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_with(vec![(
            "db2",
            target("h2", "mydb", dir.path().to_path_buf()),
        )]);

        let transport = FakeTransport::new();
        let report = run_backup_flow(&config, None, &transport);

        match report.get("db2") {
            Some(TargetOutcome::Success(artifact)) => {
                assert!(artifact.path.is_absolute());
                assert!(
                    artifact
                        .path
                        .to_string_lossy()
                        .ends_with("__db2__mydb.sql.bz2")
                );
                assert!(artifact.path.is_file());
                assert!(artifact.extra_copy.is_none());
                assert!(artifact.size_mb >= 0.0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn extra_copy_lands_next_to_the_dump_under_the_same_name() -> anyhow::Result<()> {
        let dump_dir = tempfile::tempdir()?;
        let copy_dir = tempfile::tempdir()?;
        let mut t = target("h1", "app", dump_dir.path().to_path_buf());
        t.extra_copy = Some(copy_dir.path().to_path_buf());
        let config = config_with(vec![("db1", t)]);

        let transport = FakeTransport::new();
        let report = run_backup_flow(&config, None, &transport);

        match report.get("db1") {
            Some(TargetOutcome::Success(artifact)) => {
                let copy = artifact.extra_copy.as_ref().expect("extra copy recorded");
                assert!(copy.is_file());
                assert_eq!(
                    copy.file_name(),
                    artifact.path.file_name(),
                    "copy keeps the dump's filename"
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        Ok(())
    }
}
