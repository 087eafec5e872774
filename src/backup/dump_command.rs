// backupper/src/backup/dump_command.rs
use crate::errors::{BackupError, Result};

/// Database engines we know how to dump. Closed set: an adapter name outside
/// this enum is an error at resolution time, never a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpAdapter {
    Mysql,
    Postgresql,
}

impl DumpAdapter {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "mysql" => Ok(DumpAdapter::Mysql),
            "postgresql" => Ok(DumpAdapter::Postgresql),
            other => Err(BackupError::UnsupportedAdapter(other.to_string())),
        }
    }

    /// Builds the dump-and-compress pipeline to run on the remote host.
    ///
    /// Pure string construction. The caller must run it with pipe-failure
    /// propagation enabled (`set -o pipefail`), otherwise a failed dump is
    /// masked by bzip2 exiting 0.
    pub fn build_command(
        &self,
        database: &str,
        username: &str,
        password: Option<&str>,
        dump_options: Option<&str>,
        outfile: &str,
    ) -> String {
        match self {
            DumpAdapter::Mysql => {
                let mut params = vec![format!("-u{}", sh_quote(username))];
                if let Some(pass) = password {
                    params.push(format!("-p{}", sh_quote(pass)));
                }
                if let Some(opts) = dump_options {
                    params.push(opts.to_string());
                }
                format!(
                    "mysqldump {} {} | bzip2 > {}",
                    sh_quote(database),
                    params.join(" "),
                    sh_quote(outfile)
                )
            }
            DumpAdapter::Postgresql => {
                let mut params = vec![format!("-U {}", sh_quote(username))];
                if let Some(opts) = dump_options {
                    params.push(opts.to_string());
                }
                // pg_dump reads the password from the environment, not argv.
                let env = password
                    .map(|pass| format!("PGPASSWORD={} ", sh_quote(pass)))
                    .unwrap_or_default();
                format!(
                    "{}pg_dump {} {} | bzip2 > {}",
                    env,
                    sh_quote(database),
                    params.join(" "),
                    sh_quote(outfile)
                )
            }
        }
    }
}

/// Single-quotes a value for the remote shell, escaping embedded quotes so a
/// hostile config value cannot break out of its argument.
pub(crate) fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
