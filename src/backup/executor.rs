// backupper/src/backup/executor.rs
use crate::backup::dump_command::sh_quote;
use crate::backup::resolver::ResolvedTarget;
use crate::errors::Result;
use crate::remote::RemoteTransport;
use crate::report::BackupArtifact;
use crate::utils::{check_dir, round2};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs the full pipeline for one resolved target: remote dump, download,
/// remote cleanup, optional extra copy, size/duration measurement.
///
/// The three remote steps are sequential and must all succeed. If the
/// download fails the remote temp file is leaked; cleanup is best-effort
/// after the transfer, not guaranteed.
pub fn execute(
    key: &str,
    target: &ResolvedTarget,
    transport: &dyn RemoteTransport,
) -> Result<BackupArtifact> {
    let filename = format!("{}__{}.sql.bz2", key, target.database);
    let tempfile = format!("/tmp/{}", filename);
    // Timestamp taken at call time so runs a second apart never collide.
    let dumpname = format!("{}__{}", Local::now().format("%Y-%m-%d_%H-%M-%S"), filename);
    let path = target.outdir.join(&dumpname);

    let started = Instant::now();

    let mut session = transport.connect(&target.url, target.password.as_deref())?;
    let dump = target.adapter.build_command(
        &target.database,
        &target.db_username,
        target.db_password.as_deref(),
        target.dump_options.as_deref(),
        &tempfile,
    );
    // pipefail keeps a failed dump from being masked by bzip2 exiting 0.
    session.execute(&format!("set -o pipefail; {}", dump))?;
    session.download(&tempfile, &path)?;
    session.execute(&format!("rm {}", sh_quote(&tempfile)))?;

    let extra_copy = match target.extra_copy.as_deref().and_then(check_dir) {
        Some(dir) => {
            let copy_path = dir.join(&dumpname);
            fs::copy(&path, &copy_path)?;
            Some(absolute(&copy_path)?)
        }
        None => None,
    };

    let size = fs::metadata(&path)?.len();
    Ok(BackupArtifact {
        path: absolute(&path)?,
        size_mb: round2(size as f64 / (1u64 << 20) as f64),
        elapsed_secs: round2(started.elapsed().as_secs_f64()),
        extra_copy,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
