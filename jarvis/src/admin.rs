//! Administrative operations: snapshots and migration
//!
//! Snapshots are gzipped tarballs of the server's data directory, produced
//! and unpacked with the system `tar`. Migration copies every resource of one
//! kind from one environment's API into another's.

use chrono::{DateTime, Utc};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, PostOptions};
use crate::record::{Record, ResourceKind};

/// Field dropped from records before they are re-created elsewhere
const MIGRATION_STRIPPED_FIELD: &str = "version";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Snapshot does not exist: {0}")]
    MissingSnapshot(PathBuf),

    #[error("Data directory has no parent or name: {0}")]
    InvalidDataDirectory(PathBuf),

    #[error("Failed to run tar: {0}")]
    Spawn(#[source] io::Error),

    #[error("tar exited with {status}: {output}")]
    Tar { status: String, output: String },
}

/// `jarvis_snapshot_{environment}_{UTC timestamp}.tar.gz`
pub fn snapshot_name(environment: &str, at: DateTime<Utc>) -> String {
    format!("jarvis_snapshot_{}_{}.tar.gz", environment, at.format("%Y%m%d%H%M%S"))
}

fn split_data_directory(data_directory: &Path) -> Result<(PathBuf, PathBuf), AdminError> {
    let invalid = || AdminError::InvalidDataDirectory(data_directory.to_path_buf());
    let name = data_directory.file_name().ok_or_else(invalid)?;
    let parent = data_directory.parent().ok_or_else(invalid)?;
    Ok((parent.to_path_buf(), PathBuf::from(name)))
}

fn run_tar(args: &[&OsStr]) -> Result<(), AdminError> {
    debug!(?args, "run_tar: called");
    let output = Command::new("tar").args(args).output().map_err(AdminError::Spawn)?;
    if output.status.success() {
        return Ok(());
    }
    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Err(AdminError::Tar {
        status: output.status.to_string(),
        output: text.trim().to_string(),
    })
}

/// Tar up `data_directory` into `snapshots_directory`
///
/// A partially written tarball is removed when `tar` fails.
pub fn create_snapshot(
    environment: &str,
    data_directory: &Path,
    snapshots_directory: &Path,
    at: DateTime<Utc>,
) -> Result<PathBuf, AdminError> {
    let snapshot = snapshots_directory.join(snapshot_name(environment, at));
    let (parent, name) = split_data_directory(data_directory)?;

    let result = run_tar(&[
        OsStr::new("-czf"),
        snapshot.as_os_str(),
        OsStr::new("-C"),
        parent.as_os_str(),
        name.as_os_str(),
    ]);

    match result {
        Ok(()) => {
            info!(snapshot = %snapshot.display(), "create_snapshot: written");
            Ok(snapshot)
        }
        Err(e) => {
            if snapshot.exists()
                && let Err(remove) = fs::remove_file(&snapshot)
            {
                warn!(snapshot = %snapshot.display(), error = %remove, "create_snapshot: failed to remove partial tarball");
            }
            Err(e)
        }
    }
}

/// Unpack `snapshot` next to `data_directory`, replacing its contents
pub fn restore_snapshot(snapshot: &Path, data_directory: &Path) -> Result<(), AdminError> {
    if !snapshot.is_file() {
        return Err(AdminError::MissingSnapshot(snapshot.to_path_buf()));
    }
    let (parent, _) = split_data_directory(data_directory)?;
    run_tar(&[OsStr::new("-xzf"), snapshot.as_os_str(), OsStr::new("-C"), parent.as_os_str()])?;
    info!(snapshot = %snapshot.display(), "restore_snapshot: restored");
    Ok(())
}

/// Outcome of a migration run
#[derive(Debug)]
pub struct MigrationReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<(String, ApiError)>,
    pub elapsed: Duration,
}

impl MigrationReport {
    /// `#attempted: N, #succeeded: M, elapsed: Xs`
    pub fn summary(&self) -> String {
        format!(
            "#attempted: {}, #succeeded: {}, elapsed: {:.3}s",
            self.attempted,
            self.succeeded,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Record as it should be re-created in another environment
pub fn migration_request(record: &Record) -> Record {
    let mut request = record.clone();
    request.remove(MIGRATION_STRIPPED_FIELD);
    request
}

/// Copy every resource of `kind` from `source` into `target`
///
/// Reading the source must succeed completely; individual creation failures
/// on the target are collected in the report. Tags skip the server's tag
/// check since tag relations can be circular.
pub fn migrate(source: &ApiClient, target: &ApiClient, kind: ResourceKind) -> Result<MigrationReport, ApiError> {
    info!(%kind, from = %source.base_url(), to = %target.base_url(), "migrate: called");
    let records = source.query(kind, &[]).into_result()?;
    let options = PostOptions {
        skip_tags_check: kind == ResourceKind::Tag,
    };

    let start = Instant::now();
    let mut succeeded = 0;
    let mut failed = Vec::new();
    for record in &records {
        let id = kind.id_of(record).unwrap_or_default();
        match target.post(kind, &migration_request(record), options) {
            Ok(_) => succeeded += 1,
            Err(e) => {
                warn!(%kind, %id, error = %e, "migrate: failed to create");
                failed.push((id, e));
            }
        }
    }

    let report = MigrationReport {
        attempted: records.len(),
        succeeded,
        failed,
        elapsed: start.elapsed(),
    };
    info!(attempted = report.attempted, succeeded = report.succeeded, "migrate: done");
    Ok(report)
}
