/// Reversal of organize runs.
///
/// The most recent move log in a directory is replayed backwards: every file
/// still at its `new` path is moved back to its `original` path, and only
/// then are the folders the run created removed if they ended up empty.
use crate::error::{TidyError, TidyResult, ensure_directory};
use crate::move_log::{LogKind, MoveLog, MoveLogEntry};
use crate::mover;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// Which log was reversed.
    pub kind: LogKind,
    /// The log file that was read.
    pub log_path: PathBuf,
    /// Entries whose file is back at its original path.
    pub restored: Vec<MoveLogEntry>,
    /// Entries whose file was no longer at its `new` path.
    pub skipped: Vec<(PathBuf, String)>,
    /// Entries whose move back failed; the file is still at `new`.
    pub failed: Vec<(PathBuf, String)>,
    /// Empty folders removed after the files were restored.
    pub removed_dirs: Vec<PathBuf>,
    /// True if the log was kept (rewritten with the failed entries) for a retry.
    pub log_retained: bool,
}

impl UndoReport {
    fn new(kind: LogKind, log_path: PathBuf) -> Self {
        Self {
            kind,
            log_path,
            restored: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            removed_dirs: Vec::new(),
            log_retained: false,
        }
    }

    /// Returns the total number of log entries processed.
    pub fn total_processed(&self) -> usize {
        self.restored.len() + self.failed.len() + self.skipped.len()
    }

    /// Returns true if every logged file was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Manages undo operations for file organization.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent organize run in `dir`.
    ///
    /// When both `undo_log.json` and `date_sort_log.json` exist, the one
    /// written last is reversed. Entries are replayed newest first; a file
    /// that is missing or cannot be moved back is reported and skipped.
    /// After the replay, each entry's destination folder is removed if empty,
    /// and for date logs its year folder too.
    ///
    /// Entries whose `original` or `new` path lies outside `dir` are never
    /// moved; they count as failed.
    ///
    /// The log is deleted afterwards. If some files could not be moved back,
    /// the log is instead rewritten to hold just those entries so the undo
    /// can be retried.
    ///
    /// # Errors
    ///
    /// * `DirectoryNotFound` if `dir` is not a directory
    /// * `NoLogFound` if neither log exists (nothing is touched)
    /// * `CorruptLog` if the log does not parse (nothing is touched, the log
    ///   stays)
    /// * `ReversalFailed` if the log cannot be deleted or rewritten afterwards
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidydir::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/directory")) {
    ///     Ok(report) => println!("Restored {} files", report.restored.len()),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(dir: &Path) -> TidyResult<UndoReport> {
        ensure_directory(dir)?;

        let (kind, log_path) = MoveLog::locate(dir).ok_or_else(|| TidyError::NoLogFound {
            dir: dir.to_path_buf(),
        })?;
        let log = MoveLog::load(kind, &log_path)?;
        let root = fs::canonicalize(dir).map_err(|_| TidyError::DirectoryNotFound {
            path: dir.to_path_buf(),
        })?;
        info!(log = %log_path.display(), entries = log.len(), "reverting {}", kind);

        let mut report = UndoReport::new(kind, log_path);
        let mut retry = MoveLog::new(kind);

        // Newest move first.
        for entry in log.entries.iter().rev() {
            if !is_inside(&root, &entry.new) || !is_inside(&root, &entry.original) {
                warn!(
                    from = %entry.new.display(),
                    to = %entry.original.display(),
                    "log entry points outside {}, not moving it",
                    root.display()
                );
                report.failed.push((
                    entry.new.clone(),
                    format!("Path outside {}", root.display()),
                ));
                retry.push(entry.clone());
                continue;
            }

            if !mover::occupied(&entry.new) {
                warn!(path = %entry.new.display(), "file not found at logged location, skipping");
                report.skipped.push((
                    entry.new.clone(),
                    "File not found at expected location".to_string(),
                ));
                continue;
            }

            match mover::move_file(&entry.new, &entry.original) {
                Ok(()) => {
                    info!(from = %entry.new.display(), to = %entry.original.display(), "restored");
                    report.restored.push(entry.clone());
                }
                Err(e) => {
                    warn!("{}", e);
                    report.failed.push((entry.new.clone(), e.to_string()));
                    retry.push(entry.clone());
                }
            }
        }

        report.removed_dirs = Self::prune_empty_dirs(&root, &log);

        if retry.is_empty() {
            MoveLog::remove(&report.log_path).map_err(|e| TidyError::ReversalFailed {
                log: report.log_path.clone(),
                reason: e.to_string(),
            })?;
        } else {
            // Back to recorded order.
            retry.entries.reverse();
            retry
                .save(dir)
                .map_err(|e| TidyError::ReversalFailed {
                    log: report.log_path.clone(),
                    reason: e.to_string(),
                })?;
            report.log_retained = true;
        }

        Ok(report)
    }

    /// Removes now-empty folders created by the reversed run.
    ///
    /// Walks up from each entry's `new` parent as many levels as the log kind
    /// nests (one for type logs, two for date logs). Only strict descendants
    /// of `root` are ever removed, and only when empty.
    fn prune_empty_dirs(root: &Path, log: &MoveLog) -> Vec<PathBuf> {
        let mut removed = Vec::new();

        for entry in &log.entries {
            let mut current = entry.new.parent();
            for _ in 0..log.kind.folder_depth() {
                let Some(folder) = current else { break };
                if !is_inside(root, folder) {
                    break;
                }
                if is_empty_dir(folder) {
                    match fs::remove_dir(folder) {
                        Ok(()) => {
                            info!(dir = %folder.display(), "removed empty directory");
                            removed.push(folder.to_path_buf());
                        }
                        Err(e) => warn!(dir = %folder.display(), error = %e, "could not remove directory"),
                    }
                }
                current = folder.parent();
            }
        }

        removed
    }
}

/// Strict descendant of `root`, compared by path components.
fn is_inside(root: &Path, path: &Path) -> bool {
    path != root && path.starts_with(root)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
