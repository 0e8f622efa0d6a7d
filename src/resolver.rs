/// Deletion of selected duplicates.
///
/// The caller decides, per duplicate group, which copies survive; this module
/// only carries the decision out and records what it deleted. Nothing here
/// prompts: [`Selection::parse`] turns the answer a front-end collected into
/// data.
use crate::duplicates::DuplicateGroups;
use crate::error::{TidyError, TidyResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Audit file written into the scanned directory after deletions.
pub const AUDIT_LOG_FILE: &str = "deleted_duplicates_log.json";

/// What to do with one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Delete nothing.
    #[default]
    KeepAll,
    /// Delete every copy.
    DeleteAll,
    /// Keep the copies at these zero-based positions, delete the rest.
    KeepIndices(BTreeSet<usize>),
}

/// Why an answer could not be turned into a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("'{0}' is not a file number")]
    NotANumber(String),
    #[error("file number {index} is out of range 1..={len}")]
    OutOfRange { index: usize, len: usize },
}

impl Selection {
    /// Parses a keep-selection for a group of `group_len` files.
    ///
    /// * `""` keeps everything
    /// * `"all"` (any case) deletes everything
    /// * `"1"` or `"1,3"` keeps those files, numbered from 1
    ///
    /// # Examples
    ///
    /// ```
    /// use tidydir::resolver::Selection;
    ///
    /// assert_eq!(Selection::parse("", 3), Ok(Selection::KeepAll));
    /// assert_eq!(Selection::parse("ALL", 3), Ok(Selection::DeleteAll));
    /// assert_eq!(
    ///     Selection::parse("1, 3", 3),
    ///     Ok(Selection::KeepIndices([0, 2].into_iter().collect()))
    /// );
    /// assert!(Selection::parse("4", 3).is_err());
    /// ```
    pub fn parse(input: &str, group_len: usize) -> Result<Self, SelectionError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Selection::KeepAll);
        }
        if input.eq_ignore_ascii_case("all") {
            return Ok(Selection::DeleteAll);
        }

        let mut keep = BTreeSet::new();
        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let index: usize = token
                .parse()
                .map_err(|_| SelectionError::NotANumber(token.to_string()))?;
            if index == 0 || index > group_len {
                return Err(SelectionError::OutOfRange {
                    index,
                    len: group_len,
                });
            }
            keep.insert(index - 1);
        }
        Ok(Selection::KeepIndices(keep))
    }

    /// The members of `paths` this selection deletes, in order.
    pub fn delete_set<'a>(&self, paths: &'a [PathBuf]) -> Vec<&'a PathBuf> {
        match self {
            Selection::KeepAll => Vec::new(),
            Selection::DeleteAll => paths.iter().collect(),
            Selection::KeepIndices(keep) => paths
                .iter()
                .enumerate()
                .filter(|(i, _)| !keep.contains(i))
                .map(|(_, p)| p)
                .collect(),
        }
    }
}

/// One line of the deletion audit file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionLogEntry {
    pub deleted_path: PathBuf,
}

/// Outcome of [`delete_selected`].
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Files removed, in deletion order.
    pub deleted: Vec<PathBuf>,
    /// Files that could not be removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Digests of groups left with no copy at all.
    pub emptied_groups: Vec<String>,
    /// Where the audit file was written, if anything was deleted.
    pub audit_log: Option<PathBuf>,
}

/// Deletes the copies each group's selection does not keep.
///
/// Groups missing from `selections` are left alone. A file that cannot be
/// deleted is reported and the batch goes on. If anything was deleted,
/// `deleted_duplicates_log.json` is written once into the scanned root,
/// replacing any earlier audit file.
///
/// # Errors
///
/// `LogWriteFailed` if the audit file cannot be written; the deletions
/// themselves have already happened by then.
pub fn delete_selected(
    groups: &DuplicateGroups,
    selections: &HashMap<String, Selection>,
) -> TidyResult<ResolveReport> {
    let mut report = ResolveReport::default();

    for (digest, group) in groups.iter() {
        let Some(selection) = selections.get(digest) else {
            continue;
        };

        let mut deleted_here = 0;
        for path in selection.delete_set(&group.paths) {
            match delete_file(path) {
                Ok(()) => {
                    info!(file = %path.display(), "deleted duplicate");
                    report.deleted.push(path.clone());
                    deleted_here += 1;
                }
                Err(e) => {
                    warn!("{}", e);
                    report.failed.push((path.clone(), e.to_string()));
                }
            }
        }

        if deleted_here > 0 && deleted_here == group.paths.len() {
            warn!(digest, "all copies of this file were deleted");
            report.emptied_groups.push(digest.to_string());
        }
    }

    if !report.deleted.is_empty() {
        report.audit_log = Some(write_audit_log(groups.root(), &report.deleted)?);
    }

    Ok(report)
}

fn delete_file(path: &Path) -> TidyResult<()> {
    if !path.is_file() {
        return Err(TidyError::DeleteFailed {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        });
    }
    fs::remove_file(path).map_err(|e| TidyError::DeleteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_audit_log(dir: &Path, deleted: &[PathBuf]) -> TidyResult<PathBuf> {
    let path = dir.join(AUDIT_LOG_FILE);
    let entries: Vec<DeletionLogEntry> = deleted
        .iter()
        .map(|p| DeletionLogEntry {
            deleted_path: p.clone(),
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries).map_err(|e| TidyError::LogWriteFailed {
        path: path.clone(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;
    fs::write(&path, json).map_err(|e| TidyError::LogWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    Ok(path)
}
