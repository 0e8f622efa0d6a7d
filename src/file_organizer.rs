/// Organize engines: by file type and by modification date.
///
/// Both engines work the same way. They list the immediate entries of a
/// directory (never descending into subdirectories), decide a destination
/// folder for each file, move it there, and record every successful move in
/// a [`MoveLog`] written at the end of the run. A file that cannot be moved
/// is reported and left where it is; it never stops the run.
use crate::config::FileFilter;
use crate::error::{TidyError, TidyResult, ensure_directory};
use crate::file_category::ExtensionTable;
use crate::move_log::{LogKind, MoveLog, MoveLogEntry};
use crate::mover;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// A move the engine intends to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    /// The file as it sits in the organized directory.
    pub source: PathBuf,
    /// Folder, relative to the organized directory, e.g. `Images` or `2024/March`.
    pub folder: PathBuf,
}

/// Everything an organize run would do, computed without touching the disk.
#[derive(Debug, Clone)]
pub struct OrganizePlan {
    pub kind: LogKind,
    /// Absolute path of the directory being organized.
    pub base_path: PathBuf,
    pub moves: Vec<PlannedMove>,
    /// Files left alone by the filter rules.
    pub filtered: Vec<PathBuf>,
    /// Files whose destination could not be decided (e.g. unreadable mtime).
    pub unreadable: Vec<(PathBuf, String)>,
}

impl OrganizePlan {
    /// Number of planned moves per destination folder.
    pub fn folder_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for planned in &self.moves {
            *counts
                .entry(planned.folder.to_string_lossy().into_owned())
                .or_insert(0) += 1;
        }
        counts
    }
}

/// Outcome of an organize run.
#[derive(Debug)]
pub struct OrganizeReport {
    pub kind: LogKind,
    /// Where the move log was written.
    pub log_path: PathBuf,
    /// Completed moves, in order. Identical to the persisted log.
    pub moved: Vec<MoveLogEntry>,
    /// Files that stayed put because their move failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Files left alone by the filter rules.
    pub filtered: Vec<PathBuf>,
    /// Successful moves per destination folder.
    pub folder_counts: BTreeMap<String, usize>,
}

impl OrganizeReport {
    /// True when every candidate file was moved.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Organizes a single directory.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Plans an organize-by-type run.
    ///
    /// Each file goes to `<dir>/<category>/`, with the category taken from
    /// `table` by extension and `Others` for anything unknown.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` if `dir` is not an existing directory.
    pub fn plan_by_type(
        dir: &Path,
        table: &ExtensionTable,
        filter: &FileFilter,
    ) -> TidyResult<OrganizePlan> {
        let mut plan = Self::empty_plan(LogKind::ByType, dir)?;
        for file in Self::candidate_files(&plan.base_path, filter, &mut plan.filtered)? {
            let category = table.classify_path(&file);
            debug!(file = %file.display(), category, "classified");
            plan.moves.push(PlannedMove {
                source: file,
                folder: PathBuf::from(category),
            });
        }
        Ok(plan)
    }

    /// Plans an organize-by-date run.
    ///
    /// Each file goes to `<dir>/<year>/<month>/`, taken from its last
    /// modification time in local time, e.g. `2024/March`.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` if `dir` is not an existing directory.
    pub fn plan_by_date(dir: &Path, filter: &FileFilter) -> TidyResult<OrganizePlan> {
        let mut plan = Self::empty_plan(LogKind::ByDate, dir)?;
        for file in Self::candidate_files(&plan.base_path, filter, &mut plan.filtered)? {
            match fs::metadata(&file).and_then(|m| m.modified()) {
                Ok(modified) => plan.moves.push(PlannedMove {
                    folder: date_folder(modified),
                    source: file,
                }),
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "cannot read modification time");
                    plan.unreadable.push((file, e.to_string()));
                }
            }
        }
        Ok(plan)
    }

    /// Organizes `dir` into category folders and writes `undo_log.json`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidydir::config::FileFilter;
    /// use tidydir::file_category::ExtensionTable;
    /// use tidydir::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let table = ExtensionTable::load(Path::new("categories.json"))?;
    /// let report = FileOrganizer::organize_by_type(
    ///     Path::new("/home/user/Downloads"),
    ///     &table,
    ///     &FileFilter::default(),
    /// )?;
    /// println!("Moved {} files", report.moved.len());
    /// # Ok::<(), tidydir::TidyError>(())
    /// ```
    pub fn organize_by_type(
        dir: &Path,
        table: &ExtensionTable,
        filter: &FileFilter,
    ) -> TidyResult<OrganizeReport> {
        let plan = Self::plan_by_type(dir, table, filter)?;
        Self::execute(plan)
    }

    /// Organizes `dir` into `<year>/<month>` folders and writes
    /// `date_sort_log.json`.
    pub fn organize_by_date(dir: &Path, filter: &FileFilter) -> TidyResult<OrganizeReport> {
        let plan = Self::plan_by_date(dir, filter)?;
        Self::execute(plan)
    }

    /// Carries out a plan and persists its log, even when nothing moved.
    ///
    /// # Errors
    ///
    /// `LogWriteFailed` if the log cannot be written. Moves made before that
    /// point stay made.
    pub fn execute(plan: OrganizePlan) -> TidyResult<OrganizeReport> {
        info!(dir = %plan.base_path.display(), kind = %plan.kind, files = plan.moves.len(), "organizing");

        let mut log = MoveLog::new(plan.kind);
        let mut failed = plan.unreadable;
        let mut folder_counts = BTreeMap::new();

        for planned in plan.moves {
            let dest_dir = plan.base_path.join(&planned.folder);
            match mover::move_into(&planned.source, &dest_dir) {
                Ok(entry) => {
                    info!(from = %entry.original.display(), to = %entry.new.display(), "moved");
                    *folder_counts
                        .entry(planned.folder.to_string_lossy().into_owned())
                        .or_insert(0) += 1;
                    log.push(entry);
                }
                Err(e) => {
                    warn!("{}", e);
                    failed.push((planned.source, e.to_string()));
                }
            }
        }

        let log_path = log.save(&plan.base_path)?;

        Ok(OrganizeReport {
            kind: plan.kind,
            log_path,
            moved: log.entries,
            failed,
            filtered: plan.filtered,
            folder_counts,
        })
    }

    fn empty_plan(kind: LogKind, dir: &Path) -> TidyResult<OrganizePlan> {
        ensure_directory(dir)?;
        // Logs hold absolute paths so they can be reversed from anywhere.
        let base_path = fs::canonicalize(dir).map_err(|_| TidyError::DirectoryNotFound {
            path: dir.to_path_buf(),
        })?;

        Ok(OrganizePlan {
            kind,
            base_path,
            moves: Vec::new(),
            filtered: Vec::new(),
            unreadable: Vec::new(),
        })
    }

    /// Immediate non-directory entries of `dir`, sorted by name.
    fn candidate_files(
        dir: &Path,
        filter: &FileFilter,
        filtered: &mut Vec<PathBuf>,
    ) -> TidyResult<Vec<PathBuf>> {
        let entries = fs::read_dir(dir).map_err(|_| TidyError::DirectoryNotFound {
            path: dir.to_path_buf(),
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if filter.should_organize(&path) {
                files.push(path);
            } else {
                debug!(file = %path.display(), "left in place by filter");
                filtered.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// `<year>/<month>` for a modification time, in local time.
pub fn date_folder(modified: SystemTime) -> PathBuf {
    let local: DateTime<Local> = modified.into();
    PathBuf::from(local.format("%Y").to_string()).join(local.format("%B").to_string())
}
