//! tidydir - organize a directory by file type or date, undo it, find duplicates
//!
//! Every organize run records its moves in a JSON log inside the organized
//! directory (`undo_log.json` or `date_sort_log.json`), which [`undo`] replays
//! backwards. Duplicate detection buckets files by size and then by SHA-256
//! digest; [`delete_selected`] removes the copies a caller chose not to keep.
//!
//! The functions at the crate root are the operations a front-end calls.
//! They read configuration from the default locations; the modules expose
//! the same engines with explicit inputs.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod move_log;
pub mod mover;
pub mod output;
pub mod resolver;
pub mod undo;

pub use config::{FileFilter, Settings};
pub use duplicates::{DuplicateGroup, DuplicateGroups};
pub use error::{ErrorKind, TidyError, TidyResult};
pub use file_category::ExtensionTable;
pub use file_organizer::{FileOrganizer, OrganizeReport};
pub use move_log::{LogKind, MoveLog, MoveLogEntry};
pub use resolver::{ResolveReport, Selection};
pub use undo::{UndoManager, UndoReport};

use std::collections::HashMap;
use std::path::Path;

/// Sorts the files of `dir` into category folders.
///
/// The category table and filter settings come from their default
/// locations (see [`config`]). A missing table aborts with
/// `ConfigurationMissing` before anything moves.
pub fn organize_by_type(dir: &Path) -> TidyResult<OrganizeReport> {
    let table = config::load_extension_table(None)?;
    let filter = default_filter()?;
    FileOrganizer::organize_by_type(dir, &table, &filter)
}

/// Sorts the files of `dir` into `<year>/<month>` folders.
pub fn organize_by_date(dir: &Path) -> TidyResult<OrganizeReport> {
    let filter = default_filter()?;
    FileOrganizer::organize_by_date(dir, &filter)
}

/// Reverses the most recent organize run in `dir`.
pub fn undo(dir: &Path) -> TidyResult<UndoReport> {
    UndoManager::undo(dir)
}

/// Finds files with identical content anywhere under `dir`.
pub fn find_duplicates(dir: &Path) -> TidyResult<DuplicateGroups> {
    duplicates::find_duplicates(dir)
}

/// Deletes the copies not kept by `selection`, keyed by group digest.
pub fn delete_selected(
    groups: &DuplicateGroups,
    selection: &HashMap<String, Selection>,
) -> TidyResult<ResolveReport> {
    resolver::delete_selected(groups, selection)
}

fn default_filter() -> TidyResult<FileFilter> {
    Settings::load(None)?.compile()
}
