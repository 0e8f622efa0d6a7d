/// Persistent record of an organize run.
///
/// A log is a pretty-printed JSON array of `{"original": ..., "new": ...}`
/// objects in move order, written once at the end of a run into the
/// directory that was organized.
use crate::error::{TidyError, TidyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One completed relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLogEntry {
    /// Where the file was before the move.
    pub original: PathBuf,
    /// Where the file was moved to.
    pub new: PathBuf,
}

/// Which organize engine produced a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// Category folders; `undo_log.json`.
    ByType,
    /// `<year>/<month>` folders; `date_sort_log.json`.
    ByDate,
}

impl LogKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::ByType => "undo_log.json",
            LogKind::ByDate => "date_sort_log.json",
        }
    }

    /// Path of this kind of log inside `dir`.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// How many directory levels the engine nests files under.
    pub fn folder_depth(&self) -> usize {
        match self {
            LogKind::ByType => 1,
            LogKind::ByDate => 2,
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogKind::ByType => write!(f, "file-type sorting"),
            LogKind::ByDate => write!(f, "date-based sorting"),
        }
    }
}

/// Ordered moves of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveLog {
    pub kind: LogKind,
    pub entries: Vec<MoveLogEntry>,
}

impl MoveLog {
    pub fn new(kind: LogKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: MoveLogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the log into `dir`, replacing any earlier log of the same kind.
    /// Returns the path written.
    pub fn save(&self, dir: &Path) -> TidyResult<PathBuf> {
        let path = self.kind.path_in(dir);
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            TidyError::LogWriteFailed {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;

        fs::write(&path, json).map_err(|e| TidyError::LogWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Reads a log of the given kind from `path`.
    ///
    /// # Errors
    ///
    /// `CorruptLog` if the file cannot be read or is not an array of
    /// `{original, new}` objects.
    pub fn load(kind: LogKind, path: &Path) -> TidyResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| TidyError::CorruptLog {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let entries: Vec<MoveLogEntry> =
            serde_json::from_str(&content).map_err(|e| TidyError::CorruptLog {
                path: path.to_path_buf(),
                reason: format!("JSON parse error: {}", e),
            })?;

        Ok(Self { kind, entries })
    }

    /// Picks the log to reverse in `dir`.
    ///
    /// With both logs present the one written last wins; equal timestamps go
    /// to the by-type log. Returns `None` when neither exists.
    pub fn locate(dir: &Path) -> Option<(LogKind, PathBuf)> {
        let by_type = LogKind::ByType.path_in(dir);
        let by_date = LogKind::ByDate.path_in(dir);

        match (by_type.is_file(), by_date.is_file()) {
            (true, true) => {
                let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
                if modified(&by_date) > modified(&by_type) {
                    Some((LogKind::ByDate, by_date))
                } else {
                    Some((LogKind::ByType, by_type))
                }
            }
            (true, false) => Some((LogKind::ByType, by_type)),
            (false, true) => Some((LogKind::ByDate, by_date)),
            (false, false) => None,
        }
    }

    /// Deletes a log file.
    pub fn remove(path: &Path) -> TidyResult<()> {
        fs::remove_file(path).map_err(|e| TidyError::LogWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .expect("Failed to open log")
            .set_modified(time)
            .expect("Failed to set mtime");
    }

    #[test]
    fn test_save_writes_array_in_move_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let mut log = MoveLog::new(LogKind::ByType);
        log.push(MoveLogEntry {
            original: base_path.join("a.jpg"),
            new: base_path.join("Images").join("a.jpg"),
        });
        log.push(MoveLogEntry {
            original: base_path.join("b.txt"),
            new: base_path.join("Docs").join("b.txt"),
        });

        let path = log.save(base_path).expect("Failed to save log");
        assert_eq!(path, base_path.join("undo_log.json"));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("Failed to read log"))
                .expect("Log should be JSON");
        let array = raw.as_array().expect("Log should be an array");
        assert_eq!(array.len(), 2);
        assert_eq!(
            array[0]["original"].as_str(),
            Some(base_path.join("a.jpg").to_string_lossy().as_ref())
        );
        assert_eq!(
            array[1]["new"].as_str(),
            Some(base_path.join("Docs").join("b.txt").to_string_lossy().as_ref())
        );

        let loaded = MoveLog::load(LogKind::ByType, &path).expect("Failed to load log");
        assert_eq!(loaded, log);
    }

    #[test]
    fn test_empty_log_is_saved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = MoveLog::new(LogKind::ByDate)
            .save(temp_dir.path())
            .expect("Failed to save log");

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("date_sort_log.json"));
        let loaded = MoveLog::load(LogKind::ByDate, &path).expect("Failed to load log");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_corrupt_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("undo_log.json");
        fs::write(&path, "{ not json").expect("Failed to write log");

        let err = MoveLog::load(LogKind::ByType, &path).expect_err("Should not parse");
        assert_eq!(err.kind(), ErrorKind::CorruptLog);
    }

    #[test]
    fn test_locate_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(MoveLog::locate(temp_dir.path()).is_none());
    }

    #[test]
    fn test_locate_single_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("date_sort_log.json"), "[]").expect("Failed to write");

        let (kind, path) = MoveLog::locate(temp_dir.path()).expect("Log should be found");
        assert_eq!(kind, LogKind::ByDate);
        assert_eq!(path, temp_dir.path().join("date_sort_log.json"));
    }

    #[test]
    fn test_locate_prefers_most_recent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let by_type = temp_dir.path().join("undo_log.json");
        let by_date = temp_dir.path().join("date_sort_log.json");
        fs::write(&by_type, "[]").expect("Failed to write");
        fs::write(&by_date, "[]").expect("Failed to write");

        let now = SystemTime::now();
        set_mtime(&by_type, now - Duration::from_secs(60));
        set_mtime(&by_date, now);
        assert_eq!(
            MoveLog::locate(temp_dir.path()).map(|(k, _)| k),
            Some(LogKind::ByDate)
        );

        set_mtime(&by_type, now + Duration::from_secs(60));
        assert_eq!(
            MoveLog::locate(temp_dir.path()).map(|(k, _)| k),
            Some(LogKind::ByType)
        );
    }

    #[test]
    fn test_locate_tie_goes_to_type_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let by_type = temp_dir.path().join("undo_log.json");
        let by_date = temp_dir.path().join("date_sort_log.json");
        fs::write(&by_type, "[]").expect("Failed to write");
        fs::write(&by_date, "[]").expect("Failed to write");

        let stamp = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&by_type, stamp);
        set_mtime(&by_date, stamp);

        assert_eq!(
            MoveLog::locate(temp_dir.path()),
            Some((LogKind::ByType, by_type))
        );
    }
}
