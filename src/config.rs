//! Settings and category-table loading.
//!
//! Two files feed an organize run:
//!
//! - the category table (`categories.json`), a JSON object mapping a folder
//!   name to its extensions, required for organizing by type;
//! - optional settings (`.tidydirrc.toml`) describing which top-level files
//!   an organize run leaves where they are.
//!
//! ```toml
//! [filters]
//! skip_hidden = true
//! filenames = ["desktop.ini", "Thumbs.db"]
//! extensions = ["part", "crdownload"]
//! glob = ["*.tmp"]
//! regex = ["^~\\$"]
//! ```

use crate::error::{TidyError, TidyResult};
use crate::file_category::ExtensionTable;
use crate::move_log::LogKind;
use crate::resolver::AUDIT_LOG_FILE;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the category table looked up in the working directory.
pub const CATEGORIES_FILE: &str = "categories.json";
/// Name of the settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = ".tidydirrc.toml";

/// Returns `~/.config/tidydir/<name>` when `HOME` is set.
fn user_config_path(name: &str) -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("tidydir")
            .join(name)
    })
}

/// Finds and loads the category table.
///
/// Lookup order:
/// 1. `explicit`, if given (a missing file is an error, no fallback)
/// 2. `categories.json` in the current directory
/// 3. `~/.config/tidydir/categories.json`
///
/// # Errors
///
/// `ConfigurationMissing` when no candidate exists, `ConfigurationInvalid`
/// when the chosen file does not parse.
pub fn load_extension_table(explicit: Option<&Path>) -> TidyResult<ExtensionTable> {
    if let Some(path) = explicit {
        return ExtensionTable::load(path);
    }

    let local = PathBuf::from(CATEGORIES_FILE);
    if local.is_file() {
        return ExtensionTable::load(&local);
    }

    if let Some(home) = user_config_path(CATEGORIES_FILE)
        && home.is_file()
    {
        return ExtensionTable::load(&home);
    }

    Err(TidyError::ConfigurationMissing { path: local })
}

/// Settings deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub filters: FilterRules,

    /// File these settings were read from; `None` for defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Rules for top-level files an organize run should not touch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Leave dot-files in place.
    #[serde(default)]
    pub skip_hidden: bool,

    /// Exact file names to leave in place.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Extensions to leave in place, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub glob: Vec<String>,

    /// Regular expressions matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Settings {
    /// Loads settings, falling back to defaults when no file is found.
    ///
    /// Lookup order mirrors [`load_extension_table`]: explicit path,
    /// `.tidydirrc.toml` in the current directory, then
    /// `~/.config/tidydir/config.toml`.
    ///
    /// # Errors
    ///
    /// An explicit path that does not exist is `ConfigurationMissing`; a file
    /// that does not parse is `ConfigurationInvalid`.
    pub fn load(explicit: Option<&Path>) -> TidyResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(SETTINGS_FILE);
        if local.is_file() {
            return Self::load_from_file(&local);
        }

        if let Some(home) = user_config_path("config.toml")
            && home.is_file()
        {
            return Self::load_from_file(&home);
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> TidyResult<Self> {
        if !path.is_file() {
            return Err(TidyError::ConfigurationMissing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| TidyError::ConfigurationInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut settings: Self =
            toml::from_str(&content).map_err(|e| TidyError::ConfigurationInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Compiles the filter rules. Pattern errors name the file the settings
    /// came from.
    pub fn compile(&self) -> TidyResult<FileFilter> {
        let origin = self
            .source
            .as_deref()
            .unwrap_or_else(|| Path::new(SETTINGS_FILE));
        FileFilter::new(&self.filters, origin)
    }
}

/// Compiled filter rules.
///
/// The engine's own log files are always rejected, whatever the rules say,
/// so a second run never sweeps a log into a category folder.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    skip_hidden: bool,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    globs: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl FileFilter {
    fn new(rules: &FilterRules, origin: &Path) -> TidyResult<Self> {
        let invalid = |reason: String| TidyError::ConfigurationInvalid {
            path: origin.to_path_buf(),
            reason,
        };

        let globs = rules
            .glob
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| invalid(format!("glob '{}': {}", p, e))))
            .collect::<TidyResult<Vec<_>>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|p| Regex::new(p).map_err(|e| invalid(format!("regex '{}': {}", p, e))))
            .collect::<TidyResult<Vec<_>>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            filenames: rules.filenames.iter().cloned().collect(),
            extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            globs,
            regexes,
        })
    }

    /// True if the file at `path` should be organized.
    pub fn should_organize(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        if is_reserved_name(&name) {
            return false;
        }

        if self.skip_hidden && name.starts_with('.') {
            return false;
        }

        if self.filenames.contains(name.as_ref()) {
            return false;
        }

        if let Some(ext) = path.extension()
            && self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self.globs.iter().any(|p| p.matches(&name)) {
            return false;
        }

        !self.regexes.iter().any(|r| r.is_match(&name))
    }
}

/// Files the engine writes into the directories it manages.
fn is_reserved_name(name: &str) -> bool {
    name == LogKind::ByType.file_name()
        || name == LogKind::ByDate.file_name()
        || name == AUDIT_LOG_FILE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn compile(rules: FilterRules) -> FileFilter {
        Settings {
            filters: rules,
            source: None,
        }
        .compile()
        .expect("Rules should compile")
    }

    #[test]
    fn test_default_filter_accepts_regular_and_hidden_files() {
        let filter = FileFilter::default();
        assert!(filter.should_organize(Path::new("/d/photo.jpg")));
        assert!(filter.should_organize(Path::new("/d/.bashrc")));
    }

    #[test]
    fn test_own_logs_never_organized() {
        let filter = FileFilter::default();
        assert!(!filter.should_organize(Path::new("/d/undo_log.json")));
        assert!(!filter.should_organize(Path::new("/d/date_sort_log.json")));
        assert!(!filter.should_organize(Path::new("/d/deleted_duplicates_log.json")));
        assert!(filter.should_organize(Path::new("/d/other_log.json")));
    }

    #[test]
    fn test_skip_hidden() {
        let filter = compile(FilterRules {
            skip_hidden: true,
            ..Default::default()
        });
        assert!(!filter.should_organize(Path::new("/d/.DS_Store")));
        assert!(filter.should_organize(Path::new("/d/notes.txt")));
    }

    #[test]
    fn test_exclude_filenames_and_extensions() {
        let filter = compile(FilterRules {
            filenames: vec!["Thumbs.db".to_string()],
            extensions: vec![".PART".to_string(), "tmp".to_string()],
            ..Default::default()
        });
        assert!(!filter.should_organize(Path::new("/d/Thumbs.db")));
        assert!(!filter.should_organize(Path::new("/d/movie.part")));
        assert!(!filter.should_organize(Path::new("/d/scratch.TMP")));
        assert!(filter.should_organize(Path::new("/d/movie.mkv")));
    }

    #[test]
    fn test_glob_and_regex() {
        let filter = compile(FilterRules {
            glob: vec!["*.crdownload".to_string()],
            regex: vec![r"^~\$".to_string()],
            ..Default::default()
        });
        assert!(!filter.should_organize(Path::new("/d/setup.exe.crdownload")));
        assert!(!filter.should_organize(Path::new("/d/~$report.docx")));
        assert!(filter.should_organize(Path::new("/d/report.docx")));
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let err = Settings {
            filters: FilterRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            source: None,
        }
        .compile()
        .expect_err("Invalid regex should fail");
        assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
    }

    #[test]
    fn test_invalid_glob_names_loaded_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[filters]\nglob = [\"[\"]\n").expect("Failed to write settings");

        let settings = Settings::load(Some(&path)).expect("Failed to load settings");
        assert_eq!(settings.source.as_deref(), Some(path.as_path()));

        match settings.compile() {
            Err(TidyError::ConfigurationInvalid { path: origin, .. }) => assert_eq!(origin, path),
            other => panic!("expected ConfigurationInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_load_settings_from_toml() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(
            &path,
            "[filters]\nskip_hidden = true\nextensions = [\"iso\"]\n",
        )
        .expect("Failed to write settings");

        let settings = Settings::load(Some(&path)).expect("Failed to load settings");
        assert!(settings.filters.skip_hidden);
        assert_eq!(settings.filters.extensions, vec!["iso".to_string()]);
        assert!(settings.filters.glob.is_empty());
    }

    #[test]
    fn test_explicit_settings_missing() {
        let err = Settings::load(Some(Path::new("/non/existent/settings.toml")))
            .expect_err("Missing explicit settings should fail");
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }

    #[test]
    fn test_explicit_category_file_missing() {
        let err = load_extension_table(Some(Path::new("/non/existent/categories.json")))
            .expect_err("Missing categories should fail");
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }
}
