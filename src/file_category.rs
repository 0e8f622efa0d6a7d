/// File categorization by extension.
///
/// Categories come from a user-supplied JSON table mapping a folder name to the
/// extensions that belong in it. The table is inverted once into an
/// [`ExtensionTable`] so classifying an extension is one map lookup.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use tidydir::file_category::ExtensionTable;
///
/// let mut categories = HashMap::new();
/// categories.insert("Images".to_string(), vec![".jpg".to_string(), ".png".to_string()]);
/// let table = ExtensionTable::from_categories(&categories);
///
/// assert_eq!(table.classify(".JPG"), "Images");
/// assert_eq!(table.classify(".xyz"), "Others");
/// ```
use crate::error::{TidyError, TidyResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Folder used for every extension the table does not know.
pub const FALLBACK_CATEGORY: &str = "Others";

/// Lowercase extension (with leading dot) to category folder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionTable {
    extension_map: HashMap<String, String>,
}

impl ExtensionTable {
    /// Inverts a `category -> [extensions]` map.
    ///
    /// When an extension is listed under several categories the last one
    /// visited wins; category order in a JSON object is not meaningful, so a
    /// well-formed table lists each extension once.
    pub fn from_categories(categories: &HashMap<String, Vec<String>>) -> Self {
        let mut table = Self::default();
        for (category, extensions) in categories {
            for ext in extensions {
                table.insert(ext, category);
            }
        }
        table
    }

    /// Loads and inverts a JSON category file.
    ///
    /// # Errors
    ///
    /// `ConfigurationMissing` if the file does not exist, `ConfigurationInvalid`
    /// if it cannot be read or is not a JSON object of string arrays.
    pub fn load(path: &Path) -> TidyResult<Self> {
        if !path.is_file() {
            return Err(TidyError::ConfigurationMissing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| TidyError::ConfigurationInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let categories: HashMap<String, Vec<String>> =
            serde_json::from_str(&content).map_err(|e| TidyError::ConfigurationInvalid {
                path: path.to_path_buf(),
                reason: format!("JSON parse error: {}", e),
            })?;

        Ok(Self::from_categories(&categories))
    }

    /// Adds a single extension mapping. The extension is normalized to
    /// lowercase with a leading dot.
    pub fn insert(&mut self, ext: &str, category: &str) {
        self.extension_map
            .insert(normalize_extension(ext), category.to_string());
    }

    /// Maps an extension to its category, or `"Others"`.
    ///
    /// Matching is case-insensitive and accepts the extension with or without
    /// its leading dot.
    pub fn classify(&self, ext: &str) -> &str {
        self.extension_map
            .get(&normalize_extension(ext))
            .map(String::as_str)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Classifies a file by the extension of its path. Files without an
    /// extension go to `"Others"`.
    pub fn classify_path(&self, path: &Path) -> &str {
        match path.extension() {
            Some(ext) => self.classify(&ext.to_string_lossy()),
            None => FALLBACK_CATEGORY,
        }
    }

    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

/// Classifies against a table that may have failed to load.
pub fn classify_optional<'a>(table: Option<&'a ExtensionTable>, ext: &str) -> &'a str {
    match table {
        Some(table) => table.classify(ext),
        None => FALLBACK_CATEGORY,
    }
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_table() -> ExtensionTable {
        let mut categories = HashMap::new();
        categories.insert(
            "Images".to_string(),
            vec![".jpg".to_string(), ".PNG".to_string()],
        );
        categories.insert("Docs".to_string(), vec![".txt".to_string()]);
        ExtensionTable::from_categories(&categories)
    }

    #[test]
    fn test_classify_known_extensions() {
        let table = sample_table();
        assert_eq!(table.classify(".jpg"), "Images");
        assert_eq!(table.classify(".png"), "Images");
        assert_eq!(table.classify(".txt"), "Docs");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_classify_case_insensitive() {
        let table = sample_table();
        assert_eq!(table.classify(".JPG"), "Images");
        assert_eq!(table.classify("Txt"), "Docs");
    }

    #[test]
    fn test_classify_unknown_defaults_to_others() {
        let table = sample_table();
        assert_eq!(table.classify(".unknownext"), "Others");
        assert_eq!(table.classify(""), "Others");
    }

    #[test]
    fn test_classify_path() {
        let table = sample_table();
        assert_eq!(table.classify_path(&PathBuf::from("/a/b/photo.JPG")), "Images");
        assert_eq!(table.classify_path(&PathBuf::from("/a/b/Makefile")), "Others");
    }

    #[test]
    fn test_classify_without_table() {
        assert_eq!(classify_optional(None, ".jpg"), "Others");
        let table = sample_table();
        assert_eq!(classify_optional(Some(&table), ".jpg"), "Images");
    }

    #[test]
    fn test_load_from_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("categories.json");
        fs::write(&path, r#"{"Music": [".mp3", ".flac"], "Archives": [".zip"]}"#)
            .expect("Failed to write config");

        let table = ExtensionTable::load(&path).expect("Failed to load table");
        assert_eq!(table.classify(".flac"), "Music");
        assert_eq!(table.classify(".zip"), "Archives");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ExtensionTable::load(Path::new("/non/existent/categories.json"))
            .expect_err("Missing file should fail");
        assert_eq!(err.kind(), crate::error::ErrorKind::ConfigurationMissing);
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("categories.json");
        fs::write(&path, r#"["not", "an", "object"]"#).expect("Failed to write config");

        let err = ExtensionTable::load(&path).expect_err("Array should not parse");
        assert_eq!(err.kind(), crate::error::ErrorKind::ConfigurationInvalid);
    }
}
