//! Duplicate file detection.
//!
//! Two stages over a whole directory tree:
//!
//! 1. every regular file is bucketed by its exact byte size, and buckets
//!    holding a single file are dropped;
//! 2. files in the remaining buckets are hashed with SHA-256 and grouped by
//!    digest, and digests shared by a single file are dropped.
//!
//! Only same-size files are ever read. Files that vanish or cannot be read
//! along the way are left out of every group.

use crate::error::{TidyResult, ensure_directory};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Files sharing one digest. Always at least two paths, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Size in bytes of each copy.
    pub size: u64,
    pub paths: Vec<PathBuf>,
}

/// Result of a duplicate scan: lowercase hex digest to group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroups {
    root: PathBuf,
    groups: BTreeMap<String, DuplicateGroup>,
}

impl DuplicateGroups {
    /// The directory that was scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, digest: &str) -> Option<&DuplicateGroup> {
        self.groups.get(digest)
    }

    /// Groups in digest order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DuplicateGroup)> {
        self.groups.iter().map(|(digest, group)| (digest.as_str(), group))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Redundant copies: every file beyond the first in each group.
    pub fn duplicate_count(&self) -> usize {
        self.groups.values().map(|g| g.paths.len() - 1).sum()
    }

    /// Bytes that deleting every redundant copy would free.
    pub fn wasted_bytes(&self) -> u64 {
        self.groups
            .values()
            .map(|g| g.size * (g.paths.len() as u64 - 1))
            .sum()
    }
}

/// Progress through the hashing stage.
#[derive(Debug, Clone, Copy)]
pub struct HashProgress {
    /// Files hashed (or skipped as unreadable) so far.
    pub done: usize,
    /// Files that survived size bucketing.
    pub total: usize,
}

/// Scans the tree under `root` for files with identical content.
///
/// # Errors
///
/// `DirectoryNotFound` if `root` is not a directory. Nothing below the root
/// can make the scan fail.
///
/// # Examples
///
/// ```no_run
/// use tidydir::duplicates::find_duplicates;
/// use std::path::Path;
///
/// let groups = find_duplicates(Path::new("/home/user/Pictures"))?;
/// for (digest, group) in groups.iter() {
///     println!("{digest}: {} copies", group.paths.len());
/// }
/// # Ok::<(), tidydir::TidyError>(())
/// ```
pub fn find_duplicates(root: &Path) -> TidyResult<DuplicateGroups> {
    find_duplicates_with_progress(root, |_| {})
}

/// Like [`find_duplicates`], calling `on_progress` after each file is hashed.
pub fn find_duplicates_with_progress<F>(root: &Path, mut on_progress: F) -> TidyResult<DuplicateGroups>
where
    F: FnMut(HashProgress),
{
    ensure_directory(root)?;

    let candidates = group_by_size(root);
    let total = candidates.values().map(Vec::len).sum();
    info!(root = %root.display(), candidates = total, "size bucketing complete");

    let mut by_digest: BTreeMap<String, DuplicateGroup> = BTreeMap::new();
    let mut done = 0;
    for (size, paths) in candidates {
        for path in paths {
            match hash_file(&path) {
                Ok(digest) => {
                    by_digest
                        .entry(digest)
                        .or_insert_with(|| DuplicateGroup {
                            size,
                            paths: Vec::new(),
                        })
                        .paths
                        .push(path);
                }
                Err(e) => debug!(file = %path.display(), error = %e, "skipping unreadable file"),
            }
            done += 1;
            on_progress(HashProgress { done, total });
        }
    }

    by_digest.retain(|_, group| group.paths.len() > 1);
    for group in by_digest.values_mut() {
        group.paths.sort();
    }
    info!(groups = by_digest.len(), "duplicate scan complete");

    Ok(DuplicateGroups {
        root: root.to_path_buf(),
        groups: by_digest,
    })
}

/// Stage one: regular files keyed by size, singleton sizes removed.
fn group_by_size(root: &Path) -> BTreeMap<u64, Vec<PathBuf>> {
    let mut sizes: HashMap<u64, Vec<PathBuf>> = HashMap::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => sizes
                .entry(meta.len())
                .or_default()
                .push(entry.into_path()),
            Err(e) => debug!(error = %e, "skipping file without metadata"),
        }
    }

    sizes
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .collect()
}

/// SHA-256 of a file's content as lowercase hex, streamed in fixed chunks.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
