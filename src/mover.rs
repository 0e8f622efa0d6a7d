/// Single-file relocation.
///
/// Moves never overwrite: if the destination name is taken the move fails
/// with `MoveFailed` and both files stay where they are.
use crate::error::{TidyError, TidyResult};
use crate::move_log::MoveLogEntry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Moves `file` into `dest_dir`, creating `dest_dir` (and any missing
/// parents) first.
///
/// Returns the `(original, new)` pair on success. If the move fails, any
/// directories this call created are removed again so a failed move leaves
/// no trace.
///
/// # Examples
///
/// ```no_run
/// use tidydir::mover::move_into;
/// use std::path::Path;
///
/// let entry = move_into(Path::new("/data/a.jpg"), Path::new("/data/Images"))?;
/// assert_eq!(entry.new, Path::new("/data/Images/a.jpg"));
/// # Ok::<(), tidydir::TidyError>(())
/// ```
pub fn move_into(file: &Path, dest_dir: &Path) -> TidyResult<MoveLogEntry> {
    let file_name = file.file_name().ok_or_else(|| TidyError::MoveFailed {
        from: file.to_path_buf(),
        to: dest_dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
    })?;
    let destination = dest_dir.join(file_name);

    let created = missing_ancestors(dest_dir);
    fs::create_dir_all(dest_dir).map_err(|e| TidyError::MoveFailed {
        from: file.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;

    match relocate(file, &destination) {
        Ok(()) => Ok(MoveLogEntry {
            original: file.to_path_buf(),
            new: destination,
        }),
        Err(e) => {
            // Deepest first; remove_dir refuses anything non-empty.
            for dir in &created {
                let _ = fs::remove_dir(dir);
            }
            Err(TidyError::MoveFailed {
                from: file.to_path_buf(),
                to: destination,
                source: e,
            })
        }
    }
}

/// Moves `from` to the exact path `to`, refusing to overwrite.
pub fn move_file(from: &Path, to: &Path) -> TidyResult<()> {
    relocate(from, to).map_err(|e| TidyError::MoveFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })
}

/// True if anything, including a dangling symlink, sits at `path`.
pub(crate) fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    if occupied(to) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        ));
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Directories on the way to `dir` that do not exist yet, deepest first.
fn missing_ancestors(dir: &Path) -> Vec<PathBuf> {
    dir.ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .map(Path::to_path_buf)
        .collect()
}
