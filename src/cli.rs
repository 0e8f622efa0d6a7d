//! Command-line front-end.
//!
//! Parses arguments, calls the engines, and prints their reports. The only
//! interactive part is the duplicate keep-prompt, whose answers are turned
//! into [`Selection`] values before anything is deleted.

use crate::config::{self, Settings};
use crate::duplicates::{self, DuplicateGroups};
use crate::error::TidyResult;
use crate::file_organizer::{FileOrganizer, OrganizePlan, OrganizeReport};
use crate::output::{OutputFormatter, human_readable};
use crate::resolver::{self, Selection};
use crate::undo::UndoManager;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "tidydir", version)]
#[command(about = "Organize a directory by file type or date, undo it, and clean up duplicates")]
pub struct Cli {
    /// More log output (-v info, -vv debug). TIDYDIR_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move the files of a directory into folders
    Organize {
        /// Directory whose files are organized
        dir: PathBuf,
        /// Folder scheme: category by extension, or year/month
        #[arg(long, value_enum, default_value_t = SortMode::Type)]
        by: SortMode,
        /// Show what would move without moving anything
        #[arg(long)]
        dry_run: bool,
        /// JSON category table (default: ./categories.json, then ~/.config/tidydir/categories.json)
        #[arg(long)]
        categories: Option<PathBuf>,
        /// TOML settings with filter rules (default: ./.tidydirrc.toml, then ~/.config/tidydir/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reverse the most recent organize run in a directory
    Undo {
        dir: PathBuf,
    },
    /// Find files with identical content under a directory
    Dupes {
        dir: PathBuf,
        /// Ask, for each group, which copies to keep and delete the rest
        #[arg(long)]
        delete: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortMode {
    Type,
    Date,
}

/// Runs a parsed command.
///
/// Returns `Ok(true)` when everything went through, `Ok(false)` when the
/// operation finished but some files were skipped or failed.
pub fn run_cli(cli: Cli) -> TidyResult<bool> {
    match cli.command {
        Command::Organize {
            dir,
            by,
            dry_run,
            categories,
            config,
        } => organize(&dir, by, dry_run, categories.as_deref(), config.as_deref()),
        Command::Undo { dir } => undo(&dir),
        Command::Dupes { dir, delete } => dupes(&dir, delete),
    }
}

fn organize(
    dir: &Path,
    by: SortMode,
    dry_run: bool,
    categories: Option<&Path>,
    settings_path: Option<&Path>,
) -> TidyResult<bool> {
    let filter = Settings::load(settings_path)?.compile()?;

    let plan = match by {
        SortMode::Type => {
            let table = config::load_extension_table(categories)?;
            FileOrganizer::plan_by_type(dir, &table, &filter)?
        }
        SortMode::Date => FileOrganizer::plan_by_date(dir, &filter)?,
    };

    if dry_run {
        print_plan(&plan);
        return Ok(plan.unreadable.is_empty());
    }

    OutputFormatter::info(&format!("Organizing contents of: {}", plan.base_path.display()));
    let report = FileOrganizer::execute(plan)?;
    print_organize_report(&report);
    Ok(report.is_complete_success())
}

fn print_plan(plan: &OrganizePlan) {
    OutputFormatter::dry_run_notice(&format!("Analyzing {}", plan.base_path.display()));
    if plan.moves.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return;
    }

    for planned in &plan.moves {
        let name = planned
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        OutputFormatter::plain(&format!(" - {} → {}/", name, planned.folder.display()));
    }
    for (path, reason) in &plan.unreadable {
        OutputFormatter::warning(&format!("{}: {}", path.display(), reason));
    }

    OutputFormatter::summary_table(&plan.folder_counts());
    OutputFormatter::dry_run_notice("No files were modified.");
}

fn print_organize_report(report: &OrganizeReport) {
    for entry in &report.moved {
        OutputFormatter::success(&format!(
            "{} → {}",
            entry.original.display(),
            entry.new.display()
        ));
    }
    for (path, reason) in &report.failed {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }

    OutputFormatter::summary_table(&report.folder_counts);
    OutputFormatter::plain(&format!("\nLog saved to {}", report.log_path.display()));

    if report.is_complete_success() {
        OutputFormatter::success("Organization complete.");
    } else {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized and were left in place.",
            report.failed.len()
        ));
    }
}

fn undo(dir: &Path) -> TidyResult<bool> {
    let report = UndoManager::undo(dir)?;

    OutputFormatter::info(&format!("Reverted {}", report.kind));
    OutputFormatter::plain(&format!("  Restored: {}", report.restored.len()));
    for (path, reason) in &report.skipped {
        OutputFormatter::warning(&format!("Skipped {}: {}", path.display(), reason));
    }
    for (path, reason) in &report.failed {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
    for removed in &report.removed_dirs {
        OutputFormatter::plain(&format!("  Removed empty directory {}", removed.display()));
    }

    if report.log_retained {
        OutputFormatter::warning(&format!(
            "{} kept with the entries that failed; fix them and run undo again.",
            report.log_path.display()
        ));
    } else {
        OutputFormatter::success("Undo complete. Log deleted.");
    }

    Ok(report.is_complete_success())
}

fn dupes(dir: &Path, delete: bool) -> TidyResult<bool> {
    let mut bar = None;
    let groups = duplicates::find_duplicates_with_progress(dir, |progress| {
        let pb = bar.get_or_insert_with(|| {
            OutputFormatter::hashing_progress_bar(progress.total as u64)
        });
        pb.set_position(progress.done as u64);
    })?;
    if let Some(pb) = bar {
        pb.finish_and_clear();
    }

    if groups.is_empty() {
        OutputFormatter::success("No duplicate files found.");
        return Ok(true);
    }

    OutputFormatter::plain(&format!(
        "{} group(s), {} redundant file(s), {} reclaimable",
        groups.len(),
        groups.duplicate_count(),
        human_readable(groups.wasted_bytes())
    ));

    if !delete {
        for (digest, group) in groups.iter() {
            OutputFormatter::duplicate_group(digest, group);
        }
        return Ok(true);
    }

    // Groups are listed by the prompt itself.
    let selections = prompt_selections(&groups, io::stdin().lock());
    let report = resolver::delete_selected(&groups, &selections)?;

    for path in &report.deleted {
        OutputFormatter::success(&format!("Deleted {}", path.display()));
    }
    for (path, reason) in &report.failed {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
    for digest in &report.emptied_groups {
        OutputFormatter::warning(&format!("All copies of {} were deleted.", digest));
    }
    if let Some(audit) = &report.audit_log {
        OutputFormatter::plain(&format!("Deletion log saved to {}", audit.display()));
    }

    Ok(report.failed.is_empty())
}

/// Lists each group and asks which copies to keep. End of input keeps the rest.
fn prompt_selections(
    groups: &DuplicateGroups,
    input: impl BufRead,
) -> HashMap<String, Selection> {
    let mut lines = input.lines();
    let mut selections = HashMap::new();

    OutputFormatter::header("Duplicate cleanup");
    for (digest, group) in groups.iter() {
        OutputFormatter::duplicate_group(digest, group);
        let selection = loop {
            print!("Keep which (e.g. '1' or '1,3'), 'all' to delete every copy, Enter to skip: ");
            let _ = io::stdout().flush();

            let Some(Ok(line)) = lines.next() else {
                break Selection::KeepAll;
            };
            match Selection::parse(&line, group.paths.len()) {
                Ok(selection) => break selection,
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
        };
        selections.insert(digest.to_string(), selection);
    }

    selections
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_organize_by_date() {
        let cli = Cli::try_parse_from(["tidydir", "organize", "/tmp/x", "--by", "date", "--dry-run"])
            .expect("Arguments should parse");
        match cli.command {
            Command::Organize { dir, by, dry_run, .. } => {
                assert_eq!(dir, PathBuf::from("/tmp/x"));
                assert_eq!(by, SortMode::Date);
                assert!(dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_prompt_selections_reads_each_group_once() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        for (name, content) in [("a1", "aaa"), ("a2", "aaa"), ("b1", "bb"), ("b2", "bb")] {
            std::fs::write(temp_dir.path().join(name), content).expect("Failed to write file");
        }
        let groups = duplicates::find_duplicates(temp_dir.path()).expect("Scan failed");
        assert_eq!(groups.len(), 2);

        // First group: a bad answer, then keep the second copy. Second group: input ends.
        let selections = prompt_selections(&groups, io::Cursor::new("7\n2\n"));

        let mut digests = groups.iter().map(|(digest, _)| digest.to_string());
        let first = digests.next().expect("first group");
        let second = digests.next().expect("second group");
        assert_eq!(
            selections.get(&first),
            Some(&Selection::KeepIndices([1].into_iter().collect()))
        );
        assert_eq!(selections.get(&second), Some(&Selection::KeepAll));
    }

    #[test]
    fn test_parse_verbosity() {
        let cli = Cli::try_parse_from(["tidydir", "-vv", "undo", "/tmp/x"])
            .expect("Arguments should parse");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Undo { .. }));
    }
}
