//! Input discovery: turns mixer input patterns into an ordered file list.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

/// Extension of schema files picked up by directory scans.
pub const SCHEMA_EXTENSION: &str = "prisma";

/// Canonical entry file, usually the mixer's own output. Directory scans
/// never pick it up.
pub const ENTRY_FILE_NAME: &str = "schema.prisma";

/// Files ending with this suffix are left out of directory scans.
pub const IGNORED_SUFFIX: &str = ".ignore.prisma";

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("invalid input pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Returns `true` for `*.prisma` files that a directory scan should use.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use schema_mixer_loader::is_schema_file;
///
/// assert!(is_schema_file(Path::new("prisma/user.prisma")));
/// assert!(!is_schema_file(Path::new("prisma/schema.prisma")));
/// assert!(!is_schema_file(Path::new("prisma/draft.ignore.prisma")));
/// assert!(!is_schema_file(Path::new("prisma/notes.md")));
/// ```
pub fn is_schema_file(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    path.extension().and_then(|ext| ext.to_str()) == Some(SCHEMA_EXTENSION)
        && file_name != ENTRY_FILE_NAME
        && !file_name.ends_with(IGNORED_SUFFIX)
}

/// Recursively collects schema files under `dir`, sorted.
///
/// Subdirectories are scanned in parallel. A directory that cannot be read
/// is reported with `warn!` and skipped.
pub fn scan_directory(dir: &Path) -> BTreeSet<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "failed to read directory");
            return BTreeSet::new();
        }
    };

    let mut files = BTreeSet::new();
    let mut subdirs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => subdirs.push(path),
            Ok(_) if is_schema_file(&path) => {
                files.insert(path);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to stat entry");
            }
        }
    }

    let nested: Vec<BTreeSet<PathBuf>> = subdirs
        .par_iter()
        .map(|subdir| scan_directory(subdir))
        .collect();
    files.extend(nested.into_iter().flatten());
    files
}

/// Expands input patterns, relative to `base`, into an ordered list of
/// schema files.
///
/// - a pattern with glob metacharacters is expanded, matches sorted;
/// - a directory is scanned recursively with [`scan_directory`];
/// - anything else is taken as a file path.
///
/// A path already listed by an earlier pattern keeps its first position.
/// Paths in `exclude` (the mixer's output) are never returned.
///
/// # Errors
///
/// Returns [`DiscoverError::Pattern`] for a malformed glob pattern.
pub fn resolve_inputs(
    patterns: &[String],
    base: &Path,
    exclude: &[PathBuf],
) -> Result<Vec<PathBuf>, DiscoverError> {
    let excluded: HashSet<PathBuf> = exclude.iter().map(|p| normalize(&base.join(p))).collect();
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for pattern in patterns {
        for path in expand_pattern(pattern, base)? {
            let key = normalize(&path);
            if excluded.contains(&key) {
                debug!(path = %path.display(), "skipping mixer output");
                continue;
            }
            if seen.insert(key) {
                inputs.push(path);
            }
        }
    }

    debug!(count = inputs.len(), "resolved input files");
    Ok(inputs)
}

fn expand_pattern(pattern: &str, base: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    if !has_glob_meta(pattern) {
        let path = base.join(pattern);
        if path.is_dir() {
            return Ok(scan_directory(&path).into_iter().collect());
        }
        return Ok(vec![path]);
    }

    let full = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        format!(
            "{}/{}",
            glob::Pattern::escape(&base.display().to_string()),
            pattern
        )
    };
    let paths = glob::glob(&full).map_err(|source| DiscoverError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => matches.push(path),
            Ok(_) => {}
            Err(err) => warn!(pattern, error = %err, "failed to read glob match"),
        }
    }
    if matches.is_empty() {
        warn!(pattern, "input pattern matched no files");
    }
    matches.sort();
    Ok(matches)
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Drops `.` components so `./a.prisma` and `a.prisma` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| *component != Component::CurDir)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    fn names(paths: &[PathBuf], base: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| {
                p.strip_prefix(base)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_scan_directory_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.prisma"));
        touch(&root.join("a.prisma"));
        touch(&root.join("schema.prisma"));
        touch(&root.join("draft.ignore.prisma"));
        touch(&root.join("README.md"));
        touch(&root.join("nested/deeper/c.prisma"));

        let found: Vec<PathBuf> = scan_directory(root).into_iter().collect();
        assert_eq!(
            names(&found, root),
            vec!["a.prisma", "b.prisma", "nested/deeper/c.prisma"]
        );
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_directory(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_resolve_inputs_keeps_pattern_order_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("base.prisma"));
        touch(&root.join("features/b.prisma"));
        touch(&root.join("features/a.prisma"));

        let patterns = vec![
            "base.prisma".to_string(),
            "features/*.prisma".to_string(),
            "./base.prisma".to_string(),
        ];
        let inputs = resolve_inputs(&patterns, root, &[]).unwrap();
        assert_eq!(
            names(&inputs, root),
            vec!["base.prisma", "features/a.prisma", "features/b.prisma"]
        );
    }

    #[test]
    fn test_resolve_inputs_excludes_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("prisma/user.prisma"));
        touch(&root.join("prisma/schema.prisma"));

        let inputs = resolve_inputs(
            &["prisma/*.prisma".to_string()],
            root,
            &[PathBuf::from("./prisma/schema.prisma")],
        )
        .unwrap();
        assert_eq!(names(&inputs, root), vec!["prisma/user.prisma"]);
    }

    #[test]
    fn test_resolve_inputs_scans_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("models/post.prisma"));
        touch(&root.join("models/schema.prisma"));

        let inputs = resolve_inputs(&["models".to_string()], root, &[]).unwrap();
        assert_eq!(names(&inputs, root), vec!["models/post.prisma"]);
    }

    #[test]
    fn test_resolve_inputs_passes_plain_paths_through() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = resolve_inputs(&["missing.prisma".to_string()], dir.path(), &[]).unwrap();
        assert_eq!(inputs, vec![dir.path().join("missing.prisma")]);
    }

    #[test]
    fn test_resolve_inputs_rejects_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_inputs(&["[*.prisma".to_string()], dir.path(), &[]).unwrap_err();
        assert!(matches!(err, DiscoverError::Pattern { .. }));
    }
}
