//! Log file discovery and classification.
//!
//! Walks an input root, classifies files by filename shape, and resolves raw
//! kernel logs to their normalized `.localtime` siblings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::kind::{LogFile, SubsystemKind};
use crate::normalize::{Normalizer, localtime_sibling};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("input root not found: {0}")]
    NotFound(PathBuf),
}

/// How a filename was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileShape {
    /// Kernel log already rewritten to wall-clock time.
    Normalized,
    /// Kernel log that still needs normalization.
    Raw,
    /// Any other kind; read as-is.
    Plain,
}

/// Ordered filename patterns. The first match wins.
static SHAPES: LazyLock<Vec<(Regex, SubsystemKind, FileShape)>> = LazyLock::new(|| {
    const STAMP: &str = r"_\d+__\d{4}_\d{4}_\d{6}";
    let mut shapes = vec![
        (
            Regex::new(&format!(r"^kernel_log{STAMP}\.localtime$")).unwrap(),
            SubsystemKind::Kernel,
            FileShape::Normalized,
        ),
        (
            Regex::new(&format!(r"^kernel_log{STAMP}$")).unwrap(),
            SubsystemKind::Kernel,
            FileShape::Raw,
        ),
    ];
    for kind in [
        SubsystemKind::Main,
        SubsystemKind::Sys,
        SubsystemKind::Events,
        SubsystemKind::Radio,
    ] {
        let prefix = kind.file_prefix().trim_end_matches('_');
        shapes.push((
            Regex::new(&format!(r"^{prefix}{STAMP}")).unwrap(),
            kind,
            FileShape::Plain,
        ));
    }
    shapes
});

/// Classifies a bare filename, or `None` if it is not a recognized log.
pub fn classify(file_name: &str) -> Option<(SubsystemKind, FileShape)> {
    SHAPES
        .iter()
        .find(|(re, _, _)| re.is_match(file_name))
        .map(|(_, kind, shape)| (*kind, *shape))
}

/// A kernel log that could not be normalized and was left out.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of discovery: resolved files in lexicographic path order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    pub files: Vec<LogFile>,
    pub skipped: Vec<SkippedFile>,
}

impl Discovery {
    /// Files of the given kinds, preserving discovery order.
    pub fn files_of<'a>(&'a self, kinds: &'a [SubsystemKind]) -> impl Iterator<Item = &'a LogFile> {
        self.files.iter().filter(|f| kinds.contains(&f.kind))
    }
}

/// Fails with [`DiscoveryError::NotFound`] unless `root` is a directory.
pub fn ensure_root(root: &Path) -> Result<(), DiscoveryError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(DiscoveryError::NotFound(root.to_path_buf()))
    }
}

/// Recursively discovers log files under `root`.
///
/// Raw kernel logs resolve to an existing `.localtime` sibling when present;
/// otherwise `normalizer` is invoked. Normalization failures are recorded in
/// [`Discovery::skipped`] and never abort the walk. Each path appears at most
/// once in the result.
pub fn discover(root: &Path, normalizer: &dyn Normalizer) -> Result<Discovery, DiscoveryError> {
    ensure_root(root)?;

    let mut discovery = Discovery::default();
    let mut added: HashSet<PathBuf> = HashSet::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 file name");
            continue;
        };
        let Some((kind, shape)) = classify(name) else {
            continue;
        };

        let path = entry.path();
        let resolved = match shape {
            FileShape::Plain => LogFile::new(path, kind, false),
            FileShape::Normalized => LogFile::new(path, kind, true),
            FileShape::Raw => {
                let sibling = localtime_sibling(path);
                if sibling.is_file() {
                    LogFile::new(sibling, kind, true)
                } else {
                    match normalizer.normalize(path) {
                        Ok(out) => LogFile::new(out, kind, true),
                        Err(err) => {
                            tracing::warn!(path = %path.display(), error = %err, "normalization failed, excluding file");
                            discovery.skipped.push(SkippedFile {
                                path: path.to_path_buf(),
                                reason: err.to_string(),
                            });
                            continue;
                        }
                    }
                }
            }
        };

        if added.insert(resolved.path.clone()) {
            discovery.files.push(resolved);
        }
    }

    discovery.files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!(
        root = %root.display(),
        files = discovery.files.len(),
        skipped = discovery.skipped.len(),
        "discovery complete"
    );
    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::normalize::NormalizeError;

    /// Records calls and copies the raw file when `succeed` is set.
    struct FakeNormalizer {
        succeed: bool,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl FakeNormalizer {
        fn new(succeed: bool) -> Self {
            Self {
                succeed,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Normalizer for FakeNormalizer {
        fn normalize(&self, raw: &Path) -> Result<PathBuf, NormalizeError> {
            self.calls.borrow_mut().push(raw.to_path_buf());
            if !self.succeed {
                return Err(NormalizeError::MissingOutput(localtime_sibling(raw)));
            }
            let out = localtime_sibling(raw);
            std::fs::copy(raw, &out).unwrap();
            Ok(out)
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, "01-01 00:00:01.000000 x\n").unwrap();
        path
    }

    fn names(discovery: &Discovery) -> Vec<String> {
        discovery
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_classify_shapes() {
        assert_eq!(
            classify("kernel_log_2__0101_0101_120000"),
            Some((SubsystemKind::Kernel, FileShape::Raw))
        );
        assert_eq!(
            classify("kernel_log_2__0101_0101_120000.localtime"),
            Some((SubsystemKind::Kernel, FileShape::Normalized))
        );
        assert_eq!(
            classify("main_log_10__0101_0101_120000"),
            Some((SubsystemKind::Main, FileShape::Plain))
        );
        assert_eq!(
            classify("radio_log_1__0101_0101_120000.gz.txt"),
            Some((SubsystemKind::Radio, FileShape::Plain))
        );
        assert_eq!(classify("kernel_log_2__0101_0101_120000.bak"), None);
        assert_eq!(classify("merged_full.log"), None);
        assert_eq!(classify("crash_log_1__0101_0101_120000"), None);
    }

    #[test]
    fn test_discover_nonexistent_root() {
        let err = discover(Path::new("/nonexistent/lw-root"), &FakeNormalizer::new(true)).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound(_)));
    }

    #[test]
    fn test_discover_sorts_and_classifies_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "sys_log_2__0101_0101_000000");
        touch(dir.path(), "main_log_1__0101_0101_000000");
        touch(dir.path(), "nested/events_log_1__0101_0101_000000");
        touch(dir.path(), "notes.txt");

        let discovery = discover(dir.path(), &FakeNormalizer::new(true)).unwrap();

        assert_eq!(
            names(&discovery),
            vec![
                "main_log_1__0101_0101_000000",
                "events_log_1__0101_0101_000000",
                "sys_log_2__0101_0101_000000",
            ]
        );
        let paths: Vec<_> = discovery.files.iter().map(|f| f.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_existing_sibling_is_used_once_without_normalizing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "kernel_log_1__0101_0101_000000");
        touch(dir.path(), "kernel_log_1__0101_0101_000000.localtime");

        let normalizer = FakeNormalizer::new(true);
        let discovery = discover(dir.path(), &normalizer).unwrap();

        assert_eq!(
            names(&discovery),
            vec!["kernel_log_1__0101_0101_000000.localtime"]
        );
        assert!(discovery.files[0].normalized);
        assert!(normalizer.calls.borrow().is_empty());
    }

    #[test]
    fn test_raw_kernel_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let raw = touch(dir.path(), "kernel_log_1__0101_0101_000000");

        let normalizer = FakeNormalizer::new(true);
        let discovery = discover(dir.path(), &normalizer).unwrap();

        assert_eq!(*normalizer.calls.borrow(), vec![raw]);
        assert_eq!(
            names(&discovery),
            vec!["kernel_log_1__0101_0101_000000.localtime"]
        );
    }

    #[test]
    fn test_failed_normalization_excludes_file_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "kernel_log_1__0101_0101_000000");
        touch(dir.path(), "main_log_1__0101_0101_000000");

        let discovery = discover(dir.path(), &FakeNormalizer::new(false)).unwrap();

        assert_eq!(names(&discovery), vec!["main_log_1__0101_0101_000000"]);
        assert_eq!(discovery.skipped.len(), 1);
        assert!(
            discovery.skipped[0]
                .path
                .ends_with("kernel_log_1__0101_0101_000000")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_name_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join(OsStr::from_bytes(b"main_log_1__0101_0101_\xff"));
        // Some filesystems refuse non-UTF-8 names outright.
        if std::fs::write(&odd, "01-01 00:00:01.000000 x\n").is_err() {
            return;
        }
        touch(dir.path(), "main_log_2__0101_0101_000000");

        let discovery = discover(dir.path(), &FakeNormalizer::new(true)).unwrap();

        assert_eq!(names(&discovery), vec!["main_log_2__0101_0101_000000"]);
    }

    #[test]
    fn test_files_of_filters_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main_log_1__0101_0101_000000");
        touch(dir.path(), "radio_log_1__0101_0101_000000");

        let discovery = discover(dir.path(), &FakeNormalizer::new(true)).unwrap();
        let main_only: Vec<_> = discovery.files_of(&[SubsystemKind::Main]).collect();

        assert_eq!(main_only.len(), 1);
        assert_eq!(main_only[0].kind, SubsystemKind::Main);
    }
}
