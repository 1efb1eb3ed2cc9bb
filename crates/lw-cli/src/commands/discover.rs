//! Discover command: list the files a run would process.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use lw_core::{Discovery, ExternalNormalizer, discover};

use crate::Config;

/// Runs discovery under `root` with the configured normalizer.
pub fn resolve(root: &Path, config: &Config) -> Result<Discovery> {
    let normalizer = ExternalNormalizer::new(&config.normalizer);
    discover(root, &normalizer).with_context(|| format!("failed to scan {}", root.display()))
}

pub fn run<W: Write>(writer: &mut W, root: &Path, json: bool, config: &Config) -> Result<()> {
    let discovery = resolve(root, config)?;

    if json {
        let json = serde_json::to_string_pretty(&discovery)?;
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    if discovery.files.is_empty() {
        writeln!(writer, "No log files found.")?;
    }
    for file in &discovery.files {
        let relative = file.path.strip_prefix(root).unwrap_or(&file.path);
        writeln!(writer, "{:<6}  {}", file.kind.as_str(), relative.display())?;
    }
    for skipped in &discovery.skipped {
        let relative = skipped.path.strip_prefix(root).unwrap_or(&skipped.path);
        writeln!(writer, "skipped {}: {}", relative.display(), skipped.reason)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn test_discover_lists_files_by_kind() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main_log_1__0101_0101_000000"), "").unwrap();
        std::fs::write(temp.path().join("sys_log_1__0101_0101_000000"), "").unwrap();
        std::fs::write(
            temp.path().join("kernel_log_1__0101_0101_000000.localtime"),
            "",
        )
        .unwrap();
        std::fs::write(temp.path().join("README"), "").unwrap();

        let mut output = Vec::new();
        run(&mut output, temp.path(), false, &Config::default()).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        kernel  kernel_log_1__0101_0101_000000.localtime
        main    main_log_1__0101_0101_000000
        sys     sys_log_1__0101_0101_000000
        ");
    }

    #[test]
    fn test_discover_missing_root_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();
        let err = run(&mut output, &temp.path().join("nope"), false, &Config::default()).unwrap_err();
        assert!(format!("{err:#}").contains("input root not found"));
    }
}
