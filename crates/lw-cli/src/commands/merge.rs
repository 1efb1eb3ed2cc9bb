//! Merge command: full chronological log plus annotated summary.
//!
//! Both artifacts are written into the input root and fully replaced on
//! every run. Nothing is written unless the rule file loads.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use lw_core::merge::WrittenOutputs;
use lw_core::{AnnotationTable, TimestampParser, ensure_root, merge_files};

use super::discover::resolve;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, root: &Path, config: &Config) -> Result<WrittenOutputs> {
    ensure_root(root)?;
    let rules = AnnotationTable::load(&config.rules_path).context("cannot annotate without rules")?;

    let discovery = resolve(root, config)?;
    let parser = TimestampParser::new(config.year_or_current());
    let output = merge_files(&discovery.files, parser, &rules);

    let written = output
        .write_to(root, &config.merged_output, &config.annotated_output)
        .with_context(|| format!("failed to write outputs into {}", root.display()))?;

    writeln!(
        writer,
        "Merged {} lines from {} files into {}",
        output.merged.len(),
        discovery.files.len(),
        written.merged.display()
    )?;
    writeln!(
        writer,
        "Annotated {} lines into {}",
        output.annotated.len(),
        written.annotated.display()
    )?;
    if !discovery.skipped.is_empty() {
        writeln!(writer, "Skipped {} unconvertible kernel logs", discovery.skipped.len())?;
    }

    Ok(written)
}
