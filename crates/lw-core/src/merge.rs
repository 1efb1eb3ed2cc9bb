//! Chronological merge of all discovered logs, plus the annotated view.
//!
//! Every timestamped line lands in the full merge unchanged. Lines that hit
//! an annotation rule additionally appear in the annotated log as
//! `YYYY-MM-DD HH:MM:SS.ffffff [tag] text`, with the original timestamp text
//! removed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::annotate::AnnotationTable;
use crate::kind::LogFile;
use crate::timestamp::{TimestampParser, format_canonical};

/// A line destined for the full merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub at: NaiveDateTime,
    pub text: String,
}

/// Accumulates lines from any number of files.
#[derive(Debug)]
pub struct LogMerger<'a> {
    parser: TimestampParser,
    rules: &'a AnnotationTable,
    merged: Vec<MergedRecord>,
    annotated: Vec<String>,
    dropped: usize,
}

impl<'a> LogMerger<'a> {
    pub const fn new(parser: TimestampParser, rules: &'a AnnotationTable) -> Self {
        Self {
            parser,
            rules,
            merged: Vec::new(),
            annotated: Vec::new(),
            dropped: 0,
        }
    }

    /// Adds one line. Lines without a timestamp are dropped.
    pub fn push_line(&mut self, line: &str) {
        let Some(ts) = self.parser.parse(line) else {
            self.dropped += 1;
            tracing::debug!(line, "no timestamp, dropping line");
            return;
        };

        // Keywords are matched against the untouched line.
        if let Some(rule) = self.rules.match_line(line) {
            self.annotated.push(format!(
                "{} [{}] {}",
                format_canonical(&ts.at),
                rule.tag,
                ts.strip_from(line)
            ));
        }

        self.merged.push(MergedRecord {
            at: ts.at,
            text: line.to_string(),
        });
    }

    /// Adds every line of a file's contents, in order.
    pub fn push_text(&mut self, text: &str) {
        for line in text.lines() {
            self.push_line(line);
        }
    }

    /// Sorts both buffers and returns the rendered lines.
    ///
    /// The full merge is sorted stably by timestamp, so ties keep arrival
    /// order. The annotated lines sort as strings, which is chronological
    /// because they start with a fixed-width timestamp.
    pub fn finish(mut self) -> MergeOutput {
        self.merged.sort_by_key(|record| record.at);
        self.annotated.sort();

        MergeOutput {
            merged: self.merged.into_iter().map(|r| r.text).collect(),
            annotated: self.annotated,
            dropped: self.dropped,
        }
    }
}

/// Rendered artifacts of a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutput {
    pub merged: Vec<String>,
    pub annotated: Vec<String>,
    /// Lines dropped for lack of a timestamp.
    pub dropped: usize,
}

/// Where a merge run wrote its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutputs {
    pub merged: PathBuf,
    pub annotated: PathBuf,
}

fn render(lines: &[String]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// `<dir>/.<name>.tmp`; never matches a log file shape.
fn staging_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".{name}.tmp"))
}

impl MergeOutput {
    pub fn merged_text(&self) -> String {
        render(&self.merged)
    }

    pub fn annotated_text(&self) -> String {
        render(&self.annotated)
    }

    /// Writes both artifacts into `dir`, replacing any previous versions.
    ///
    /// Both are staged as hidden temp files first and only renamed into place
    /// once both writes succeeded, so a failed write leaves the previous pair
    /// untouched.
    pub fn write_to(
        &self,
        dir: &Path,
        merged_name: &str,
        annotated_name: &str,
    ) -> io::Result<WrittenOutputs> {
        let merged = dir.join(merged_name);
        let annotated = dir.join(annotated_name);
        let merged_tmp = staging_path(dir, merged_name);
        let annotated_tmp = staging_path(dir, annotated_name);

        let staged = fs::write(&merged_tmp, self.merged_text())
            .and_then(|()| fs::write(&annotated_tmp, self.annotated_text()));
        if let Err(err) = staged {
            let _ = fs::remove_file(&merged_tmp);
            let _ = fs::remove_file(&annotated_tmp);
            return Err(err);
        }
        fs::rename(&merged_tmp, &merged)?;
        fs::rename(&annotated_tmp, &annotated)?;

        tracing::info!(path = %merged.display(), lines = self.merged.len(), "wrote full merge");
        tracing::info!(path = %annotated.display(), lines = self.annotated.len(), "wrote annotated log");
        Ok(WrittenOutputs { merged, annotated })
    }
}

/// Merges `files` in order. Unreadable files are skipped.
pub fn merge_files<'a>(
    files: impl IntoIterator<Item = &'a LogFile>,
    parser: TimestampParser,
    rules: &AnnotationTable,
) -> MergeOutput {
    let mut merger = LogMerger::new(parser, rules);
    for file in files {
        match file.read_lossy() {
            Ok(text) => {
                tracing::info!(path = %file.path.display(), kind = %file.kind, "merging file");
                merger.push_text(&text);
            }
            Err(err) => {
                tracing::warn!(path = %file.path.display(), error = %err, "skipping unreadable file");
            }
        }
    }
    merger.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> AnnotationTable {
        AnnotationTable::parse(r#""foo": "FOO""#)
    }

    #[test]
    fn test_duplicate_timestamps_survive_in_stable_order() {
        let rules = rules();
        let mut merger = LogMerger::new(TimestampParser::new(2024), &rules);
        merger.push_text(
            "01-01 00:00:01.000000 foo first\n\
             01-01 00:00:02.000000 foo second\n\
             01-01 00:00:01.000000 bar third\n",
        );
        let out = merger.finish();

        assert_eq!(
            out.merged,
            vec![
                "01-01 00:00:01.000000 foo first",
                "01-01 00:00:01.000000 bar third",
                "01-01 00:00:02.000000 foo second",
            ]
        );
        assert_eq!(
            out.annotated,
            vec![
                "2024-01-01 00:00:01.000000 [FOO] foo first",
                "2024-01-01 00:00:02.000000 [FOO] foo second",
            ]
        );
    }

    #[test]
    fn test_untimestamped_lines_are_dropped_everywhere() {
        let rules = rules();
        let mut merger = LogMerger::new(TimestampParser::new(2024), &rules);
        merger.push_text("--------- beginning of foo\n01-01 00:00:01.000000 x\n");
        let out = merger.finish();

        assert_eq!(out.merged.len(), 1);
        assert!(out.annotated.is_empty());
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_keyword_matched_against_unstripped_line() {
        // The keyword only exists inside the timestamp text.
        let rules = AnnotationTable::parse(r#""00:00:07": "SEVEN""#);
        let mut merger = LogMerger::new(TimestampParser::new(2024), &rules);
        merger.push_line("03-04 00:00:07.000000 I tag: hello");
        let out = merger.finish();

        assert_eq!(out.annotated, vec!["2024-03-04 00:00:07.000000 [SEVEN] I tag: hello"]);
    }

    #[test]
    fn test_annotated_sorted_across_files() {
        let rules = rules();
        let mut merger = LogMerger::new(TimestampParser::new(2024), &rules);
        merger.push_text("02-01 10:00:00.000000 foo later\n");
        merger.push_text("01-31 23:59:59.999999 foo earlier\n");
        let out = merger.finish();

        insta::assert_snapshot!(out.annotated_text(), @r"
        2024-01-31 23:59:59.999999 [FOO] foo earlier
        2024-02-01 10:00:00.000000 [FOO] foo later
        ");
        assert_eq!(out.merged[0], "01-31 23:59:59.999999 foo earlier");
    }

    #[test]
    fn test_write_to_replaces_previous_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("full.log"), "stale\nstale\nstale\n").unwrap();

        let out = MergeOutput {
            merged: vec!["a".into()],
            annotated: vec![],
            dropped: 0,
        };
        let written = out.write_to(dir.path(), "full.log", "notes.log").unwrap();

        assert_eq!(std::fs::read_to_string(written.merged).unwrap(), "a\n");
        assert_eq!(std::fs::read_to_string(written.annotated).unwrap(), "");
        assert!(!dir.path().join(".full.log.tmp").exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("full.log"), "old full\n").unwrap();
        std::fs::write(dir.path().join("notes.log"), "old notes\n").unwrap();
        // A directory in the staging spot makes the second write fail.
        std::fs::create_dir(dir.path().join(".notes.log.tmp")).unwrap();

        let out = MergeOutput {
            merged: vec!["new".into()],
            annotated: vec!["new".into()],
            dropped: 0,
        };
        assert!(out.write_to(dir.path(), "full.log", "notes.log").is_err());

        assert_eq!(std::fs::read_to_string(dir.path().join("full.log")).unwrap(), "old full\n");
        assert_eq!(std::fs::read_to_string(dir.path().join("notes.log")).unwrap(), "old notes\n");
        assert!(!dir.path().join(".full.log.tmp").exists());
    }
}
