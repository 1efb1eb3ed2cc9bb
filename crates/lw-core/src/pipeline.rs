//! Metric extraction pass over discovered files.

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::cascade::{PatternCascade, Rule};
use crate::context::StatefulContext;
use crate::kind::LogFile;
use crate::metrics::{MetricAccumulator, MetricSeries};
use crate::timestamp::TimestampParser;

/// Per-file counters, logged after each file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    pub lines: usize,
    pub timestamped: usize,
    pub duplicate_timestamps: usize,
    pub readings: usize,
}

/// Runs the pattern cascade over files and accumulates series.
#[derive(Debug, Clone)]
pub struct MetricPipeline {
    parser: TimestampParser,
    cascade: PatternCascade,
}

impl MetricPipeline {
    pub const fn new(parser: TimestampParser, cascade: PatternCascade) -> Self {
        Self { parser, cascade }
    }

    /// Processes `files` in the given order with one context for the whole
    /// run. Unreadable files are skipped.
    pub fn run<'a>(&self, files: impl IntoIterator<Item = &'a LogFile>) -> MetricSeries {
        let mut ctx = StatefulContext::new();
        let mut acc = MetricAccumulator::new();

        for file in files {
            let text = match file.read_lossy() {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(path = %file.path.display(), error = %err, "skipping unreadable file");
                    continue;
                }
            };
            let stats = self.process_text(&text, &mut ctx, &mut acc);
            tracing::info!(
                path = %file.path.display(),
                kind = %file.kind,
                lines = stats.lines,
                readings = stats.readings,
                duplicates = stats.duplicate_timestamps,
                network_type = ctx.current_network_type().unwrap_or("-"),
                "processed file"
            );
        }

        acc.finish()
    }

    /// Processes the contents of one file.
    ///
    /// Only the first line carrying a given timestamp within this text is
    /// considered; later lines with the same timestamp are skipped whatever
    /// they contain.
    pub fn process_text(
        &self,
        text: &str,
        ctx: &mut StatefulContext,
        acc: &mut MetricAccumulator,
    ) -> FileStats {
        let mut stats = FileStats::default();
        let mut seen: HashSet<NaiveDateTime> = HashSet::new();

        for line in text.lines() {
            stats.lines += 1;
            let Some(ts) = self.parser.parse(line) else {
                continue;
            };
            stats.timestamped += 1;
            if !seen.insert(ts.at) {
                stats.duplicate_timestamps += 1;
                continue;
            }
            if let Some(reading) = self.cascade.match_line(line) {
                stats.readings += 1;
                acc.record(ts.at, reading, ctx);
            }
        }

        stats
    }
}

/// Scans `text` once per rule, keeping every timestamped line each rule
/// matches.
///
/// Rules do not compete for lines and there is no timestamp dedup, so two
/// rules can both read the same line and repeated timestamps all count.
pub fn scan_each(parser: TimestampParser, rules: &[Rule], text: &str) -> MetricSeries {
    let mut ctx = StatefulContext::new();
    let mut acc = MetricAccumulator::new();

    for rule in rules {
        let mut matched = 0usize;
        for line in text.lines() {
            let Some(ts) = parser.parse(line) else {
                continue;
            };
            if let Some(reading) = rule.apply(line) {
                matched += 1;
                acc.record(ts.at, reading, &mut ctx);
            }
        }
        tracing::debug!(rule = ?rule.kind(), matched, "scanned rule");
    }

    acc.finish()
}
