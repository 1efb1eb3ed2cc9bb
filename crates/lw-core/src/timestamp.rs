//! Year-less `MM-DD HH:MM:SS.ffffff` timestamp extraction.
//!
//! Device logs omit the year, so the parser is anchored to a caller-supplied
//! year. Lines without a usable timestamp yield `None`; nothing here errors.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

/// Embedded timestamp as it appears in kernel/main/sys/radio/events lines.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})\.(\d+)").unwrap()
});

/// Maximum number of fractional digits (microsecond precision).
const MAX_FRACTION_DIGITS: usize = 6;

/// Output format for timestamps in the annotated log. Fixed width, so the
/// lexicographic order of formatted values is chronological.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A timestamp found in a line, with the byte range it occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTimestamp {
    pub at: NaiveDateTime,
    pub span: Range<usize>,
}

impl LineTimestamp {
    /// Returns `line` with this timestamp's text removed and surrounding
    /// whitespace trimmed.
    pub fn strip_from(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        out.push_str(&line[..self.span.start]);
        out.push_str(&line[self.span.end..]);
        out.trim().to_string()
    }
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS.ffffff`.
pub fn format_canonical(at: &NaiveDateTime) -> String {
    at.format(CANONICAL_FORMAT).to_string()
}

/// Extracts timestamps from log lines, anchored to a fixed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampParser {
    year: i32,
}

impl TimestampParser {
    pub const fn new(year: i32) -> Self {
        Self { year }
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Finds the first embedded timestamp in `line`.
    ///
    /// Returns `None` when the pattern is absent or any component is out of
    /// range (month 13, Feb 29 in a non-leap anchor year, more than six
    /// fractional digits, ...).
    pub fn parse(&self, line: &str) -> Option<LineTimestamp> {
        let caps = TIMESTAMP_RE.captures(line)?;
        let whole = caps.get(0)?;

        let at = self.build(&caps);
        if at.is_none() {
            tracing::debug!(
                timestamp = whole.as_str(),
                year = self.year,
                "unparsable timestamp, skipping line"
            );
        }

        Some(LineTimestamp {
            at: at?,
            span: whole.range(),
        })
    }

    fn build(&self, caps: &regex::Captures<'_>) -> Option<NaiveDateTime> {
        let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();

        let fraction = caps.get(6)?.as_str();
        if fraction.len() > MAX_FRACTION_DIGITS {
            return None;
        }
        // Right-pad to microseconds: ".5" means 500000us.
        let padding = u32::try_from(MAX_FRACTION_DIGITS - fraction.len()).ok()?;
        let micros = fraction.parse::<u32>().ok()? * 10u32.pow(padding);

        NaiveDate::from_ymd_opt(self.year, field(1)?, field(2)?)?.and_hms_micro_opt(
            field(3)?,
            field(4)?,
            field(5)?,
            micros,
        )
    }
}
