//! Keyword-to-tag annotation rules.
//!
//! Rule files are line oriented. Each active line has the shape
//! `"<keyword>": "<tag>"`; lines starting with `#` are disabled rules.
//! File order is match priority.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(.*?)":\s*"(.*?)""#).unwrap());

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("annotation rule file {path} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single `keyword -> tag` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRule {
    /// Matched as a literal substring.
    pub keyword: String,
    pub tag: String,
}

/// Ordered set of annotation rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationTable {
    rules: Vec<AnnotationRule>,
}

impl AnnotationTable {
    /// Loads rules from a file. A missing or unreadable file is fatal for
    /// the caller.
    pub fn load(path: &Path) -> Result<Self, RuleFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleFileError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&content);
        tracing::info!(path = %path.display(), rules = table.len(), "loaded annotation rules");
        Ok(table)
    }

    /// Parses rule text. Disabled and malformed lines are ignored.
    ///
    /// A repeated keyword takes the later tag but keeps the position of its
    /// first occurrence.
    pub fn parse(content: &str) -> Self {
        let mut table = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some(caps) = RULE_RE.captures(line) else {
                if !line.is_empty() {
                    tracing::debug!(line, "ignoring malformed annotation rule");
                }
                continue;
            };
            table.insert(caps[1].to_string(), caps[2].to_string());
        }
        table
    }

    fn insert(&mut self, keyword: String, tag: String) {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.keyword == keyword) {
            existing.tag = tag;
        } else {
            self.rules.push(AnnotationRule { keyword, tag });
        }
    }

    /// Returns the first rule whose keyword occurs in `line`.
    pub fn match_line(&self, line: &str) -> Option<&AnnotationRule> {
        self.rules.iter().find(|rule| line.contains(rule.keyword.as_str()))
    }

    pub fn rules(&self) -> &[AnnotationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
