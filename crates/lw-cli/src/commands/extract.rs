//! Extract command: ad-hoc numeric extraction from one file.
//!
//! Each `--pattern` is a literal line fragment with `XXX` marking a signed
//! integer. Every pattern scans the whole file on its own, so patterns may
//! read the same line.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use lw_core::cascade::TEMPLATE_PLACEHOLDER;
use lw_core::{Rule, TimestampParser, read_lossy, scan_each};

use crate::Config;

/// Series name for a template: the last word before the placeholder, or
/// `pattern_<n>` when that is empty or already taken.
fn series_name(template: &str, index: usize, taken: &HashSet<String>) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let prefix = template.split(TEMPLATE_PLACEHOLDER).next().unwrap_or_default();
    let word = prefix
        .trim_end_matches(|c| !is_word(c))
        .rsplit(|c| !is_word(c))
        .next()
        .unwrap_or_default();

    if word.is_empty() || taken.contains(word) {
        format!("pattern_{}", index + 1)
    } else {
        word.to_string()
    }
}

pub fn run<W: Write>(writer: &mut W, file: &Path, patterns: &[String], config: &Config) -> Result<()> {
    anyhow::ensure!(file.is_file(), "log file not found: {}", file.display());

    let mut taken = HashSet::new();
    let mut rules = Vec::with_capacity(patterns.len());
    for (index, template) in patterns.iter().enumerate() {
        let name = series_name(template, index, &taken);
        let rule = Rule::from_template(&name, template)
            .with_context(|| format!("invalid extraction pattern {template:?}"))?;
        tracing::debug!(%name, %template, "compiled pattern");
        taken.insert(name);
        rules.push(rule);
    }

    let text = read_lossy(file).with_context(|| format!("failed to read {}", file.display()))?;
    let series = scan_each(TimestampParser::new(config.year_or_current()), &rules, &text);

    for (metric, samples) in &series.series {
        tracing::info!(%metric, samples = samples.len(), "extracted");
    }
    if series.series.is_empty() {
        tracing::warn!("no lines matched any pattern");
    }

    writeln!(writer, "{}", serde_json::to_string_pretty(&series.series)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(json: &serde_json::Value, key: &str) -> Vec<f64> {
        json[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["value"].as_f64().unwrap())
            .collect()
    }

    fn extract(content: &str, patterns: &[&str]) -> serde_json::Value {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("main_log_1__0101_0101_000000");
        std::fs::write(&file, content).unwrap();
        let config = Config {
            year: Some(2024),
            ..Config::default()
        };
        let patterns: Vec<String> = patterns.iter().map(ToString::to_string).collect();

        let mut output = Vec::new();
        run(&mut output, &file, &patterns, &config).unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn test_extract_uses_only_given_patterns() {
        let json = extract(
            "01-01 00:00:01.000000 ====>>rssi :-61\n\
             01-01 00:00:02.000000 ====>>rssi :-64\n\
             01-01 00:00:03.000000 BatteryLabService: current level == 50, temperature == 250\n",
            &["rssi :XXX"],
        );

        assert_eq!(json.as_object().unwrap().len(), 1);
        assert_eq!(values(&json, "custom.rssi"), vec![-61.0, -64.0]);
    }

    #[test]
    fn test_extract_patterns_share_lines_and_timestamps() {
        let json = extract(
            "01-01 00:00:01.000000 a=1 b=2\n\
             01-01 00:00:02.000000 a=3\n\
             01-01 00:00:02.000000 b=4\n",
            &["a=XXX", "b=XXX"],
        );

        assert_eq!(values(&json, "custom.a"), vec![1.0, 3.0]);
        assert_eq!(values(&json, "custom.b"), vec![2.0, 4.0]);
    }

    #[test]
    fn test_series_names() {
        let mut taken = HashSet::new();
        assert_eq!(series_name("[LTE] dbm: XXX", 0, &taken), "dbm");
        assert_eq!(series_name("XXX ms", 1, &taken), "pattern_2");
        taken.insert("dbm".to_string());
        assert_eq!(series_name("dbm=XXX", 2, &taken), "pattern_3");
    }

    #[test]
    fn test_extract_rejects_pattern_without_placeholder() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("x.log");
        std::fs::write(&file, "").unwrap();

        let mut output = Vec::new();
        let result = run(&mut output, &file, &["rssi".to_string()], &Config::default());
        assert!(result.is_err());
    }
}
