//! Metrics command: run the pattern cascade and print series as JSON.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use lw_core::{MetricPipeline, PatternCascade, Rule, TimestampParser};

use super::discover::resolve;
use crate::Config;

/// Built-in cascade followed by the configured custom rules.
pub fn build_cascade(config: &Config) -> Result<PatternCascade> {
    let mut cascade = PatternCascade::standard();
    for custom in &config.custom_metrics {
        let rule = Rule::from_template(&custom.name, &custom.template)
            .with_context(|| format!("invalid custom metric {}", custom.name))?;
        cascade.push(rule);
    }
    Ok(cascade)
}

pub fn run<W: Write>(writer: &mut W, root: &Path, aligned: bool, config: &Config) -> Result<()> {
    let cascade = build_cascade(config)?;
    let discovery = resolve(root, config)?;

    let pipeline = MetricPipeline::new(TimestampParser::new(config.year_or_current()), cascade);
    let series = pipeline.run(discovery.files_of(&config.metric_kinds));
    tracing::info!(samples = series.sample_count(), metrics = series.series.len(), "metric extraction complete");

    let json = if aligned {
        serde_json::to_string_pretty(&series.aligned())?
    } else {
        serde_json::to_string_pretty(&series)?
    };
    writeln!(writer, "{json}")?;
    Ok(())
}
