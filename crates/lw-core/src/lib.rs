//! Core engine for device log correlation.
//!
//! This crate contains:
//! - Discovery: finding and classifying kernel/main/sys/radio/events logs
//! - Normalization: the boundary to the external kernel time converter
//! - Timestamp parsing for the year-less device log grammar
//! - Merging: one chronological log plus a keyword-annotated summary
//! - Metrics: the pattern cascade and the series it feeds

pub mod annotate;
pub mod cascade;
mod context;
pub mod discovery;
mod kind;
pub mod merge;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod timestamp;

pub use annotate::{AnnotationRule, AnnotationTable, RuleFileError};
pub use cascade::{CascadeError, MarkerKind, PatternCascade, Reading, Rule, RuleKind};
pub use context::StatefulContext;
pub use discovery::{Discovery, DiscoveryError, SkippedFile, discover, ensure_root};
pub use kind::{LogFile, SubsystemKind, read_lossy};
pub use merge::{LogMerger, MergeOutput, merge_files};
pub use metrics::{Metric, MetricAccumulator, MetricSeries, Sample, TouchEvent};
pub use normalize::{ExternalNormalizer, NormalizeError, Normalizer};
pub use pipeline::{MetricPipeline, scan_each};
pub use timestamp::TimestampParser;
