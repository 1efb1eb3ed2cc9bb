//! Metric time series built from cascade readings.
//!
//! Each metric owns an append-only list of the samples that actually
//! occurred. Consumers that want a table aligned across metrics use
//! [`MetricSeries::aligned`], which merges series on timestamp.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

use crate::cascade::{MarkerKind, Reading};
use crate::context::StatefulContext;

/// A tracked numeric quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    ChipTemp1,
    ChipTemp2,
    ChipTemp3,
    BattTempKernel,
    BattTempMain,
    BattTempHealthd,
    RadioTemp,
    BattLevelMain,
    BattLevelKernel,
    CellularSignal,
    WifiSignal,
    /// Zero-based core index.
    CpuCore(u8),
    Backlight,
    FrameRate,
    Custom(String),
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ChipTemp1 => "chip_temp_1",
            Self::ChipTemp2 => "chip_temp_2",
            Self::ChipTemp3 => "chip_temp_3",
            Self::BattTempKernel => "batt_temp_kernel",
            Self::BattTempMain => "batt_temp_main",
            Self::BattTempHealthd => "batt_temp_healthd",
            Self::RadioTemp => "radio_temp",
            Self::BattLevelMain => "batt_level_main",
            Self::BattLevelKernel => "batt_level_kernel",
            Self::CellularSignal => "cellular_signal",
            Self::WifiSignal => "wifi_signal",
            Self::CpuCore(core) => return write!(f, "cpu_core_{core}"),
            Self::Backlight => "backlight",
            Self::FrameRate => "frame_rate",
            Self::Custom(name) => return write!(f, "custom.{name}"),
        };
        f.write_str(s)
    }
}

impl Serialize for Metric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One observed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub at: NaiveDateTime,
    pub value: f64,
    /// Network type in effect when a signal sample was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
}

/// A change of the carried network type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkTransition {
    pub at: NaiveDateTime,
    pub from: String,
    pub to: String,
}

/// One touch-driver report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TouchEvent {
    pub at: NaiveDateTime,
    pub down: bool,
    pub x: u32,
    pub y: u32,
}

/// Finished series handed to charting consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSeries {
    pub series: BTreeMap<Metric, Vec<Sample>>,
    pub network_transitions: Vec<NetworkTransition>,
    pub markers: BTreeMap<MarkerKind, Vec<NaiveDateTime>>,
    pub touches: Vec<TouchEvent>,
    /// Start of the kernel perf statistics window. The last report wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perf_statistic_start: Option<NaiveDateTime>,
}

/// Series merged on timestamp: one row per distinct timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedTable {
    pub columns: Vec<Metric>,
    pub rows: Vec<AlignedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub at: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

impl MetricSeries {
    /// Samples for `metric`, or an empty slice.
    pub fn get(&self, metric: &Metric) -> &[Sample] {
        self.series.get(metric).map_or(&[], Vec::as_slice)
    }

    pub fn markers(&self, kind: MarkerKind) -> &[NaiveDateTime] {
        self.markers.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Total number of samples across all metrics.
    pub fn sample_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Touch reports (down and up) bucketed by the minute they fall in.
    pub fn touches_per_minute(&self) -> BTreeMap<NaiveDateTime, usize> {
        let mut counts = BTreeMap::new();
        for touch in &self.touches {
            let minute = touch
                .at
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(touch.at);
            *counts.entry(minute).or_insert(0) += 1;
        }
        counts
    }

    /// Builds a table with one row per distinct timestamp and one column per
    /// metric. If a metric has several samples at one timestamp, the last
    /// one appended wins.
    pub fn aligned(&self) -> AlignedTable {
        let columns: Vec<Metric> = self.series.keys().cloned().collect();
        let timestamps: BTreeSet<NaiveDateTime> = self
            .series
            .values()
            .flat_map(|samples| samples.iter().map(|s| s.at))
            .collect();

        let index: BTreeMap<NaiveDateTime, usize> = timestamps
            .iter()
            .enumerate()
            .map(|(i, at)| (*at, i))
            .collect();
        let mut rows: Vec<AlignedRow> = timestamps
            .into_iter()
            .map(|at| AlignedRow {
                at,
                values: vec![None; columns.len()],
            })
            .collect();

        for (col, samples) in self.series.values().enumerate() {
            for sample in samples {
                rows[index[&sample.at]].values[col] = Some(sample.value);
            }
        }

        AlignedTable { columns, rows }
    }
}

/// Turns readings into series, consulting and updating the carried context.
#[derive(Debug, Default)]
pub struct MetricAccumulator {
    out: MetricSeries,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, metric: Metric, at: NaiveDateTime, value: f64, network_type: Option<&str>) {
        self.out.series.entry(metric).or_default().push(Sample {
            at,
            value,
            network_type: network_type.map(str::to_string),
        });
    }

    /// Records one reading observed at `at`.
    #[expect(clippy::cast_precision_loss, reason = "log readings are small integers")]
    pub fn record(&mut self, at: NaiveDateTime, reading: Reading, ctx: &mut StatefulContext) {
        match reading {
            Reading::ChipTemp { tmp1, tmp2, tmp3 } => {
                self.push(Metric::ChipTemp1, at, tmp1 as f64, None);
                self.push(Metric::ChipTemp2, at, tmp2 as f64, None);
                self.push(Metric::ChipTemp3, at, tmp3 as f64, None);
            }
            Reading::BattTempKernel { celsius } => {
                self.push(Metric::BattTempKernel, at, celsius, None);
            }
            Reading::RadioTemp { celsius } => {
                self.push(Metric::RadioTemp, at, celsius as f64, None);
            }
            Reading::BattLevelAndTempMain { level, celsius } => {
                self.push(Metric::BattLevelMain, at, level as f64, None);
                self.push(Metric::BattTempMain, at, celsius, None);
            }
            Reading::BattLevelKernel { level, celsius } => {
                self.push(Metric::BattLevelKernel, at, level as f64, None);
                self.push(Metric::BattTempHealthd, at, celsius, None);
            }
            Reading::CpuUsage { cores } => {
                for (core, usage) in (0u8..).zip(cores) {
                    self.push(Metric::CpuCore(core), at, f64::from(usage), None);
                }
            }
            Reading::CellularSignal { dbm } => {
                self.push(Metric::CellularSignal, at, f64::from(dbm), ctx.current_network_type());
            }
            Reading::WifiSignal { dbm } => {
                self.push(Metric::WifiSignal, at, f64::from(dbm), ctx.current_network_type());
            }
            Reading::NetworkTypeChange { from, to } => {
                if ctx.observe_network_type(&to) {
                    tracing::debug!(%at, %from, %to, "network type changed");
                    self.out
                        .network_transitions
                        .push(NetworkTransition { at, from, to });
                }
            }
            Reading::Backlight { level } => {
                self.push(Metric::Backlight, at, f64::from(level), None);
            }
            Reading::FrameRate { fps } => {
                self.push(Metric::FrameRate, at, f64::from(fps), None);
            }
            Reading::Touch { down, x, y } => {
                self.out.touches.push(TouchEvent { at, down, x, y });
            }
            Reading::PerfStatisticStart {
                month,
                day,
                hour,
                minute,
                second,
            } => {
                // The reported instant has no year; borrow the line's.
                let start = NaiveDate::from_ymd_opt(at.year(), month, day)
                    .and_then(|date| date.and_hms_opt(hour, minute, second));
                match start {
                    Some(start) => self.out.perf_statistic_start = Some(start),
                    None => tracing::debug!(%at, month, day, "invalid perf statistic start, ignoring"),
                }
            }
            Reading::Marker(kind) => {
                self.out.markers.entry(kind).or_default().push(at);
            }
            Reading::Custom { name, value } => {
                self.push(Metric::Custom(name), at, value as f64, None);
            }
        }
    }

    pub fn finish(self) -> MetricSeries {
        self.out
    }
}
