//! Ordered, first-match-wins recognizers for metric-bearing line shapes.

use std::fmt;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder for the numeric value in a custom template.
pub const TEMPLATE_PLACEHOLDER: &str = "XXX";

/// Number of per-core values in a CPU usage line.
pub const CPU_CORES: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CascadeError {
    #[error("template for {name} has no {TEMPLATE_PLACEHOLDER} placeholder: {template}")]
    MissingPlaceholder { name: String, template: String },
    #[error("invalid pattern for {name}: {message}")]
    InvalidPattern { name: String, message: String },
}

/// Point-in-time events that carry no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    AnrWarning,
    AppNotResponding,
}

impl MarkerKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AnrWarning => "anr_warning",
            Self::AppNotResponding => "app_not_responding",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed fields extracted from one matched line.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Three chip thermal sensors (MTK_BH).
    ChipTemp { tmp1: i64, tmp2: i64, tmp3: i64 },
    /// Kernel-reported battery temperature, degrees Celsius.
    BattTempKernel { celsius: f64 },
    /// Radio module temperature, decoded from hex.
    RadioTemp { celsius: i64 },
    /// Battery level and temperature from the main log.
    BattLevelAndTempMain { level: i64, celsius: f64 },
    /// Battery level and temperature reported by healthd.
    BattLevelKernel { level: i64, celsius: f64 },
    /// Per-core CPU utilization. Not range-checked.
    CpuUsage { cores: [u32; CPU_CORES] },
    /// LTE signal strength in dBm.
    CellularSignal { dbm: i32 },
    /// Wi-Fi RSSI in dBm.
    WifiSignal { dbm: i32 },
    NetworkTypeChange { from: String, to: String },
    Backlight { level: u32 },
    FrameRate { fps: u32 },
    /// Single-finger touch report from the touch driver.
    Touch { down: bool, x: u32, y: u32 },
    /// Wall-clock start of the kernel perf statistics window, which carries
    /// its own `MM-DD HH:MM:SS` instant without fraction.
    PerfStatisticStart {
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    },
    Marker(MarkerKind),
    /// Value captured by a user template.
    Custom { name: String, value: i64 },
}

/// Which shape a rule recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    ChipTemp,
    BattTempKernel,
    RadioTemp,
    BattLevelAndTempMain,
    BattLevelKernel,
    CpuUsage,
    CellularSignal,
    WifiSignal,
    NetworkTypeChange,
    Backlight,
    FrameRate,
    Touch,
    PerfStatisticStart,
    AnrWarning,
    AppNotResponding,
    Custom(String),
}

impl RuleKind {
    /// Built-in rules in evaluation order.
    pub const BUILTIN: [Self; 15] = [
        Self::ChipTemp,
        Self::BattTempKernel,
        Self::RadioTemp,
        Self::BattLevelAndTempMain,
        Self::BattLevelKernel,
        Self::CpuUsage,
        Self::CellularSignal,
        Self::WifiSignal,
        Self::NetworkTypeChange,
        Self::Backlight,
        Self::FrameRate,
        Self::Touch,
        Self::PerfStatisticStart,
        Self::AnrWarning,
        Self::AppNotResponding,
    ];

    fn builtin_pattern(&self) -> Option<String> {
        let pattern = match self {
            Self::ChipTemp => r"MTK_BH:.*tmp:(\d+) (\d+) (\d+)".to_string(),
            Self::BattTempKernel => r"orignal batt_temp = (\d+)".to_string(),
            Self::RadioTemp => r"wmt_dev_tm_temp_query.*current_temp = 0x([0-9a-fA-F]+)".to_string(),
            Self::BattLevelAndTempMain => {
                r"BatteryLabService: current level == (\d+), temperature == (\d+)".to_string()
            }
            Self::BattLevelKernel => r"healthd: battery l=(\d+) v=\d+ t=(\d+(?:\.\d+)?)".to_string(),
            Self::CpuUsage => {
                let cell = r"\[(\d+)\]";
                let cells = vec![cell; CPU_CORES].join(r"\s*,?\s*");
                format!(r"Cpus Usage\s+{cells}")
            }
            Self::CellularSignal => r"TranSignalStrengthComponentImpl: \[LTE\] dbm: (-?\d+)".to_string(),
            Self::WifiSignal => r"====>>rssi :(-?\d+)".to_string(),
            Self::NetworkTypeChange => r"NetworkStatusMonitor: onNetworkTypeChanged (\w+) => (\w+)".to_string(),
            Self::Backlight => r"write (\d+) to /sys/class/leds/lcd-backlight/brightness".to_string(),
            Self::FrameRate => r"\[DISP\]\[fps\]: drm_invoke_fps_chg_callbacks,new_fps =(\d+)".to_string(),
            Self::Touch => {
                r"touch_report info: touch (down|up)\[res:8\] :Finger 0: x = (\d+), y = (\d+)".to_string()
            }
            Self::PerfStatisticStart => {
                r"\[.*\]\[.*\] \[K\]\[Perf\] TRAN Perf Statistic start \((\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})\)"
                    .to_string()
            }
            Self::AnrWarning => r"\[ANR Warning\]".to_string(),
            Self::AppNotResponding => r"application is not responding".to_string(),
            Self::Custom(_) => return None,
        };
        Some(pattern)
    }

    fn extract(&self, caps: &Captures<'_>) -> Option<Reading> {
        let int = |i: usize| caps.get(i)?.as_str().parse::<i64>().ok();
        let uint = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        let signed = |i: usize| caps.get(i)?.as_str().parse::<i32>().ok();
        // Kernel and main report battery temperature in tenths of a degree.
        #[expect(clippy::cast_precision_loss, reason = "tenths of a degree fit easily in f64")]
        let tenths = |i: usize| int(i).map(|v| v as f64 / 10.0);

        let reading = match self {
            Self::ChipTemp => Reading::ChipTemp {
                tmp1: int(1)?,
                tmp2: int(2)?,
                tmp3: int(3)?,
            },
            Self::BattTempKernel => Reading::BattTempKernel { celsius: tenths(1)? },
            Self::RadioTemp => Reading::RadioTemp {
                celsius: i64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?,
            },
            Self::BattLevelAndTempMain => Reading::BattLevelAndTempMain {
                level: int(1)?,
                celsius: tenths(2)?,
            },
            Self::BattLevelKernel => Reading::BattLevelKernel {
                level: int(1)?,
                celsius: caps.get(2)?.as_str().parse().ok()?,
            },
            Self::CpuUsage => {
                let mut cores = [0u32; CPU_CORES];
                for (i, core) in cores.iter_mut().enumerate() {
                    *core = uint(i + 1)?;
                }
                Reading::CpuUsage { cores }
            }
            Self::CellularSignal => Reading::CellularSignal { dbm: signed(1)? },
            Self::WifiSignal => Reading::WifiSignal { dbm: signed(1)? },
            Self::NetworkTypeChange => Reading::NetworkTypeChange {
                from: caps.get(1)?.as_str().to_string(),
                to: caps.get(2)?.as_str().to_string(),
            },
            Self::Backlight => Reading::Backlight { level: uint(1)? },
            Self::FrameRate => Reading::FrameRate { fps: uint(1)? },
            Self::Touch => Reading::Touch {
                down: caps.get(1)?.as_str() == "down",
                x: uint(2)?,
                y: uint(3)?,
            },
            Self::PerfStatisticStart => Reading::PerfStatisticStart {
                month: uint(1)?,
                day: uint(2)?,
                hour: uint(3)?,
                minute: uint(4)?,
                second: uint(5)?,
            },
            Self::AnrWarning => Reading::Marker(MarkerKind::AnrWarning),
            Self::AppNotResponding => Reading::Marker(MarkerKind::AppNotResponding),
            Self::Custom(name) => Reading::Custom {
                name: name.clone(),
                value: int(1)?,
            },
        };
        Some(reading)
    }
}

/// A compiled recognizer.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    regex: Regex,
}

impl Rule {
    fn builtin(kind: RuleKind) -> Self {
        let pattern = kind.builtin_pattern().unwrap_or_default();
        // Built-in patterns are constants covered by tests.
        let regex = Regex::new(&pattern).unwrap();
        Self { kind, regex }
    }

    /// Compiles a template where `XXX` stands for a signed integer and
    /// everything else is matched literally.
    pub fn from_template(name: &str, template: &str) -> Result<Self, CascadeError> {
        if !template.contains(TEMPLATE_PLACEHOLDER) {
            return Err(CascadeError::MissingPlaceholder {
                name: name.to_string(),
                template: template.to_string(),
            });
        }
        let pattern = regex::escape(template).replacen(TEMPLATE_PLACEHOLDER, r"(-?\d+)", 1);
        let regex = Regex::new(&pattern).map_err(|err| CascadeError::InvalidPattern {
            name: name.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            kind: RuleKind::Custom(name.to_string()),
            regex,
        })
    }

    pub const fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Applies the rule. A shape match whose fields do not parse counts as
    /// no match.
    pub fn apply(&self, line: &str) -> Option<Reading> {
        let caps = self.regex.captures(line)?;
        self.kind.extract(&caps)
    }
}

/// Ordered rule list; the first rule producing a reading wins.
#[derive(Debug, Clone)]
pub struct PatternCascade {
    rules: Vec<Rule>,
}

impl Default for PatternCascade {
    fn default() -> Self {
        Self::standard()
    }
}

impl PatternCascade {
    /// All built-in rules in their canonical order.
    pub fn standard() -> Self {
        Self {
            rules: RuleKind::BUILTIN.into_iter().map(Rule::builtin).collect(),
        }
    }

    /// A cascade containing only the given rules.
    pub const fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Appends a rule after all existing ones.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluates rules top to bottom and returns the first reading.
    pub fn match_line(&self, line: &str) -> Option<Reading> {
        self.rules.iter().find_map(|rule| rule.apply(line))
    }
}
