//! Subsystem kinds and resolved log files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The log family a file belongs to, inferred from its filename shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemKind {
    Kernel,
    Main,
    Sys,
    Radio,
    Events,
}

impl SubsystemKind {
    /// All kinds, in classification order.
    pub const ALL: [Self; 5] = [
        Self::Main,
        Self::Sys,
        Self::Events,
        Self::Radio,
        Self::Kernel,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kernel => "kernel",
            Self::Main => "main",
            Self::Sys => "sys",
            Self::Radio => "radio",
            Self::Events => "events",
        }
    }

    /// Filename prefix used by files of this kind (e.g. `kernel_log_`).
    #[must_use]
    pub const fn file_prefix(&self) -> &'static str {
        match self {
            Self::Kernel => "kernel_log_",
            Self::Main => "main_log_",
            Self::Sys => "sys_log_",
            Self::Radio => "radio_log_",
            Self::Events => "events_log_",
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubsystemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kernel" => Ok(Self::Kernel),
            "main" => Ok(Self::Main),
            "sys" => Ok(Self::Sys),
            "radio" => Ok(Self::Radio),
            "events" => Ok(Self::Events),
            _ => Err(format!("invalid subsystem kind: {s}")),
        }
    }
}

/// A resolved input file, as produced by discovery.
///
/// For kernel logs `path` points at the normalized `.localtime` file whenever
/// one was found or produced; the raw file is never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFile {
    pub path: PathBuf,
    pub kind: SubsystemKind,
    pub normalized: bool,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>, kind: SubsystemKind, normalized: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            normalized,
        }
    }

    /// Reads the whole file, replacing invalid UTF-8 sequences.
    pub fn read_lossy(&self) -> std::io::Result<String> {
        read_lossy(&self.path)
    }
}

/// Reads a file and decodes it as UTF-8, substituting invalid sequences.
pub fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(path = %path.display(), "input is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in SubsystemKind::ALL {
            let parsed: SubsystemKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_kind_serde_matches_as_str() {
        for kind in SubsystemKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_kind_invalid() {
        let result: Result<SubsystemKind, _> = "crash".parse();
        assert_eq!(result.unwrap_err(), "invalid subsystem kind: crash");
    }

    #[test]
    fn test_read_lossy_replaces_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main_log_1");
        std::fs::write(&path, b"01-01 00:00:01.000000 ok \xff\xfe end\n").unwrap();

        let text = read_lossy(&path).unwrap();
        assert!(text.starts_with("01-01 00:00:01.000000 ok "));
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with(" end\n"));
    }
}
