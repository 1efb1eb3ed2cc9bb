//! Kernel log timezone normalization boundary.
//!
//! Raw kernel logs carry boot-relative time. An external converter rewrites
//! `<raw>` into `<raw>.localtime` using the common wall-clock grammar; the
//! core only cares whether that sibling exists afterwards.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Suffix the converter appends to the raw path.
pub const LOCALTIME_SUFFIX: &str = ".localtime";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to launch normalizer {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("normalizer exited with {status} for {path}")]
    ExitStatus { path: PathBuf, status: String },
    #[error("normalizer did not produce {0}")]
    MissingOutput(PathBuf),
}

/// Returns `<raw>.localtime`.
pub fn localtime_sibling(raw: &Path) -> PathBuf {
    let mut name = OsString::from(raw.as_os_str());
    name.push(LOCALTIME_SUFFIX);
    PathBuf::from(name)
}

/// Converts a raw kernel log into its normalized sibling.
///
/// Implementations own their path resolution; callers only see
/// `raw path -> normalized path` or a failure.
pub trait Normalizer {
    fn normalize(&self, raw: &Path) -> Result<PathBuf, NormalizeError>;
}

/// Runs an external converter as `<program> <raw>`.
///
/// Success requires a zero exit code *and* the `.localtime` sibling to exist.
#[derive(Debug, Clone)]
pub struct ExternalNormalizer {
    program: PathBuf,
}

impl ExternalNormalizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Normalizer for ExternalNormalizer {
    fn normalize(&self, raw: &Path) -> Result<PathBuf, NormalizeError> {
        tracing::debug!(program = %self.program.display(), path = %raw.display(), "running normalizer");

        let status = Command::new(&self.program)
            .arg(raw)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|source| NormalizeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !status.success() {
            return Err(NormalizeError::ExitStatus {
                path: raw.to_path_buf(),
                status: status.to_string(),
            });
        }

        let output = localtime_sibling(raw);
        if !output.is_file() {
            return Err(NormalizeError::MissingOutput(output));
        }
        Ok(output)
    }
}
