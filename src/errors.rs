use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ArgName;

/// The role an input image plays in a segmentation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Image,
    Mask,
    SaliencyMap,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("input image"),
            Self::Mask => f.write_str("mask"),
            Self::SaliencyMap => f.write_str("object saliency map"),
        }
    }
}

/// Spatial extent of an image. Two images are compatible only if their
/// domains are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Domain {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Structured error types for a segmentation job.
///
/// Every variant names the option or input role it concerns, so the single
/// diagnostic printed by the binary is enough to locate the problem.
#[derive(Error, Debug)]
pub enum OdisfError {
    #[error("Missing input: {what} ({option})")]
    MissingInput { option: ArgName, what: &'static str },

    #[error("Invalid value for {option}: {reason}")]
    InvalidValue { option: ArgName, reason: String },

    #[error("Unsupported format: cannot write a grayscale label image to {path:?}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Domain mismatch: {role} is {actual} but the input image is {expected}")]
    DomainMismatch {
        role: InputRole,
        expected: Domain,
        actual: Domain,
    },

    #[error("Unsupported option for {option}: {value:?} (expected one of {expected})")]
    UnsupportedOption {
        option: ArgName,
        value: String,
        expected: &'static str,
    },

    #[error("Algorithm failure: {reason}")]
    AlgorithmFailure { reason: String },

    #[error("Image I/O error: {operation} failed (file: {path:?})")]
    ImageIo {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl OdisfError {
    pub(crate) fn algorithm(reason: impl Into<String>) -> Self {
        Self::AlgorithmFailure {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OdisfError>;

/// The step of the job at which a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStep {
    ResolveInputs,
    Configure,
    Execute,
    Persist,
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolveInputs => f.write_str("resolving inputs"),
            Self::Configure => f.write_str("configuring the segmentation"),
            Self::Execute => f.write_str("running the segmentation"),
            Self::Persist => f.write_str("writing the label image"),
        }
    }
}

/// A terminal job failure: what went wrong and at which step.
#[derive(Error, Debug)]
#[error("Error while {step}: {source}")]
pub struct JobFailure {
    pub step: JobStep,
    #[source]
    pub source: OdisfError,
}

impl JobFailure {
    pub fn new(step: JobStep, source: OdisfError) -> Self {
        Self { step, source }
    }
}
