//! Result of running one test case

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Stage of a test case that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// The definition could not be loaded
    Load,
    Prepare,
    Test,
    Cleanup,
    Comparison,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Load => "load",
            Phase::Prepare => "prepare",
            Phase::Test => "test",
            Phase::Cleanup => "cleanup",
            Phase::Comparison => "comparison",
        };
        f.write_str(name)
    }
}

/// Outcome of one test case in one run
///
/// `diagnostic` is present iff the case failed or was skipped, and
/// `phase_failed` iff it failed.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub name: String,
    pub passed: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_failed: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Body returned by the test call, if it got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl Outcome {
    pub fn pass(name: impl Into<String>, response: String, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            skipped: false,
            phase_failed: None,
            diagnostic: None,
            response: Some(response),
            duration,
        }
    }

    pub fn fail(
        name: impl Into<String>,
        phase: Phase,
        diagnostic: impl Into<String>,
        response: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            skipped: false,
            phase_failed: Some(phase),
            diagnostic: Some(diagnostic.into()),
            response,
            duration,
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            skipped: true,
            phase_failed: None,
            diagnostic: Some(reason.into()),
            response: None,
            duration: Duration::ZERO,
        }
    }

    /// Neither passed nor skipped
    pub fn is_failure(&self) -> bool {
        !self.passed && !self.skipped
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
