//! Test case definitions and the store that resolves them
//!
//! A test case is loaded once, validated, and read-only afterwards. Cases
//! that fail validation are kept as [`CaseEntry::Invalid`] so that one
//! malformed definition only fails itself, not the whole run.

mod definition;
mod store;

use std::path::{Path, PathBuf};

use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use crate::common::{Error, Result};
use crate::http::{Headers, Variables};

pub use definition::{CaseDefinition, JsonSource};
pub use store::CaseStore;

/// Priority given to cases that do not set one
pub const DEFAULT_PRIORITY: i32 = 100;

/// One unit of conformance verification
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    /// Unique name within a run; the correlation key for reporting
    pub name: String,
    pub description: Option<String>,
    /// Setup query, never blank when present
    pub prepare: Option<String>,
    /// Query under test, never blank
    pub input: String,
    /// Variables shared by the prepare, input and cleanup calls
    pub variables: Option<Variables>,
    pub http_headers: Headers,
    /// Teardown query, never blank when present
    pub cleanup: Option<String>,
    pub expected_output: Value,
    /// Skip this case and report it as skipped
    pub ignore: bool,
    pub priority: i32,
    /// The case touches service-side state no other case touches
    pub isolated: bool,
    /// File or directory the case was loaded from
    pub source: PathBuf,
}

impl TestCase {
    pub fn prepare(&self) -> Option<&str> {
        self.prepare.as_deref()
    }

    pub fn cleanup(&self) -> Option<&str> {
        self.cleanup.as_deref()
    }
}

/// A resolved case definition
#[derive(Debug)]
pub enum CaseEntry {
    /// A valid case, ready to run
    Ready(TestCase),
    /// A definition that could not be loaded
    Invalid {
        name: String,
        source: PathBuf,
        error: Error,
    },
}

impl CaseEntry {
    pub fn name(&self) -> &str {
        match self {
            CaseEntry::Ready(case) => &case.name,
            CaseEntry::Invalid { name, .. } => name,
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            CaseEntry::Ready(case) => &case.source,
            CaseEntry::Invalid { source, .. } => source,
        }
    }

    fn priority(&self) -> i32 {
        match self {
            CaseEntry::Ready(case) => case.priority,
            CaseEntry::Invalid { .. } => DEFAULT_PRIORITY,
        }
    }
}

/// Unvalidated fields of a case, as read from either definition format
#[derive(Debug, Default)]
pub(crate) struct RawCase {
    pub name: String,
    pub description: Option<String>,
    pub prepare: Option<String>,
    pub input: Option<String>,
    pub variables: Option<JsonSource>,
    pub http_headers: Headers,
    pub cleanup: Option<String>,
    pub expected_output: Option<JsonSource>,
    pub ignore: bool,
    pub priority: Option<i32>,
    pub isolated: bool,
    pub source: PathBuf,
}

impl RawCase {
    /// Check required fields and parse embedded JSON
    pub fn validate(self) -> Result<TestCase> {
        let name = self.name;

        if name.trim().is_empty() {
            return Err(Error::load(&name, "name must not be empty"));
        }

        let input = non_blank(self.input)
            .ok_or_else(|| Error::load(&name, "missing required field 'input'"))?;

        let expected_output = self
            .expected_output
            .ok_or_else(|| Error::load(&name, "missing required field 'expectedOutput'"))?
            .into_value()
            .map_err(|e| Error::load(&name, format!("invalid JSON in expectedOutput: {}", e)))?;

        let variables = match self.variables {
            None => None,
            Some(source) => {
                let value = source
                    .into_value()
                    .map_err(|e| Error::load(&name, format!("invalid JSON in variables: {}", e)))?;
                match value {
                    Value::Object(map) => Some(map),
                    Value::Null => None,
                    other => {
                        return Err(Error::load(
                            &name,
                            format!("variables must be a JSON object, got {}", other),
                        ))
                    }
                }
            }
        };

        for (header, value) in &self.http_headers {
            HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| Error::load(&name, format!("invalid HTTP header name '{}'", header)))?;
            HeaderValue::from_str(value).map_err(|_| {
                Error::load(&name, format!("invalid value for HTTP header '{}'", header))
            })?;
        }

        Ok(TestCase {
            name,
            description: non_blank(self.description),
            prepare: non_blank(self.prepare),
            input,
            variables,
            http_headers: self.http_headers,
            cleanup: non_blank(self.cleanup),
            expected_output,
            ignore: self.ignore,
            priority: self.priority.unwrap_or(DEFAULT_PRIORITY),
            isolated: self.isolated,
            source: self.source,
        })
    }

    /// Validate into an entry, keeping failures as invalid entries
    pub fn into_entry(self) -> CaseEntry {
        let name = self.name.clone();
        let source = self.source.clone();
        match self.validate() {
            Ok(case) => CaseEntry::Ready(case),
            Err(error) => CaseEntry::Invalid {
                name,
                source,
                error,
            },
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
