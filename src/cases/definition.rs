//! YAML test case definitions
//!
//! A YAML file holds either one case or a list of cases:
//!
//! ```yaml
//! - name: findHero
//!   input: '{ hero(name: "Iron Man") { realName } }'
//!   expected_output:
//!     data:
//!       hero:
//!         realName: Tony Stark
//! ```
//!
//! `variables` and `expected_output` accept either inline YAML or a string of
//! JSON text. A YAML string is always read as JSON text, so a bare string
//! value must be quoted as JSON (`expected_output: '"Tony Stark"'`). Field names of the directory layout (`httpHeaders`,
//! `expectedOutput`) are accepted as aliases.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::{CaseEntry, RawCase};
use crate::common::Error;

/// JSON given either as text or inline
///
/// Any YAML string scalar is `Text` and must hold valid JSON.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum JsonSource {
    Text(String),
    Inline(Value),
}

impl JsonSource {
    pub fn into_value(self) -> serde_json::Result<Value> {
        match self {
            JsonSource::Text(text) => serde_json::from_str(&text),
            JsonSource::Inline(value) => Ok(value),
        }
    }
}

/// A single test case as written in a YAML file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct CaseDefinition {
    /// Unique name of the case
    pub name: String,
    /// What the case verifies
    pub description: Option<String>,
    /// Query run before the test call
    pub prepare: Option<String>,
    /// Query under test
    pub input: Option<String>,
    /// Variables for all calls of this case
    pub variables: Option<JsonSource>,
    /// Headers for all calls of this case
    #[serde(default, alias = "httpHeaders")]
    pub http_headers: BTreeMap<String, String>,
    /// Query run after the test call
    pub cleanup: Option<String>,
    /// Expected response body
    #[serde(alias = "expectedOutput", alias = "output")]
    pub expected_output: Option<JsonSource>,
    /// Skip this case
    #[serde(default)]
    pub ignore: bool,
    /// Ordering key, lower runs first
    pub priority: Option<i32>,
    /// Safe to run concurrently with other isolated cases
    #[serde(default)]
    pub isolated: bool,
}

impl CaseDefinition {
    pub(crate) fn into_raw(self, source: &Path) -> RawCase {
        RawCase {
            name: self.name,
            description: self.description,
            prepare: self.prepare,
            input: self.input,
            variables: self.variables,
            http_headers: self.http_headers,
            cleanup: self.cleanup,
            expected_output: self.expected_output,
            ignore: self.ignore,
            priority: self.priority,
            isolated: self.isolated,
            source: source.to_path_buf(),
        }
    }
}

/// Parse the cases of one YAML file
///
/// Each list item is decoded on its own so that a malformed item only
/// invalidates itself.
pub(crate) fn parse_yaml(content: &str, source: &Path) -> Vec<CaseEntry> {
    let document: serde_yaml::Value = match serde_yaml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            return vec![CaseEntry::Invalid {
                name: file_stem(source),
                source: source.to_path_buf(),
                error: Error::load(&file_stem(source), format!("invalid YAML: {}", e)),
            }]
        }
    };

    let items = match document {
        serde_yaml::Value::Sequence(items) => items,
        serde_yaml::Value::Null => Vec::new(),
        single => vec![single],
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let fallback = format!("{}#{}", file_stem(source), index);
            let name = item
                .get("name")
                .and_then(|n| n.as_str())
                .map(str::to_string)
                .unwrap_or(fallback);

            match serde_yaml::from_value::<CaseDefinition>(item) {
                Ok(definition) => definition.into_raw(source).into_entry(),
                Err(e) => CaseEntry::Invalid {
                    error: Error::load(&name, e.to_string()),
                    name,
                    source: source.to_path_buf(),
                },
            }
        })
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
