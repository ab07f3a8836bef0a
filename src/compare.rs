//! Structural JSON comparison of expected and actual response bodies
//!
//! Objects are compared field by field and arrays element by element. The
//! [`CompareMode`] decides whether the actual body may carry fields the
//! expected body does not mention, and whether array order matters. Every
//! difference is reported with the dotted path of the field that differs
//! (`data.hero.realName`, `data.heroes[2]`).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Strictness of a comparison
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    /// Extra fields in the actual body are ignored; array order matters
    #[default]
    Lenient,
    /// No extra fields allowed; array order matters
    Strict,
    /// Extra fields are ignored; arrays may be in any order
    LenientUnordered,
    /// No extra fields allowed; arrays may be in any order
    StrictUnordered,
}

impl CompareMode {
    /// Whether the actual body may contain fields absent from the expected body
    pub fn is_extensible(self) -> bool {
        matches!(self, CompareMode::Lenient | CompareMode::LenientUnordered)
    }

    /// Whether array elements must appear in the same order
    pub fn is_ordered(self) -> bool {
        matches!(self, CompareMode::Lenient | CompareMode::Strict)
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareMode::Lenient => write!(f, "lenient"),
            CompareMode::Strict => write!(f, "strict"),
            CompareMode::LenientUnordered => write!(f, "lenient-unordered"),
            CompareMode::StrictUnordered => write!(f, "strict-unordered"),
        }
    }
}

/// What differs at a path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchKind {
    /// Same type, different value
    Value { expected: Value, actual: Value },
    /// Different JSON types
    Type { expected: Value, actual: Value },
    /// Field present in the expected body but absent from the actual body
    Missing { expected: Value },
    /// Field present in the actual body but not allowed by the mode
    Unexpected { actual: Value },
    /// Arrays of different length
    Length { expected: usize, actual: usize },
    /// Expected array element with no equivalent element in the actual array
    Unmatched { expected: Value },
    /// The actual body could not be parsed
    InvalidJson { message: String },
}

/// A single difference between expected and actual
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// Dotted path to the differing field; empty for the document root
    pub path: String,
    #[serde(flatten)]
    pub kind: MismatchKind,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "$" } else { &self.path };
        match &self.kind {
            MismatchKind::Value { expected, actual } => {
                write!(f, "{}: expected {}, got {}", path, expected, actual)
            }
            MismatchKind::Type { expected, actual } => write!(
                f,
                "{}: expected {} {}, got {} {}",
                path,
                type_name(expected),
                expected,
                type_name(actual),
                actual
            ),
            MismatchKind::Missing { expected } => {
                write!(f, "{}: expected field is missing (expected {})", path, expected)
            }
            MismatchKind::Unexpected { actual } => {
                write!(f, "{}: unexpected field (got {})", path, actual)
            }
            MismatchKind::Length { expected, actual } => write!(
                f,
                "{}: expected {} array elements, got {}",
                path, expected, actual
            ),
            MismatchKind::Unmatched { expected } => write!(
                f,
                "{}: no element of the actual array matches {}",
                path, expected
            ),
            MismatchKind::InvalidJson { message } => {
                write!(f, "{}: response is not valid JSON ({})", path, message)
            }
        }
    }
}

/// All differences found by one comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchReport {
    pub mismatches: Vec<Mismatch>,
}

impl MismatchReport {
    /// Paths of all differing fields, in discovery order
    pub fn paths(&self) -> Vec<&str> {
        self.mismatches.iter().map(|m| m.path.as_str()).collect()
    }
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mismatch) in self.mismatches.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", mismatch)?;
        }
        Ok(())
    }
}

impl std::error::Error for MismatchReport {}

/// Judges equivalence of response bodies under a fixed mode
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator {
    mode: CompareMode,
}

impl Comparator {
    pub fn new(mode: CompareMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    /// Compare an expected JSON value with raw actual response text
    pub fn equivalent(&self, expected: &Value, actual: &str) -> Result<(), MismatchReport> {
        let actual: Value = serde_json::from_str(actual).map_err(|e| MismatchReport {
            mismatches: vec![Mismatch {
                path: String::new(),
                kind: MismatchKind::InvalidJson {
                    message: e.to_string(),
                },
            }],
        })?;
        self.equivalent_values(expected, &actual)
    }

    /// Compare two already parsed JSON values
    pub fn equivalent_values(&self, expected: &Value, actual: &Value) -> Result<(), MismatchReport> {
        let mut mismatches = Vec::new();
        compare_value(expected, actual, "", self.mode, &mut mismatches);
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(MismatchReport { mismatches })
        }
    }

    fn matches(&self, expected: &Value, actual: &Value) -> bool {
        let mut mismatches = Vec::new();
        compare_value(expected, actual, "", self.mode, &mut mismatches);
        mismatches.is_empty()
    }
}

fn compare_value(
    expected: &Value,
    actual: &Value,
    path: &str,
    mode: CompareMode,
    out: &mut Vec<Mismatch>,
) {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => compare_objects(e, a, path, mode, out),
        (Value::Array(e), Value::Array(a)) => compare_arrays(e, a, path, mode, out),
        (Value::Number(e), Value::Number(a)) => {
            if !numbers_equal(e, a) {
                out.push(value_mismatch(path, expected, actual));
            }
        }
        (e, a) if type_name(e) != type_name(a) => out.push(Mismatch {
            path: path.to_string(),
            kind: MismatchKind::Type {
                expected: e.clone(),
                actual: a.clone(),
            },
        }),
        (e, a) => {
            if e != a {
                out.push(value_mismatch(path, e, a));
            }
        }
    }
}

fn compare_objects(
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
    path: &str,
    mode: CompareMode,
    out: &mut Vec<Mismatch>,
) {
    for (key, expected_value) in expected {
        let child = field_path(path, key);
        match actual.get(key) {
            Some(actual_value) => compare_value(expected_value, actual_value, &child, mode, out),
            None => out.push(Mismatch {
                path: child,
                kind: MismatchKind::Missing {
                    expected: expected_value.clone(),
                },
            }),
        }
    }

    if !mode.is_extensible() {
        for (key, actual_value) in actual {
            if !expected.contains_key(key) {
                out.push(Mismatch {
                    path: field_path(path, key),
                    kind: MismatchKind::Unexpected {
                        actual: actual_value.clone(),
                    },
                });
            }
        }
    }
}

fn compare_arrays(
    expected: &[Value],
    actual: &[Value],
    path: &str,
    mode: CompareMode,
    out: &mut Vec<Mismatch>,
) {
    if expected.len() != actual.len() {
        out.push(Mismatch {
            path: path.to_string(),
            kind: MismatchKind::Length {
                expected: expected.len(),
                actual: actual.len(),
            },
        });
        return;
    }

    if mode.is_ordered() {
        for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
            compare_value(e, a, &index_path(path, i), mode, out);
        }
        return;
    }

    // Unordered: maximum bipartite matching between expected and actual elements,
    // so that a loose expected element cannot steal the only candidate of a stricter one.
    let comparator = Comparator::new(mode);
    let candidates: Vec<Vec<usize>> = expected
        .iter()
        .map(|e| {
            actual
                .iter()
                .enumerate()
                .filter(|(_, a)| comparator.matches(e, a))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; actual.len()];
    for i in 0..expected.len() {
        let mut visited = vec![false; actual.len()];
        assign(i, &candidates, &mut owner, &mut visited);
    }

    let mut matched = vec![false; expected.len()];
    for i in owner.iter().flatten() {
        matched[*i] = true;
    }
    for (i, e) in expected.iter().enumerate() {
        if !matched[i] {
            out.push(Mismatch {
                path: index_path(path, i),
                kind: MismatchKind::Unmatched { expected: e.clone() },
            });
        }
    }
}

/// Augmenting-path step of the matching: try to give expected element `i` an actual element
fn assign(
    i: usize,
    candidates: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &j in &candidates[i] {
        if visited[j] {
            continue;
        }
        visited[j] = true;
        let free = match owner[j] {
            None => true,
            Some(other) => assign(other, candidates, owner, visited),
        };
        if free {
            owner[j] = Some(i);
            return true;
        }
    }
    false
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn value_mismatch(path: &str, expected: &Value, actual: &Value) -> Mismatch {
    Mismatch {
        path: path.to_string(),
        kind: MismatchKind::Value {
            expected: expected.clone(),
            actual: actual.clone(),
        },
    }
}

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
