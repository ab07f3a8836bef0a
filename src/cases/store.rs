//! Resolution of test case definitions from disk
//!
//! Two layouts are recognised under a root directory:
//!
//! - A directory containing `input.graphql` is one case. Next to it live
//!   `output.json` (required), and optionally `prepare.graphql`,
//!   `cleanup.graphql`, `variables.json`, `httpHeader.properties` and
//!   `test.properties` (`name`, `description`, `ignore`, `priority`,
//!   `isolated`). The case name is the directory path relative to the root.
//! - A `*.yaml`/`*.yml` file holds one case or a list of cases.
//!
//! Cases come back ordered by `(priority, name)` so repeated runs are
//! reproducible.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::definition::{self, JsonSource};
use super::{CaseEntry, RawCase};
use crate::common::{Error, Result};

const INPUT_FILE: &str = "input.graphql";
const OUTPUT_FILE: &str = "output.json";
const PREPARE_FILE: &str = "prepare.graphql";
const CLEANUP_FILE: &str = "cleanup.graphql";
const VARIABLES_FILE: &str = "variables.json";
const HEADERS_FILE: &str = "httpHeader.properties";
const PROPERTIES_FILE: &str = "test.properties";

/// Resolves test cases from a directory tree or a single YAML file
#[derive(Debug, Clone)]
pub struct CaseStore {
    root: PathBuf,
}

impl CaseStore {
    /// Open a case source; fails if the path does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref();
        if !root.exists() {
            return Err(Error::SourceNotFound(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every case definition, ordered by priority then name
    ///
    /// Fails only if the source itself cannot be read; malformed
    /// definitions are returned as [`CaseEntry::Invalid`].
    pub fn load(&self) -> Result<Vec<CaseEntry>> {
        let mut entries = Vec::new();

        if self.root.is_file() {
            let content = read_file(&self.root)?;
            entries.extend(definition::parse_yaml(&content, &self.root));
        } else {
            self.scan_dir(&self.root, &mut entries)?;
        }

        entries.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.name().cmp(b.name()))
        });

        let entries = reject_duplicates(entries);

        tracing::debug!(
            root = %self.root.display(),
            count = entries.len(),
            "Resolved test cases"
        );

        Ok(entries)
    }

    fn scan_dir(&self, dir: &Path, entries: &mut Vec<CaseEntry>) -> Result<()> {
        let mut children: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| Error::FileRead {
                path: dir.display().to_string(),
                error: e.to_string(),
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| !is_hidden(path))
            .collect();
        children.sort();

        if dir.join(INPUT_FILE).is_file() || dir.join(OUTPUT_FILE).is_file() {
            entries.push(self.load_case_dir(dir));
        }

        for child in children {
            if child.is_dir() {
                self.scan_dir(&child, entries)?;
            } else if is_yaml(&child) {
                match read_file(&child) {
                    Ok(content) => entries.extend(definition::parse_yaml(&content, &child)),
                    Err(error) => {
                        let name = self.relative_name(&child);
                        entries.push(CaseEntry::Invalid {
                            error: Error::load(&name, error.to_string()),
                            name,
                            source: child,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Read a directory-layout case
    fn load_case_dir(&self, dir: &Path) -> CaseEntry {
        let name = self.relative_name(dir);
        match self.read_case_dir(dir, name.clone()) {
            Ok(raw) => raw.into_entry(),
            Err(reason) => CaseEntry::Invalid {
                error: Error::load(&name, reason),
                name,
                source: dir.to_path_buf(),
            },
        }
    }

    fn read_case_dir(&self, dir: &Path, name: String) -> std::result::Result<RawCase, String> {
        let properties = read_properties(&dir.join(PROPERTIES_FILE))?;
        let flag = |key: &str| {
            properties
                .get(key)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        let priority = match properties.get("priority") {
            Some(p) => Some(
                p.trim()
                    .parse()
                    .map_err(|_| format!("invalid priority '{}' in {}", p, PROPERTIES_FILE))?,
            ),
            None => None,
        };

        let name = properties
            .get("name")
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(name);

        Ok(RawCase {
            name,
            description: properties.get("description").cloned(),
            prepare: read_optional(&dir.join(PREPARE_FILE))?,
            input: read_optional(&dir.join(INPUT_FILE))?,
            variables: read_optional(&dir.join(VARIABLES_FILE))?.map(JsonSource::Text),
            http_headers: read_properties(&dir.join(HEADERS_FILE))?
                .into_iter()
                .collect(),
            cleanup: read_optional(&dir.join(CLEANUP_FILE))?,
            expected_output: read_optional(&dir.join(OUTPUT_FILE))?.map(JsonSource::Text),
            ignore: flag("ignore"),
            priority,
            isolated: flag("isolated"),
            source: dir.to_path_buf(),
        })
    }

    /// Case name for a path: relative to the root, `/`-separated, without extension
    fn relative_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let relative = if relative.as_os_str().is_empty() {
            Path::new(self.root.file_name().unwrap_or(self.root.as_os_str()))
        } else {
            relative
        };
        let relative = if path.is_file() {
            relative.with_extension("")
        } else {
            relative.to_path_buf()
        };
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn reject_duplicates(entries: Vec<CaseEntry>) -> Vec<CaseEntry> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    entries
        .into_iter()
        .map(|entry| match entry {
            CaseEntry::Ready(case) => {
                if let Some(first) = seen.get(&case.name) {
                    let reason = format!(
                        "duplicate test case name, first defined in {}",
                        first.display()
                    );
                    CaseEntry::Invalid {
                        error: Error::load(&case.name, reason),
                        name: case.name,
                        source: case.source,
                    }
                } else {
                    seen.insert(case.name.clone(), case.source.clone());
                    CaseEntry::Ready(case)
                }
            }
            invalid => invalid,
        })
        .collect()
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

fn read_optional(path: &Path) -> std::result::Result<Option<String>, String> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))
}

fn read_properties(path: &Path) -> std::result::Result<HashMap<String, String>, String> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let file = File::open(path).map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
    java_properties::read(BufReader::new(file))
        .map_err(|e| format!("invalid properties file {}: {}", path.display(), e))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn case_dir(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        write(&dir, INPUT_FILE, "{ heroes { name } }\n");
        write(&dir, OUTPUT_FILE, r#"{"data":{"heroes":[]}}"#);
        dir
    }

    #[test]
    fn test_missing_source() {
        let tmp = TempDir::new().unwrap();
        let result = CaseStore::open(tmp.path().join("nope"));
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }

    #[test]
    fn test_directory_layout() {
        let tmp = TempDir::new().unwrap();
        let dir = case_dir(tmp.path(), "heroes/createTeam");
        write(&dir, PREPARE_FILE, "mutation { createTeam(name: \"Avengers\") { name } }");
        write(&dir, CLEANUP_FILE, "mutation { removeTeam(name: \"Avengers\") { name } }");
        write(&dir, VARIABLES_FILE, r#"{"team": "Avengers"}"#);
        write(&dir, HEADERS_FILE, "Authorization=Bearer secret\nX-Trace: 42\n");
        write(
            &dir,
            PROPERTIES_FILE,
            "# team tests\ndescription=Creates a team\nisolated=true\npriority=5\n",
        );

        let entries = CaseStore::open(tmp.path()).unwrap().load().unwrap();
        assert_eq!(entries.len(), 1);
        let case = match &entries[0] {
            CaseEntry::Ready(case) => case,
            CaseEntry::Invalid { error, .. } => panic!("unexpected invalid entry: {}", error),
        };
        assert_eq!(case.name, "heroes/createTeam");
        assert_eq!(case.description.as_deref(), Some("Creates a team"));
        assert!(case.prepare().unwrap().contains("createTeam"));
        assert!(case.cleanup().unwrap().contains("removeTeam"));
        assert_eq!(case.variables.as_ref().unwrap()["team"], json!("Avengers"));
        assert_eq!(case.http_headers["Authorization"], "Bearer secret");
        assert_eq!(case.http_headers["X-Trace"], "42");
        assert!(case.isolated);
        assert_eq!(case.priority, 5);
    }

    #[test]
    fn test_order_by_priority_then_name() {
        let tmp = TempDir::new().unwrap();
        case_dir(tmp.path(), "b");
        case_dir(tmp.path(), "a");
        let late = case_dir(tmp.path(), "0-late");
        write(&late, PROPERTIES_FILE, "priority=200\n");
        write(
            tmp.path(),
            "early.yaml",
            "name: early\npriority: 1\ninput: '{ heroes { name } }'\nexpected_output: {}\n",
        );

        let entries = CaseStore::open(tmp.path()).unwrap().load().unwrap();
        let names: Vec<_> = entries.iter().map(CaseEntry::name).collect();
        assert_eq!(names, ["early", "a", "b", "0-late"]);
    }

    #[test]
    fn test_missing_output_is_invalid_entry() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("orphan"), INPUT_FILE, "{ heroes { name } }");
        case_dir(tmp.path(), "fine");

        let entries = CaseStore::open(tmp.path()).unwrap().load().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], CaseEntry::Ready(_)));
        match &entries[1] {
            CaseEntry::Invalid { name, error, .. } => {
                assert_eq!(name, "orphan");
                assert!(error.to_string().contains("expectedOutput"));
            }
            CaseEntry::Ready(_) => panic!("case without output should not load"),
        }
    }

    #[test]
    fn test_invalid_priority() {
        let tmp = TempDir::new().unwrap();
        let dir = case_dir(tmp.path(), "weird");
        write(&dir, PROPERTIES_FILE, "priority=soon\n");

        let entries = CaseStore::open(tmp.path()).unwrap().load().unwrap();
        match &entries[0] {
            CaseEntry::Invalid { error, .. } => assert!(error.to_string().contains("priority")),
            CaseEntry::Ready(_) => panic!("invalid priority should not load"),
        }
    }

    #[test]
    fn test_duplicate_names() {
        let tmp = TempDir::new().unwrap();
        case_dir(tmp.path(), "allHeroes");
        write(
            tmp.path(),
            "more.yaml",
            "name: allHeroes\ninput: '{ heroes { name } }'\nexpected_output: {}\n",
        );

        let entries = CaseStore::open(tmp.path()).unwrap().load().unwrap();
        assert_eq!(entries.len(), 2);
        let invalid = entries
            .iter()
            .filter(|e| matches!(e, CaseEntry::Invalid { .. }))
            .count();
        assert_eq!(invalid, 1);
    }

    #[test]
    fn test_hidden_directories_skipped() {
        let tmp = TempDir::new().unwrap();
        case_dir(tmp.path(), ".git/hooks");
        case_dir(tmp.path(), "visible");

        let entries = CaseStore::open(tmp.path()).unwrap().load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "visible");
    }

    #[test]
    fn test_single_yaml_file() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "suite.yml",
            "- name: one\n  input: '{ a }'\n  expected_output: {}\n- name: two\n  input: '{ b }'\n  expected_output: {}\n",
        );
        case_dir(tmp.path(), "ignored");

        let store = CaseStore::open(tmp.path().join("suite.yml")).unwrap();
        let entries = store.load().unwrap();
        let names: Vec<_> = entries.iter().map(CaseEntry::name).collect();
        assert_eq!(names, ["one", "two"]);
    }
}
