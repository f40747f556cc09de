//! Agent and skill description files.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml_ng::{Mapping, Value};
use tracing::debug;

use crate::codes::{E102, E103, E402, E404};
use crate::paths;

/// A leading `---` block closed by another `---` line.
static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---").expect("frontmatter regex"));

/// A top-level `key:` line, for headers that are not strict YAML.
static HEADER_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_-]+):(.*)$").expect("header key regex"));

/// Header keys every description file needs.
const REQUIRED_KEYS: [&str; 2] = ["name", "description"];

/// Findings for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub passed: bool,
    pub issues: Vec<String>,
}

impl FileReport {
    fn new(file: &Path, issues: Vec<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            passed: issues.is_empty(),
            issues,
        }
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Agent,
    Skill,
}

impl Kind {
    fn missing_code(self) -> &'static str {
        match self {
            Kind::Agent => E103,
            Kind::Skill => E402,
        }
    }
}

/// Validate an `agents/*.md` file.
pub fn validate_agent_md(path: &Path) -> FileReport {
    validate(path, Kind::Agent)
}

/// Validate a `skills/<name>/SKILL.md` file.
pub fn validate_skill_md(path: &Path) -> FileReport {
    validate(path, Kind::Skill)
}

fn validate(path: &Path, kind: Kind) -> FileReport {
    let issues = match paths::read_text(path) {
        Ok(content) => check(&content, kind),
        Err(e) => vec![e.to_string()],
    };
    FileReport::new(path, issues)
}

fn check(content: &str, kind: Kind) -> Vec<String> {
    if content.starts_with(">---") {
        return vec![format!(
            "{}: Frontmatter starts with '>---' instead of '---'",
            E102
        )];
    }

    let Some(block) = FRONTMATTER_RE.captures(content).and_then(|c| c.get(1)) else {
        return vec![format!("{}: Missing YAML frontmatter", kind.missing_code())];
    };

    let header = Header::read(block.as_str());

    let mut issues = Vec::new();
    if let Kind::Skill = kind {
        if header.nested_metadata {
            issues.push(format!("{}: Non-standard nested 'metadata:' structure", E404));
        }
    }
    for key in REQUIRED_KEYS {
        if !header.has(key) {
            issues.push(format!("Missing required field: {}", key));
        }
    }
    issues
}

/// The parts of a frontmatter header the checks look at.
#[derive(Debug, Default)]
struct Header {
    keys: Vec<String>,
    nested_metadata: bool,
}

impl Header {
    /// Parse as YAML; a header YAML rejects (an unquoted colon inside a
    /// description, say) is read line by line instead.
    fn read(block: &str) -> Self {
        if block.trim().is_empty() {
            return Self::default();
        }
        match serde_yaml_ng::from_str::<Mapping>(block) {
            Ok(mapping) => Self::from_mapping(&mapping),
            Err(e) => {
                debug!(error = %e, "Frontmatter is not strict YAML, scanning keys");
                Self::scan(block)
            }
        }
    }

    fn from_mapping(mapping: &Mapping) -> Self {
        Self {
            keys: mapping
                .keys()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            nested_metadata: matches!(mapping.get("metadata"), Some(Value::Mapping(_))),
        }
    }

    fn scan(block: &str) -> Self {
        let mut header = Self::default();
        let mut lines = block.lines().peekable();
        while let Some(line) = lines.next() {
            let Some(caps) = HEADER_KEY_RE.captures(line) else {
                continue;
            };
            let key = &caps[1];
            if key == "metadata" && caps[2].trim().is_empty() {
                header.nested_metadata = lines
                    .peek()
                    .is_some_and(|next| next.starts_with(' ') || next.starts_with('\t'));
            }
            header.keys.push(key.to_string());
        }
        header
    }

    fn has(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}
