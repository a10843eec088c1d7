use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Line counts for a file, or the rollup of every file below a directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub lines: u64,
    pub code: u64,
    pub comments: u64,
    pub blanks: u64,
}

impl Summary {
    pub fn new(code: u64, comments: u64, blanks: u64) -> Self {
        Self {
            lines: code + comments + blanks,
            code,
            comments,
            blanks,
        }
    }

    pub fn add(&mut self, other: &Summary) {
        self.lines += other.lines;
        self.code += other.code;
        self.comments += other.comments;
        self.blanks += other.blanks;
    }

    /// `lines == code + comments + blanks`
    pub fn is_consistent(&self) -> bool {
        self.lines == self.code + self.comments + self.blanks
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub path: String, // repo-relative, "" or project name for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>, // files only
    pub stats: Summary,
    // the service emits `null` for files and leaf directories
    #[serde(default)]
    pub children: Option<BTreeMap<String, TreeNode>>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    pub fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.children.iter().flat_map(|m| m.values())
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, |m| m.len())
    }

    /// Language of a file node, ignoring blank labels.
    pub fn language_label(&self) -> Option<&str> {
        if self.kind != NodeKind::File {
            return None;
        }
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Per-language rollup derived from a tree (or supplied by the service).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub language: String,
    pub files: u64,
    pub lines: u64,
    pub code: u64,
    pub comments: u64,
    pub blanks: u64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub source: String,
    pub repo: String,
    pub branch: String,
    pub timestamp: i64,
    pub data: TreeNode,
    // full-depth stats computed by the service; may be absent
    #[serde(default)]
    pub languages: Option<Vec<LanguageStat>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl AnalyzeRequest {
    /// Blank branches are dropped so the service picks the default branch.
    pub fn new(repo_url: impl Into<String>, branch: Option<&str>) -> Self {
        Self {
            repo_url: repo_url.into(),
            branch: branch
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
        }
    }
}

/// Service-side analysis configuration, editable from the settings surface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub cache_ttl_seconds: u64,
    pub default_depth: u32,
    pub request_timeout_seconds: u64,
    pub max_repo_size_mb: u64,
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    #[serde(default)]
    pub include_data_files: bool,
    #[serde(default)]
    pub include_documentation: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: Theme,
    pub auto_analyze: bool,
    pub panel_position: Position,
    pub fab_position: Position,
    pub panel_expanded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_width: Option<f64>,
    pub server_url: String,
}

/// Partial update merged over the stored settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_analyze: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fab_position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_expanded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

#[cfg(test)]
impl TreeNode {
    pub fn file(path: &str, language: Option<&str>, stats: Summary) -> Self {
        Self {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            kind: NodeKind::File,
            path: path.to_string(),
            language: language.map(str::to_string),
            stats,
            children: None,
        }
    }

    /// Directory whose stats are the sum of `children`.
    pub fn dir(path: &str, children: Vec<TreeNode>) -> Self {
        let mut stats = Summary::default();
        let mut map = BTreeMap::new();
        for c in children {
            stats.add(&c.stats);
            map.insert(c.name.clone(), c);
        }
        Self {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            kind: NodeKind::Dir,
            path: path.to_string(),
            language: None,
            stats,
            children: if map.is_empty() { None } else { Some(map) },
        }
    }
}
