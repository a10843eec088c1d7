use anyhow::{Context, Result};
use regex::Regex;

/// Second path segments that are account/site sections, not repositories.
/// Auto-analyze skips them; an explicit request does not.
const RESERVED_SECTIONS: [&str; 7] = [
    "settings", "pulls", "issues", "actions", "wiki", "security", "insights",
];

const HOST: &str = "https://github.com";

const REPO_PATH: &str = r"^/([^/]+)/([^/]+)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
}

impl RepoTarget {
    pub fn repo_url(&self) -> String {
        format!("{HOST}/{}/{}", self.owner, self.repo)
    }

    pub fn is_reserved(&self) -> bool {
        RESERVED_SECTIONS.contains(&self.repo.as_str())
    }
}

/// What the content context can read from the host page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageContext {
    /// URL pathname, e.g. `/owner/repo/tree/main` (no query or fragment).
    pub path: String,
    /// Text of the branch selector, if the element was present.
    pub branch_label: Option<String>,
}

/// `https://host/a/b?q#f` -> `/a/b`; bare paths keep only their pathname.
fn pathname(location: &str) -> String {
    let location = location.trim();
    let rest = match location.find("://") {
        Some(idx) => {
            let after = &location[idx + 3..];
            after.find('/').map_or("", |slash| &after[slash..])
        }
        None => location,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let path = &rest[..end];
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

impl PageContext {
    /// Accepts either a bare path or a full page URL.
    pub fn new(location: &str, branch_label: Option<String>) -> Self {
        Self {
            path: pathname(location),
            branch_label,
        }
    }

    /// Session key for per-page UI flags.
    pub fn key(&self) -> &str {
        &self.path
    }

    /// Owner/repo matched from the path; `None` outside a repository-shaped path.
    pub fn repo_target(&self) -> Result<Option<RepoTarget>> {
        let re = Regex::new(REPO_PATH).with_context(|| format!("Bad repo path regex '{REPO_PATH}'"))?;
        let Some(caps) = re.captures(&self.path) else {
            return Ok(None);
        };
        Ok(Some(RepoTarget {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
        }))
    }

    /// Best-effort branch; blank means "let the service choose".
    pub fn branch(&self) -> Option<&str> {
        self.branch_label
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_owner_and_repo() {
        let page = PageContext::new("/rust-lang/cargo/tree/master/src", None);
        let target = page.repo_target().unwrap().unwrap();
        assert_eq!(target.owner, "rust-lang");
        assert_eq!(target.repo, "cargo");
        assert_eq!(target.repo_url(), "https://github.com/rust-lang/cargo");
    }

    #[test]
    fn full_urls_are_reduced_to_pathnames() {
        let page = PageContext::new("https://github.com/tokio-rs/tokio?tab=readme#top", None);
        assert_eq!(page.path, "/tokio-rs/tokio");
        assert_eq!(page.repo_target().unwrap().unwrap().repo, "tokio");

        assert_eq!(PageContext::new("/o/r?tab=readme", None).key(), "/o/r");
        assert_eq!(PageContext::new("/o/r#readme", None).key(), "/o/r");
        assert_eq!(PageContext::new("https://github.com", None).path, "/");
    }

    #[test]
    fn rejects_paths_without_owner_and_repo() {
        assert!(PageContext::new("/", None).repo_target().unwrap().is_none());
        assert!(PageContext::new("/only-owner", None).repo_target().unwrap().is_none());
        assert!(PageContext::new("/only-owner/", None).repo_target().unwrap().is_none());
    }

    #[test]
    fn reserved_sections_are_flagged_not_dropped() {
        let settings = PageContext::new("/owner/settings", None).repo_target().unwrap().unwrap();
        assert!(settings.is_reserved());
        let pulls = PageContext::new("/owner/pulls/12", None).repo_target().unwrap().unwrap();
        assert!(pulls.is_reserved());
        let repo = PageContext::new("/owner/repo/pulls", None).repo_target().unwrap().unwrap();
        assert!(!repo.is_reserved());
    }

    #[test]
    fn branch_label_is_best_effort() {
        let page = PageContext::new("/o/r", Some("  develop \n".into()));
        assert_eq!(page.branch(), Some("develop"));
        assert_eq!(PageContext::new("/o/r", Some("   ".into())).branch(), None);
        assert_eq!(PageContext::new("/o/r", None).branch(), None);
    }
}
