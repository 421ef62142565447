use serde::{Deserialize, Serialize};
use std::fmt;

/// A third-party action referenced by a workflow step's `uses:` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRef {
    pub owner: String,
    pub repo: String,
    /// The git ref after `@`: a tag, a branch, or a commit hash.
    pub version: String,
    /// Subdirectory within the repository, for `owner/repo/path@ref`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ActionRef {
    /// Parses a `uses:` value such as `actions/checkout@v4`.
    ///
    /// Returns `None` for local actions (`./...`), container references
    /// (`docker://...`) and anything not shaped `owner/repo[/path]@ref`.
    pub fn parse(uses: &str) -> Option<Self> {
        let uses = uses.trim();
        if uses.starts_with("./") || uses.starts_with("docker://") {
            return None;
        }

        let (target, version) = match uses.split('@').collect::<Vec<_>>().as_slice() {
            [target, version] => (*target, *version),
            _ => return None,
        };

        let components: Vec<&str> = target.split('/').collect();
        if components.len() < 2 {
            return None;
        }

        let path = if components.len() > 2 {
            Some(components[2..].join("/"))
        } else {
            None
        };

        Some(Self {
            owner: components[0].to_string(),
            repo: components[1].to_string(),
            version: version.to_string(),
            path,
        })
    }

    /// `owner/repo`, the form used for ignore patterns and fixture lookup.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        write!(f, "@{}", self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let action = ActionRef::parse("actions/checkout@v2").unwrap();
        assert_eq!(action.owner, "actions");
        assert_eq!(action.repo, "checkout");
        assert_eq!(action.version, "v2");
        assert_eq!(action.path, None);
        assert_eq!(action.to_string(), "actions/checkout@v2");
    }

    #[test]
    fn test_parse_with_subpath() {
        let action = ActionRef::parse("github/codeql-action/init/sub@v3").unwrap();
        assert_eq!(action.slug(), "github/codeql-action");
        assert_eq!(action.path.as_deref(), Some("init/sub"));
        assert_eq!(action.to_string(), "github/codeql-action/init/sub@v3");
    }

    #[test]
    fn test_parse_rejects_local_and_docker() {
        assert_eq!(ActionRef::parse("./.github/actions/build"), None);
        assert_eq!(ActionRef::parse("docker://alpine:3.8"), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ActionRef::parse("actions/checkout"), None);
        assert_eq!(ActionRef::parse("checkout@v2"), None);
        assert_eq!(ActionRef::parse("actions/checkout@v2@v3"), None);
    }
}
