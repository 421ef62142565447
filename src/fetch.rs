//! Retrieval of action repositories.
//!
//! [`GitFetcher`] shells out to `git`. The ref after `@` in a `uses:` value
//! may be a tag, a branch or a full commit hash, so each is tried in turn
//! until one succeeds.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::FetchError;
use crate::model::ActionRef;

const GITHUB_URL: &str = "https://github.com";

/// Source of action repository contents.
#[async_trait]
pub trait ActionFetcher: Send + Sync {
    /// Places the repository of `action` at its referenced version into
    /// `dest`, which must exist and be empty.
    async fn fetch(&self, action: &ActionRef, dest: &Path) -> Result<(), FetchError>;
}

/// Fetches actions from GitHub with the `git` command line.
///
/// When a fixtures directory is configured and it contains
/// `<owner>/<repo>`, that directory is copied instead and the network is
/// never touched.
#[derive(Debug, Clone, Default)]
pub struct GitFetcher {
    fixtures_dir: Option<PathBuf>,
}

impl GitFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = Some(dir.into());
        self
    }

    fn fixture_for(&self, action: &ActionRef) -> Option<PathBuf> {
        let dir = self
            .fixtures_dir
            .as_ref()?
            .join(&action.owner)
            .join(&action.repo);
        dir.is_dir().then_some(dir)
    }
}

#[async_trait]
impl ActionFetcher for GitFetcher {
    async fn fetch(&self, action: &ActionRef, dest: &Path) -> Result<(), FetchError> {
        if let Some(fixture) = self.fixture_for(action) {
            debug!(action = %action, fixture = %fixture.display(), "using local fixture");
            return copy_fixture(fixture, dest.to_path_buf()).await;
        }

        let url = format!("{}/{}/{}.git", GITHUB_URL, action.owner, action.repo);
        let version = action.version.as_str();

        let refs = [
            format!("refs/tags/{}", version),
            format!("refs/heads/{}", version),
        ];
        for refspec in &refs {
            reset_dir(dest).await?;
            if shallow_fetch(&url, refspec, dest).await? {
                debug!(action = %action, refspec = %refspec, "fetched");
                return Ok(());
            }
        }

        if is_commit_hash(version) {
            reset_dir(dest).await?;
            return clone_at_commit(&url, version, dest).await;
        }

        Err(FetchError::RefNotFound {
            action: action.slug(),
            version: action.version.clone(),
        })
    }
}

/// Fetches a single ref at depth 1 into a fresh repository at `dest`.
///
/// Returns `Ok(false)` when git reports the ref does not exist.
async fn shallow_fetch(url: &str, refspec: &str, dest: &Path) -> Result<bool, FetchError> {
    let steps: [&[&str]; 3] = [
        &["init", "--quiet"],
        &["fetch", "--quiet", "--depth", "1", url, refspec],
        &["checkout", "--quiet", "--detach", "FETCH_HEAD"],
    ];

    for args in steps {
        let output = git(args, dest).await?;
        if !output.status.success() {
            debug!(
                refspec,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git {} failed",
                args[0]
            );
            return Ok(false);
        }
    }
    Ok(true)
}

/// Commits cannot be fetched by hash from every server, so the whole history
/// is cloned and the commit checked out.
async fn clone_at_commit(url: &str, hash: &str, dest: &Path) -> Result<(), FetchError> {
    let output = git(&["clone", "--quiet", url, "."], dest).await?;
    if !output.status.success() {
        return Err(FetchError::Checkout {
            hash: hash.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let output = git(&["checkout", "--quiet", "--detach", hash], dest).await?;
    if !output.status.success() {
        return Err(FetchError::Checkout {
            hash: hash.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

async fn git(args: &[&str], cwd: &Path) -> Result<Output, FetchError> {
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(FetchError::Spawn)
}

/// Empties `dest` so a failed attempt leaves nothing behind.
async fn reset_dir(dest: &Path) -> Result<(), FetchError> {
    let io_err = |source| FetchError::Io {
        path: dest.to_path_buf(),
        source,
    };

    if tokio::fs::try_exists(dest).await.map_err(io_err)? {
        tokio::fs::remove_dir_all(dest).await.map_err(io_err)?;
    }
    tokio::fs::create_dir_all(dest).await.map_err(io_err)
}

fn is_commit_hash(version: &str) -> bool {
    version.len() == 40 && version.chars().all(|c| c.is_ascii_hexdigit())
}

async fn copy_fixture(src: PathBuf, dest: PathBuf) -> Result<(), FetchError> {
    let fixture = src.clone();
    tokio::task::spawn_blocking(move || copy_dir(&src, &dest))
        .await
        .map_err(|e| FetchError::Fixture {
            path: fixture,
            reason: e.to_string(),
        })?
}

fn copy_dir(src: &Path, dest: &Path) -> Result<(), FetchError> {
    let fixture_err = |reason: String| FetchError::Fixture {
        path: src.to_path_buf(),
        reason,
    };

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| fixture_err(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| fixture_err(e.to_string()))?;
        let target = dest.join(relative);

        let result = if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
        } else {
            std::fs::copy(entry.path(), &target).map(|_| ())
        };
        result.map_err(|source| FetchError::Io {
            path: target,
            source,
        })?;
    }
    Ok(())
}
