use anyhow::{Context, Result};
use std::path::Path;

/// The version-control operations the commit hook needs.
pub trait VersionControl {
    /// Whether there is a working tree to commit into.
    fn is_inside_repo(&self) -> bool;
    /// Whether anything is modified, staged, deleted or untracked.
    fn has_pending_changes(&self) -> Result<bool>;
    /// Stage every change, including deletions and untracked files.
    fn stage_all(&self) -> Result<()>;
    /// Commit the index. Commit-time hooks are never run.
    fn commit(&self, message: &str) -> Result<String>;
    /// Short display name for notifications (the working tree's directory name).
    fn name(&self) -> Option<String>;
}

/// libgit2-backed working tree, discovered upward from a directory.
pub struct Git {
    repo: Option<git2::Repository>,
}

impl Git {
    /// Discover the repository enclosing `cwd`. Not being inside one is not
    /// an error; [`VersionControl::is_inside_repo`] just reports `false`.
    pub fn discover(cwd: &Path) -> Self {
        let repo = git2::Repository::discover(cwd)
            .ok()
            .filter(|r| r.workdir().is_some());
        Self { repo }
    }

    fn repo(&self) -> Result<&git2::Repository> {
        self.repo.as_ref().context("not inside a git working tree")
    }
}

impl VersionControl for Git {
    fn is_inside_repo(&self) -> bool {
        self.repo.is_some()
    }

    fn has_pending_changes(&self) -> Result<bool> {
        let repo = self.repo()?;
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = repo
            .statuses(Some(&mut opts))
            .context("checking git status")?;
        Ok(!statuses.is_empty())
    }

    fn stage_all(&self) -> Result<()> {
        let repo = self.repo()?;
        let mut index = repo.index().context("opening index")?;
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .context("staging changes")?;
        // add_all doesn't drop entries for files removed from the worktree.
        index
            .update_all(["*"].iter(), None)
            .context("staging deletions")?;
        index.write().context("writing index")
    }

    fn commit(&self, message: &str) -> Result<String> {
        let repo = self.repo()?;
        let mut index = repo.index().context("opening index")?;
        let tree_oid = index.write_tree().context("writing tree")?;
        let tree = repo.find_tree(tree_oid).context("finding tree")?;
        let sig = repo
            .signature()
            .context("reading git signature (user.name / user.email)")?;
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .context("creating commit")?;
        Ok(oid.to_string())
    }

    fn name(&self) -> Option<String> {
        self.repo
            .as_ref()?
            .workdir()?
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }
}
