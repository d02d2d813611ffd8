use crate::log;
use anyhow::{Context, Result, bail};
use gix::{ThreadSafeRepository, index::State};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use super::tree::TreeBuilder;

/// Initialize a repository at `root`.
///
/// When git has no committer configured, `name`/`email` are written to the
/// repository's own config.
pub fn create_repo(root: &Path, name: &str, email: &str) -> Result<ThreadSafeRepository> {
    let repo = gix::init(root)
        .with_context(|| format!("Failed to initialize git repository in {}", root.display()))?;
    if repo.committer().is_some() {
        return Ok(repo.into_sync());
    }

    let config_path = repo.path().join("config");
    let mut config = OpenOptions::new().append(true).open(&config_path)?;
    writeln!(config, "[user]\n\tname = {name}\n\temail = {email}")?;
    drop(repo);

    Ok(gix::open(root)?.into_sync())
}

/// Commit every file under the work tree to `HEAD`.
pub fn commit_all(repo: &ThreadSafeRepository, message: &str) -> Result<gix::ObjectId> {
    if message.trim().is_empty() {
        bail!("Commit message cannot be empty");
    }

    let repo_local = repo.to_thread_local();
    let root = repo_local
        .workdir()
        .context("repository has no work tree")?
        .to_path_buf();

    let mut index = State::new(repo_local.object_hash());
    let tree = TreeBuilder::new(repo).build_from_dir(&root, "", &mut index)?;
    index.sort_entries();

    let mut index_file = gix::index::File::from_state(index, repo_local.index_path());
    index_file.write(gix::index::write::Options::default())?;

    let tree_id = repo_local.write_object(&tree)?;
    let parent_ids: Vec<gix::ObjectId> = repo_local.head_id().ok().map(|id| id.detach()).into_iter().collect();
    let commit_id = repo_local.commit("HEAD", message, tree_id, parent_ids)?.detach();

    log!("git"; "commit {}", &commit_id.to_hex_with_len(7));
    Ok(commit_id)
}
