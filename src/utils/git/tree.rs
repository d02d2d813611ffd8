use anyhow::{Context, Result, anyhow};
use gix::{
    ThreadSafeRepository,
    bstr::BString,
    index::{
        State,
        entry::{Flags, Mode, Stat},
        fs::Metadata,
    },
    objs::{Tree, tree},
};
use std::{fs, path::Path};

/// Builds git trees (and the matching index) from the working directory.
///
/// Every file is included; only the `.git` directory is skipped.
pub struct TreeBuilder<'a> {
    repo: &'a ThreadSafeRepository,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(repo: &'a ThreadSafeRepository) -> Self {
        Self { repo }
    }

    /// Recursively write blobs and subtrees for `dir`.
    ///
    /// `prefix` is the `/`-separated path of `dir` inside the repository,
    /// empty at the root; index entries carry the full relative path.
    pub fn build_from_dir(&self, dir: &Path, prefix: &str, index: &mut State) -> Result<Tree> {
        let repo = self.repo.to_thread_local();
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let entry = entry?;
            let path = entry.path();
            let filename = file_name(&entry)?;
            if filename == ".git" {
                continue;
            }
            let rel = if prefix.is_empty() {
                filename.to_string()
            } else {
                format!("{prefix}/{filename}")
            };

            if path.is_dir() {
                let sub_tree = self.build_from_dir(&path, &rel, index)?;
                // git has no empty trees
                if sub_tree.entries.is_empty() {
                    continue;
                }
                let tree_id = repo.write_object(&sub_tree)?.detach();
                entries.push(tree_entry(tree::EntryKind::Tree, filename, tree_id));
            } else if path.is_file() {
                let blob_id: gix::ObjectId = repo.write_blob(fs::read(&path)?)?.into();
                let stat = Stat::from_fs(&Metadata::from_path_no_follow(&path)?)?;
                index.dangerously_push_entry(stat, blob_id, Flags::empty(), Mode::FILE, rel.as_str().into());
                entries.push(tree_entry(tree::EntryKind::Blob, filename, blob_id));
            }
        }

        sort_tree_entries(&mut entries);
        Ok(Tree { entries })
    }
}

fn file_name(entry: &fs::DirEntry) -> Result<BString> {
    entry
        .file_name()
        .into_string()
        .map(Into::into)
        .map_err(|name| anyhow!("Invalid UTF-8 in filename: {}", name.to_string_lossy()))
}

fn tree_entry(kind: tree::EntryKind, filename: BString, oid: gix::ObjectId) -> tree::Entry {
    tree::Entry {
        mode: kind.into(),
        oid,
        filename,
    }
}

/// Git tree order: directories compare as if they ended with `/`.
fn sort_tree_entries(entries: &mut [tree::Entry]) {
    let tree_mode: tree::EntryMode = tree::EntryKind::Tree.into();
    entries.sort_by(|a, b| {
        let sort_key = |e: &tree::Entry| {
            let mut key = e.filename.as_slice().to_vec();
            if e.mode == tree_mode {
                key.push(b'/');
            }
            key
        };
        sort_key(a).cmp(&sort_key(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gix::objs::tree::{Entry, EntryKind};

    fn entry(kind: EntryKind, name: &str) -> Entry {
        Entry {
            mode: kind.into(),
            filename: name.into(),
            oid: gix::ObjectId::null(gix::hash::Kind::Sha1),
        }
    }

    #[test]
    fn test_sort_tree_entries() {
        let mut entries = vec![
            entry(EntryKind::Blob, "css.map"),
            entry(EntryKind::Tree, "css"),
            entry(EntryKind::Blob, "css-extra"),
            entry(EntryKind::Blob, ".nojekyll"),
        ];
        // '-' (45) < '.' (46) < '/' (47)
        sort_tree_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.filename.to_string()).collect();
        assert_eq!(names, [".nojekyll", "css-extra", "css.map", "css"]);
    }
}
