// Materializes a tree into a working directory from the object store,
// starting at a commit address.

use std::fs;
use std::path::Path;

use crate::error::{GitError, Result};
use crate::hash;
use crate::objects::{ObjectKind, ObjectStore};

const SUBTREE_MODE_PREFIX: u8 = b'4';

/// Check out the tree reachable from commit `tip` into `target_dir`.
pub fn checkout(store: &ObjectStore, tip: &str, target_dir: &Path) -> Result<()> {
    let (kind, commit_payload) = store.read(tip)?;
    if kind != ObjectKind::Commit {
        return Err(GitError::BadCommit(format!("{tip} is not a commit")));
    }

    let tree_addr = first_tree_line(&commit_payload)?;
    tracing::info!(%tip, tree = %tree_addr, "checking out tree");

    fs::create_dir_all(target_dir)?;
    checkout_tree(store, &tree_addr, target_dir)
}

/// Parse `"tree <40-hex>\n"` off the first line of a commit payload.
fn first_tree_line(commit_payload: &[u8]) -> Result<String> {
    let first_line_end = commit_payload
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| GitError::BadCommit("commit has no newline".into()))?;
    let first_line = std::str::from_utf8(&commit_payload[..first_line_end])
        .map_err(|e| GitError::BadCommit(e.to_string()))?;

    let tree_addr = first_line
        .strip_prefix("tree ")
        .ok_or_else(|| GitError::BadCommit(format!("expected 'tree' line, got {first_line:?}")))?;

    if tree_addr.len() != hash::HASH_LEN * 2 {
        return Err(GitError::BadCommit(format!("malformed tree address {tree_addr:?}")));
    }

    Ok(tree_addr.to_string())
}

fn checkout_tree(store: &ObjectStore, tree_addr: &str, dir: &Path) -> Result<()> {
    let (kind, payload) = store.read(tree_addr)?;
    if kind != ObjectKind::Tree {
        return Err(GitError::BadTreeEntry(format!("{tree_addr} is not a tree")));
    }

    for entry in parse_tree_entries(&payload)? {
        let full_path = dir.join(&entry.name);
        if entry.mode.first() == Some(&SUBTREE_MODE_PREFIX) {
            fs::create_dir_all(&full_path)?;
            checkout_tree(store, &entry.address, &full_path)?;
        } else {
            let (blob_kind, blob_payload) = store.read(&entry.address)?;
            if blob_kind != ObjectKind::Blob {
                return Err(GitError::BadTreeEntry(format!(
                    "{} is not a blob (mode {:?})",
                    entry.address,
                    String::from_utf8_lossy(&entry.mode)
                )));
            }
            fs::write(&full_path, &blob_payload)?;
        }
    }

    Ok(())
}

struct TreeEntry {
    mode: Vec<u8>,
    name: String,
    address: String,
}

/// Parse `<mode> <name>\0<20 raw sha>` entries out of a tree payload.
fn parse_tree_entries(payload: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut cursor = 0usize;

    while cursor < payload.len() {
        let space = payload[cursor..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| GitError::BadTreeEntry("missing mode separator".into()))?;
        let mode = payload[cursor..cursor + space].to_vec();
        cursor += space + 1;

        let nul = payload[cursor..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GitError::BadTreeEntry("missing name terminator".into()))?;
        let name = String::from_utf8_lossy(&payload[cursor..cursor + nul]).into_owned();
        cursor += nul + 1;

        if cursor + hash::HASH_LEN > payload.len() {
            return Err(GitError::BadTreeEntry("truncated entry sha".into()));
        }
        let raw_addr = &payload[cursor..cursor + hash::HASH_LEN];
        let address = hex::encode(raw_addr);
        cursor += hash::HASH_LEN;

        entries.push(TreeEntry { mode, name, address });
    }

    Ok(entries)
}
