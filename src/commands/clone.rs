use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::checkout;
use crate::config::Config;
use crate::objects::ObjectStore;
use crate::pack;
use crate::refs;
use crate::transport::{self, Transport};

/// git clone command
pub fn invoke(repository_url: &str, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let target_dir = dir.unwrap_or_else(|| infer_directory(repository_url));
    clone(repository_url, &target_dir)
}

/// Creates `target_dir`, initializes an empty object store inside it, runs
/// the clone pipeline, and materializes the working tree.
pub fn clone(repository_url: &str, target_dir: &Path) -> anyhow::Result<()> {
    tracing::info!(url = repository_url, dir = %target_dir.display(), "cloning");

    std::fs::create_dir_all(target_dir)
        .with_context(|| format!("creating target directory '{}'", target_dir.display()))?;
    let store = ObjectStore::open(target_dir)
        .with_context(|| format!("initializing object store in '{}'", target_dir.display()))?;

    let config = Config::default();
    let transport = Transport::new(config).context("building HTTP transport")?;

    let advertisement = transport
        .discover_refs(repository_url)
        .context("discovering refs")?;
    let tip = refs::parse_tip(&advertisement).context("parsing ref advertisement")?;
    tracing::info!(%tip, "resolved tip");

    let response_body = transport
        .fetch_pack(repository_url, &tip)
        .context("fetching packfile")?;
    let pack_bytes = transport::find_pack_start(&response_body).context("locating PACK in response")?;

    let decoded = pack::decode(pack_bytes, &store).context("decoding packfile")?;
    tracing::info!(objects = decoded.len(), "decoded pack objects");

    checkout::checkout(&store, &tip, target_dir).context("checking out working tree")?;
    tracing::info!(dir = %target_dir.display(), "clone complete");

    Ok(())
}

/// Default directory name: the URL's last path segment with a trailing
/// `.git` stripped, mirroring ordinary `git clone` behavior.
fn infer_directory(repository_url: &str) -> PathBuf {
    let trimmed = repository_url.trim_end_matches('/');
    let mut name = trimmed
        .rsplit('/')
        .next()
        .unwrap_or(trimmed)
        .to_string();
    if let Some(stripped) = name.strip_suffix(".git") {
        name = stripped.to_string();
    }
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_directory_from_url() {
        assert_eq!(infer_directory("https://example.com/org/repo.git"), PathBuf::from("repo"));
        assert_eq!(infer_directory("https://example.com/org/repo"), PathBuf::from("repo"));
        assert_eq!(infer_directory("https://example.com/org/repo/"), PathBuf::from("repo"));
    }
}
