use anyhow::Context;

use crate::objects::ObjectStore;

/// git cat-file command
pub fn invoke(repo_dir: &std::path::Path, hash: &str, type_only: bool, size_only: bool) -> anyhow::Result<()> {
    let store = ObjectStore::open(repo_dir)
        .with_context(|| format!("opening object store in '{}'", repo_dir.display()))?;
    let (kind, payload) = store
        .read(hash)
        .with_context(|| format!("reading object '{hash}'"))?;

    if type_only {
        println!("{kind}");
        return Ok(());
    }

    if size_only {
        println!("{}", payload.len());
        return Ok(());
    }

    use std::io::Write;
    std::io::stdout()
        .write_all(&payload)
        .context("writing object content to stdout")?;

    Ok(())
}
