use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{GitError, Result};
use crate::hash::{self, HASH_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "commit" => Ok(ObjectKind::Commit),
            "tree" => Ok(ObjectKind::Tree),
            "blob" => Ok(ObjectKind::Blob),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(GitError::UnknownObjectType(
                other.as_bytes().first().copied().unwrap_or(0),
            )),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content-addressed store rooted at `<repo_root>/objects`.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Open (and, if needed, create) the store at `<repo_root>/objects`.
    pub fn open(repo_root: impl AsRef<Path>) -> Result<Self> {
        let objects_dir = repo_root.as_ref().join("objects");
        fs::create_dir_all(&objects_dir)?;
        Ok(Self { objects_dir })
    }

    fn path_for(&self, address: &str) -> PathBuf {
        self.objects_dir.join(&address[..2]).join(&address[2..])
    }

    /// Write `payload` tagged with `kind`, returning its 40-hex address.
    /// Idempotent: a pre-existing object at the computed address is left
    /// untouched and its address is returned without rewriting.
    pub fn write(&self, kind: ObjectKind, payload: &[u8]) -> Result<String> {
        let header = format!("{} {}\0", kind.as_str(), payload.len());
        let mut store_bytes = Vec::with_capacity(header.len() + payload.len());
        store_bytes.extend_from_slice(header.as_bytes());
        store_bytes.extend_from_slice(payload);

        let digest = hash::sha1(&store_bytes);
        let address = hash::hex_of(&digest);
        let path = self.path_for(&address);

        if path.exists() {
            return Ok(address);
        }

        let dir = path.parent().expect("object path always has a parent");
        fs::create_dir_all(dir)?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&store_bytes)
            .map_err(|e| GitError::Zlib(e.to_string()))?;
        let compressed = encoder.finish().map_err(|e| GitError::Zlib(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&compressed)?;
        tmp.persist(&path)
            .map_err(|e| GitError::StoreIo(e.to_string()))?;

        Ok(address)
    }

    /// Read the object stored at `address`, returning its kind and payload.
    pub fn read(&self, address: &str) -> Result<(ObjectKind, Vec<u8>)> {
        let path = self.path_for(address);
        let compressed = fs::read(&path)
            .map_err(|_| GitError::NotFound(address.to_string()))?;

        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut inflated = Vec::new();
        decoder
            .read_to_end(&mut inflated)
            .map_err(|e| GitError::Corrupt(address.to_string(), e.to_string()))?;

        let space = inflated
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| GitError::Corrupt(address.to_string(), "missing header space".into()))?;
        let nul = inflated
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GitError::Corrupt(address.to_string(), "missing header nul".into()))?;
        if nul <= space {
            return Err(GitError::Corrupt(address.to_string(), "header nul before space".into()));
        }

        let kind_str = std::str::from_utf8(&inflated[..space])
            .map_err(|e| GitError::Corrupt(address.to_string(), e.to_string()))?;
        let kind = ObjectKind::from_str(kind_str)
            .map_err(|_| GitError::Corrupt(address.to_string(), format!("unknown type {kind_str}")))?;

        let size_str = std::str::from_utf8(&inflated[space + 1..nul])
            .map_err(|e| GitError::Corrupt(address.to_string(), e.to_string()))?;
        let size: usize = size_str
            .parse()
            .map_err(|_| GitError::Corrupt(address.to_string(), format!("bad size {size_str}")))?;

        let payload = &inflated[nul + 1..];
        if payload.len() != size {
            return Err(GitError::Corrupt(
                address.to_string(),
                format!("declared size {size} but payload is {} bytes", payload.len()),
            ));
        }

        Ok((kind, payload.to_vec()))
    }

    /// Whether an object exists on disk already (used by the pack streamer
    /// to resolve ref-delta bases not produced earlier in the same pack).
    pub fn contains(&self, address: &str) -> bool {
        self.path_for(address).exists()
    }
}

pub const ADDRESS_LEN: usize = HASH_LEN * 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();

        let address = store.write(ObjectKind::Blob, b"hello\n").unwrap();
        assert_eq!(address, "ce013625030ba8dba906f756967f9e9ca394464a");

        let (kind, payload) = store.read(&address).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"hello\n");
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();

        let a = store.write(ObjectKind::Blob, b"same content").unwrap();
        let b = store.write(ObjectKind::Blob, b"same content").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn read_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();
        let err = store.read(&"0".repeat(40)).unwrap_err();
        assert!(matches!(err, GitError::NotFound(_)));
    }

    #[test]
    fn read_rejects_header_with_nul_before_space() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();

        let address = store.write(ObjectKind::Blob, b"placeholder").unwrap();
        let path = dir.path().join("objects").join(&address[..2]).join(&address[2..]);

        // nul appears before the first space, which would reverse the
        // `space+1..nul` slice if unguarded.
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"\0type 1\0x").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let err = store.read(&address).unwrap_err();
        assert!(matches!(err, GitError::Corrupt(_, _)));
    }
}
