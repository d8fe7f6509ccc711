use thiserror::Error;

/// Core error kinds for the clone pipeline (ref discovery, pack decode, object
/// store, checkout). CLI-facing code wraps these in `anyhow::Context` chains;
/// library code always returns one of these variants.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zlib error: {0}")]
    Zlib(String),

    #[error("malformed ref advertisement: {0}")]
    BadAdvertisement(String),

    #[error("no tip reference found in advertisement")]
    NoTip,

    #[error("no PACK signature found in upload-pack response")]
    NoPack,

    #[error("malformed pack header: {0}")]
    BadPackHeader(String),

    #[error("unsupported pack version {0}, expected 2")]
    UnsupportedPackVersion(u32),

    #[error("pack truncated: expected {expected} bytes, consumed {consumed}")]
    PackTruncated { expected: usize, consumed: usize },

    #[error("pack trailer mismatch at offset {0}")]
    PackTrailerMismatch(usize),

    #[error("malformed varint: {0}")]
    BadVarint(String),

    #[error("unknown pack object type {0}")]
    UnknownObjectType(u8),

    #[error("delta base missing: {0}")]
    DeltaBaseMissing(String),

    #[error("delta base size mismatch: expected {expected}, base is {actual}")]
    DeltaBaseSizeMismatch { expected: usize, actual: usize },

    #[error("invalid delta instruction: opcode 0")]
    InvalidDeltaOp,

    #[error("delta result size mismatch: expected {expected}, produced {actual}")]
    DeltaSizeMismatch { expected: usize, actual: usize },

    #[error("delta copy out of bounds: offset {offset} size {size} base_len {base_len}")]
    DeltaCopyOutOfBounds {
        offset: usize,
        size: usize,
        base_len: usize,
    },

    #[error("malformed commit object: {0}")]
    BadCommit(String),

    #[error("malformed tree entry: {0}")]
    BadTreeEntry(String),

    #[error("object store error: {0}")]
    StoreIo(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("corrupt object {0}: {1}")]
    Corrupt(String, String),

    #[error("invalid hex string: {0}")]
    BadHex(String),

    #[error("pkt-line frame truncated")]
    Truncated,

    #[error("malformed pkt-line length prefix")]
    BadFrame,
}

pub type Result<T> = std::result::Result<T, GitError>;
