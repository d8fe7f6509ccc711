// Thin-pack ref-deltas use a two-pass deferred-queue scheme: unresolved
// ref-deltas are parked in a queue and retried after the main pass instead
// of failing outright.

use std::collections::HashMap;
use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{GitError, Result};
use crate::hash;
use crate::objects::{ObjectKind, ObjectStore};
use crate::pack::delta;
use crate::pack::header::{self, RawObjectType, PACK_HEADER_LEN, PACK_TRAILER_LEN};

/// One object the streamer wrote to the store.
#[derive(Debug, Clone)]
pub struct DecodedObject {
    pub address: String,
    pub kind: ObjectKind,
}

struct PendingRefDelta {
    base_addr: String,
    delta: Vec<u8>,
}

/// Inflate a zlib stream starting at `data[0..]`, returning the decompressed
/// bytes and the number of input bytes the stream consumed.
fn inflate(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| GitError::Zlib(e.to_string()))?;
    let consumed = decoder.total_in() as usize;
    Ok((out, consumed))
}

fn raw_type_to_kind(raw: RawObjectType) -> Option<ObjectKind> {
    match raw {
        RawObjectType::Commit => Some(ObjectKind::Commit),
        RawObjectType::Tree => Some(ObjectKind::Tree),
        RawObjectType::Blob => Some(ObjectKind::Blob),
        RawObjectType::Tag => Some(ObjectKind::Tag),
        RawObjectType::OfsDelta | RawObjectType::RefDelta => None,
    }
}

/// Decode every entry in `pack` (a buffer starting at the 12-byte header and
/// ending with the 20-byte trailer), writing resolved objects into `store`.
pub fn decode(pack: &[u8], store: &ObjectStore) -> Result<Vec<DecodedObject>> {
    let header = header::read_header(pack)?;
    tracing::info!(version = header.version, count = header.object_count, "decoding pack");

    let mut cursor = PACK_HEADER_LEN;
    let entry_region_end = pack.len().saturating_sub(PACK_TRAILER_LEN);

    let mut offset_index: HashMap<usize, (ObjectKind, Vec<u8>)> = HashMap::new();
    let mut address_index: HashMap<String, (ObjectKind, Vec<u8>)> = HashMap::new();
    let mut deferred: Vec<PendingRefDelta> = Vec::new();
    let mut decoded: Vec<DecodedObject> = Vec::new();

    for _ in 0..header.object_count {
        let obj_start = cursor;
        let (raw_type, size, varint_len) = header::read_type_and_size(&pack[cursor..])?;
        cursor += varint_len;

        match raw_type {
            RawObjectType::Commit | RawObjectType::Tree | RawObjectType::Blob | RawObjectType::Tag => {
                let kind = raw_type_to_kind(raw_type).expect("non-delta type always maps to a kind");
                let (payload, consumed) = inflate(&pack[cursor..])?;
                cursor += consumed;

                if payload.len() != size {
                    tracing::warn!(declared = size, actual = payload.len(), "inflated size mismatch");
                }

                let address = store.write(kind, &payload)?;
                offset_index.insert(obj_start, (kind, payload.clone()));
                address_index.insert(address.clone(), (kind, payload));
                decoded.push(DecodedObject { address, kind });
            }

            RawObjectType::RefDelta => {
                let base_addr = hex::encode(&pack[cursor..cursor + hash::HASH_LEN]);
                cursor += hash::HASH_LEN;
                let (delta_bytes, consumed) = inflate(&pack[cursor..])?;
                cursor += consumed;

                match resolve_base(&base_addr, &address_index, store)? {
                    Some((base_kind, base_payload)) => {
                        let payload = delta::apply(&base_payload, &delta_bytes)?;
                        let address = store.write(base_kind, &payload)?;
                        offset_index.insert(obj_start, (base_kind, payload.clone()));
                        address_index.insert(address.clone(), (base_kind, payload));
                        decoded.push(DecodedObject { address, kind: base_kind });
                    }
                    None => {
                        tracing::debug!(base = %base_addr, "deferring thin-pack ref-delta");
                        deferred.push(PendingRefDelta {
                            base_addr,
                            delta: delta_bytes,
                        });
                    }
                }
            }

            RawObjectType::OfsDelta => {
                let (back_distance, consumed) = header::read_ofs_delta_offset(&pack[cursor..])?;
                cursor += consumed;
                let (delta_bytes, consumed) = inflate(&pack[cursor..])?;
                cursor += consumed;

                let base_pos = obj_start
                    .checked_sub(back_distance)
                    .ok_or_else(|| GitError::DeltaBaseMissing(format!("offset {obj_start}")))?;
                let (base_kind, base_payload) = offset_index
                    .get(&base_pos)
                    .ok_or_else(|| GitError::DeltaBaseMissing(format!("offset {base_pos}")))?;

                let payload = delta::apply(base_payload, &delta_bytes)?;
                let address = store.write(*base_kind, &payload)?;
                let kind = *base_kind;
                offset_index.insert(obj_start, (kind, payload.clone()));
                address_index.insert(address.clone(), (kind, payload));
                decoded.push(DecodedObject { address, kind });
            }
        }
    }

    resolve_deferred(deferred, &mut address_index, store, &mut decoded)?;

    if cursor != entry_region_end {
        let warning = GitError::PackTruncated {
            expected: entry_region_end,
            consumed: cursor,
        };
        tracing::warn!(%warning, "not fatal to already-written objects");
    } else if pack.len() >= PACK_TRAILER_LEN {
        let trailer = &pack[entry_region_end..];
        let digest = hash::sha1(&pack[..entry_region_end]);
        if digest.as_slice() != trailer {
            let warning = GitError::PackTrailerMismatch(entry_region_end);
            tracing::warn!(%warning, "not fatal to already-written objects");
        }
    }

    Ok(decoded)
}

fn resolve_base(
    base_addr: &str,
    address_index: &HashMap<String, (ObjectKind, Vec<u8>)>,
    store: &ObjectStore,
) -> Result<Option<(ObjectKind, Vec<u8>)>> {
    if let Some(entry) = address_index.get(base_addr) {
        return Ok(Some(entry.clone()));
    }
    if store.contains(base_addr) {
        let (kind, payload) = store.read(base_addr)?;
        return Ok(Some((kind, payload)));
    }
    Ok(None)
}

/// Retry deferred ref-deltas until a full pass makes no progress (thin-pack
/// bases that are resolved later in the stream).
fn resolve_deferred(
    mut pending: Vec<PendingRefDelta>,
    address_index: &mut HashMap<String, (ObjectKind, Vec<u8>)>,
    store: &ObjectStore,
    decoded: &mut Vec<DecodedObject>,
) -> Result<()> {
    while !pending.is_empty() {
        let mut still_pending = Vec::new();
        let mut made_progress = false;

        for item in pending {
            match resolve_base(&item.base_addr, address_index, store)? {
                Some((base_kind, base_payload)) => {
                    let payload = delta::apply(&base_payload, &item.delta)?;
                    let address = store.write(base_kind, &payload)?;
                    address_index.insert(address.clone(), (base_kind, payload));
                    decoded.push(DecodedObject { address, kind: base_kind });
                    made_progress = true;
                }
                None => still_pending.push(item),
            }
        }

        if !made_progress {
            let missing: Vec<String> = still_pending.iter().map(|p| p.base_addr.clone()).collect();
            return Err(GitError::DeltaBaseMissing(missing.join(", ")));
        }

        pending = still_pending;
    }

    Ok(())
}
