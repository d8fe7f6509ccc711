// pkt-line framing for the smart-HTTP protocol.

use bytes::{Buf, Bytes};

use crate::error::{GitError, Result};

pub const FLUSH: &[u8] = b"0000";

/// One decoded pkt-line frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    Flush,
    Data(Bytes),
}

/// Encode `line` as `<4-hex-len>line`, where the length includes the prefix.
pub fn encode(line: &[u8]) -> Vec<u8> {
    let total_len = line.len() + 4;
    let mut out = format!("{total_len:04x}").into_bytes();
    out.extend_from_slice(line);
    out
}

/// The 4-byte flush packet `"0000"`.
pub fn flush() -> Vec<u8> {
    FLUSH.to_vec()
}

/// Decode one pkt-line frame from the front of `data`, returning the frame
/// and the number of bytes consumed.
pub fn decode(data: &[u8]) -> Result<(usize, PktLine)> {
    if data.len() < 4 {
        return Err(GitError::Truncated);
    }

    let len_str = std::str::from_utf8(&data[..4]).map_err(|_| GitError::BadFrame)?;
    let len = usize::from_str_radix(len_str, 16).map_err(|_| GitError::BadFrame)?;

    if len == 0 {
        return Ok((4, PktLine::Flush));
    }
    if len < 4 {
        return Err(GitError::BadFrame);
    }
    if data.len() < len {
        return Err(GitError::Truncated);
    }

    let payload = Bytes::copy_from_slice(&data[4..len]);
    Ok((len, PktLine::Data(payload)))
}

/// Decode every pkt-line frame in `data`, stopping at the end of the buffer.
pub fn decode_all(mut data: &[u8]) -> Result<Vec<PktLine>> {
    let mut lines = Vec::new();
    while !data.is_empty() {
        let (consumed, line) = decode(data)?;
        lines.push(line);
        data.advance(consumed);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_want_line_matches_literal_scenario() {
        let tip = "a".repeat(40);
        let line = format!("want {tip} multi_ack\n");
        let frame = encode(line.as_bytes());
        assert_eq!(frame.len(), 0x32);
        assert_eq!(&frame[..4], b"0032");
        assert_eq!(&frame[4..], line.as_bytes());
    }

    #[test]
    fn decode_round_trips_encode() {
        let payload = b"hello world\n";
        let frame = encode(payload);
        let (consumed, line) = decode(&frame).unwrap();
        assert_eq!(consumed, frame.len());
        assert_eq!(line, PktLine::Data(Bytes::copy_from_slice(payload)));
    }

    #[test]
    fn decode_flush_packet() {
        let (consumed, line) = decode(FLUSH).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(line, PktLine::Flush);
    }

    #[test]
    fn decode_rejects_truncated_frame() {
        let frame = encode(b"longer than remaining bytes");
        let short = &frame[..frame.len() - 1];
        assert!(matches!(decode(short), Err(GitError::Truncated)));
    }

    #[test]
    fn decode_rejects_bad_hex_prefix() {
        assert!(matches!(decode(b"zzzzpayload"), Err(GitError::BadFrame)));
    }

    #[test]
    fn decode_all_handles_multiple_frames_and_flush() {
        let mut buf = Vec::new();
        buf.extend(encode(b"# service=git-upload-pack\n"));
        buf.extend(flush());
        buf.extend(encode(b"data\n"));

        let lines = decode_all(&buf).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], PktLine::Flush);
    }
}
