use crate::error::{GitError, Result};
use crate::pktline::{self, PktLine};

/// Scan a `GET .../info/refs?service=git-upload-pack` response body and
/// return the 40-hex tip address.
pub fn parse_tip(body: &[u8]) -> Result<String> {
    let lines = pktline::decode_all(body)?;

    for line in lines {
        let PktLine::Data(payload) = line else {
            continue;
        };
        if payload.first() == Some(&b'#') {
            continue;
        }

        let text = String::from_utf8_lossy(&payload);
        if text.len() < 40 {
            continue;
        }
        let candidate = &text[..40];
        if !candidate.bytes().all(|b| b.is_ascii_hexdigit()) {
            continue;
        }

        if text.contains("HEAD") || text.contains("refs/heads/master") {
            return Ok(candidate.to_ascii_lowercase());
        }
    }

    Err(GitError::NoTip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_advertisement(tip: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(pktline::encode(b"# service=git-upload-pack\n"));
        body.extend(pktline::flush());
        let first_ref = format!(
            "{tip} HEAD\0multi_ack thin-pack side-band side-band-64k ofs-delta agent=git/2.40\n"
        );
        body.extend(pktline::encode(first_ref.as_bytes()));
        let second_ref = format!("{tip} refs/heads/master\n");
        body.extend(pktline::encode(second_ref.as_bytes()));
        body.extend(pktline::flush());
        body
    }

    #[test]
    fn parses_tip_from_head_line() {
        let tip = "a".repeat(40);
        let body = build_advertisement(&tip);
        assert_eq!(parse_tip(&body).unwrap(), tip);
    }

    #[test]
    fn fails_without_a_matching_line() {
        let mut body = Vec::new();
        body.extend(pktline::encode(b"# service=git-upload-pack\n"));
        body.extend(pktline::flush());
        body.extend(pktline::flush());
        assert!(matches!(parse_tip(&body), Err(GitError::NoTip)));
    }

    #[test]
    fn ignores_service_announcement_line() {
        let tip = "b".repeat(40);
        let mut body = Vec::new();
        body.extend(pktline::encode(format!("# {tip} HEAD\n").as_bytes()));
        body.extend(pktline::flush());
        body.extend(pktline::encode(format!("{tip} HEAD\0caps\n").as_bytes()));
        assert_eq!(parse_tip(&body).unwrap(), tip);
    }
}
