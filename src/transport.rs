use bytes::Bytes;

use crate::config::Config;
use crate::error::{GitError, Result};
use crate::pktline;

const UPLOAD_PACK_SERVICE: &str = "git-upload-pack";
const UPLOAD_PACK_CONTENT_TYPE: &str = "application/x-git-upload-pack-request";

pub struct Transport {
    client: reqwest::blocking::Client,
    config: Config,
}

impl Transport {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// `GET <repo>.git/info/refs?service=git-upload-pack`.
    pub fn discover_refs(&self, repo_url: &str) -> Result<Bytes> {
        let url = format!("{}/info/refs?service={UPLOAD_PACK_SERVICE}", with_dot_git(repo_url));
        tracing::debug!(%url, "discovering refs");

        let resp = self
            .client
            .get(&url)
            .header("User-Agent", &self.config.user_agent)
            .send()?;

        if !resp.status().is_success() {
            return Err(GitError::BadAdvertisement(format!(
                "GET {url} returned {}",
                resp.status()
            )));
        }

        Ok(resp.bytes()?)
    }

    /// `POST <repo>.git/git-upload-pack` with the `want`/`done` body, returning
    /// the full response body (not yet scanned for the PACK offset).
    pub fn fetch_pack(&self, repo_url: &str, tip: &str) -> Result<Bytes> {
        let url = format!("{}/{UPLOAD_PACK_SERVICE}", with_dot_git(repo_url));
        let body = build_fetch_request(tip, &self.config);
        tracing::debug!(%url, tip, "requesting packfile");

        let resp = self
            .client
            .post(&url)
            .header("User-Agent", &self.config.user_agent)
            .header("Content-Type", UPLOAD_PACK_CONTENT_TYPE)
            .body(body)
            .send()?;

        if !resp.status().is_success() {
            return Err(GitError::Transport(
                resp.error_for_status().unwrap_err(),
            ));
        }

        Ok(resp.bytes()?)
    }
}

/// Append `.git` only if the URL doesn't already contain it.
fn with_dot_git(repo_url: &str) -> String {
    let repo_url = repo_url.trim_end_matches('/');
    if repo_url.ends_with(".git") {
        repo_url.to_string()
    } else {
        format!("{repo_url}.git")
    }
}

/// Build `<pkt>want <tip> <caps>\n0000<pkt>done\n`.
fn build_fetch_request(tip: &str, config: &Config) -> Vec<u8> {
    let want_line = format!("want {tip} {}\n", config.want_capabilities);
    let mut body = pktline::encode(want_line.as_bytes());
    body.extend(pktline::flush());
    body.extend(pktline::encode(b"done\n"));
    body
}

/// Locate the `PACK` signature in an upload-pack response body and return
/// the slice starting at it (the packfile proper, including trailer).
pub fn find_pack_start(data: &[u8]) -> Result<&[u8]> {
    data.windows(4)
        .position(|w| w == b"PACK")
        .map(|pos| &data[pos..])
        .ok_or(GitError::NoPack)
}
