//! Content fingerprint of a working tree.
//!
//! Stable across platforms: paths are lowercased and sorted in canonical order,
//! line endings are folded to `\n`, and text is NFC-normalized before hashing.

use crate::error::Result;
use crate::scanner::FileScanner;
use fence_protocol::ordering::canonical_cmp;
use sha2::{Digest, Sha256};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

pub const FINGERPRINT_SCHEMA: &str = "fence-repo-fingerprint/v1";
const UNREADABLE: &str = "UNREADABLE";

/// Fingerprint input for one file: repo-relative path and content (`None` if unreadable)
pub struct FingerprintEntry<'a> {
    pub path: &'a str,
    pub content: Option<&'a [u8]>,
}

/// SHA-256 of line-ending and NFC normalized content.
///
/// Bytes that are not valid UTF-8 are hashed as they are.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    match std::str::from_utf8(content) {
        Ok(text) => {
            let folded = text.replace("\r\n", "\n").replace('\r', "\n");
            let normalized: String = folded.nfc().collect();
            hasher.update(normalized.as_bytes());
        }
        Err(_) => hasher.update(content),
    }
    format!("{:x}", hasher.finalize())
}

pub fn repo_fingerprint<'a>(entries: impl IntoIterator<Item = FingerprintEntry<'a>>) -> String {
    let mut lines: Vec<(String, String)> = entries
        .into_iter()
        .map(|entry| {
            let hash = entry
                .content
                .map_or_else(|| UNREADABLE.to_string(), content_hash);
            (entry.path.to_lowercase(), hash)
        })
        .collect();
    lines.sort_by(|a, b| canonical_cmp(&a.0, &b.0).then_with(|| canonical_cmp(&a.1, &b.1)));

    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_SCHEMA.as_bytes());
    hasher.update(b"\n");
    for (path, hash) in &lines {
        hasher.update(path.as_bytes());
        hasher.update(b"\n");
        hasher.update(hash.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Fingerprint every non-ignored file under `root`
pub fn fingerprint_working_tree(root: &Path) -> Result<String> {
    let files = FileScanner::new(root).scan();
    let contents: Vec<Option<Vec<u8>>> = files
        .iter()
        .map(|path| match std::fs::read(root.join(path.as_str())) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to read {path} for fingerprint: {e}");
                None
            }
        })
        .collect();

    let fingerprint = repo_fingerprint(files.iter().zip(&contents).map(|(path, content)| {
        FingerprintEntry {
            path: path.as_str(),
            content: content.as_deref(),
        }
    }));
    log::debug!("Fingerprinted {} files under {}", files.len(), root.display());
    Ok(fingerprint)
}
