use crate::error::{ProtocolError, Result};
use crate::ordering::{canonical_cmp, canonical_cmp_opt};
use crate::report::ViolationCause;
use std::cmp::Ordering;
use std::fmt;

/// Identity of a violation, independent of its proof.
///
/// The wire form `package:path:cause[:specifier]` is what `minimalCut` carries and
/// what downstream consumers parse; [`ViolationKey::encode`] and
/// [`ViolationKey::decode`] are the only places that know about the separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViolationKey {
    pub package: String,
    pub path: String,
    pub cause: ViolationCause,
    pub specifier: Option<String>,
}

const SEPARATOR: char = ':';

impl ViolationKey {
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(
            self.package.len() + self.path.len() + 32 + self.specifier.as_ref().map_or(0, String::len),
        );
        out.push_str(&self.package);
        out.push(SEPARATOR);
        out.push_str(&self.path);
        out.push(SEPARATOR);
        out.push_str(self.cause.as_str());
        if let Some(specifier) = &self.specifier {
            out.push(SEPARATOR);
            out.push_str(specifier);
        }
        out
    }

    /// Parse the wire form. The specifier is everything after the third separator,
    /// so specifiers such as `node:fs` survive a round trip. Package names and paths
    /// must not contain `:`.
    pub fn decode(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(4, SEPARATOR);
        let (Some(package), Some(path), Some(cause)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ProtocolError::MalformedKey(raw.to_string()));
        };
        if package.is_empty() || path.is_empty() {
            return Err(ProtocolError::MalformedKey(raw.to_string()));
        }
        let cause = ViolationCause::parse(cause)
            .ok_or_else(|| ProtocolError::UnknownCause(cause.to_string()))?;
        Ok(Self {
            package: package.to_string(),
            path: path.to_string(),
            cause,
            specifier: parts.next().map(str::to_string),
        })
    }
}

impl fmt::Display for ViolationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Ord for ViolationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(&self.package, &other.package)
            .then_with(|| canonical_cmp(&self.path, &other.path))
            .then_with(|| canonical_cmp(self.cause.as_str(), other.cause.as_str()))
            .then_with(|| canonical_cmp_opt(self.specifier.as_deref(), other.specifier.as_deref()))
    }
}

impl PartialOrd for ViolationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
