//! Canonical (binary) ordering.
//!
//! Every list that ends up in a report, a hash, or a cycle listing is ordered with
//! [`canonical_cmp`]: a comparison by UTF-16 code unit, the same order JavaScript's
//! `<` operator uses on strings. It is never locale-aware, so output is identical
//! across hosts.

use std::cmp::Ordering;

/// Compare two strings by UTF-16 code unit.
#[must_use]
pub fn canonical_cmp(a: &str, b: &str) -> Ordering {
    if a.is_ascii() && b.is_ascii() {
        return a.as_bytes().cmp(b.as_bytes());
    }
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Compare two optional strings; `None` sorts before any value.
#[must_use]
pub fn canonical_cmp_opt(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => canonical_cmp(a, b),
    }
}

/// Stable sort under [`canonical_cmp`].
pub fn canonical_sort<T: AsRef<str>>(items: &mut [T]) {
    items.sort_by(|a, b| canonical_cmp(a.as_ref(), b.as_ref()));
}

/// Stable sort of arbitrary items by a string key.
pub fn canonical_sort_by_key<T, K, F>(items: &mut [T], mut key: F)
where
    K: AsRef<str>,
    F: FnMut(&T) -> K,
{
    items.sort_by(|a, b| canonical_cmp(key(a).as_ref(), key(b).as_ref()));
}

#[must_use]
pub fn is_canonically_sorted<T: AsRef<str>>(items: &[T]) -> bool {
    items
        .windows(2)
        .all(|pair| canonical_cmp(pair[0].as_ref(), pair[1].as_ref()) != Ordering::Greater)
}
