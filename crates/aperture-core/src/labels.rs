//! Label resolution: ambient propagated context merged with explicit labels.
//!
//! Ambient values arrive percent-encoded (baggage style). A value that does not
//! decode cleanly is skipped; it must never abort the check call. Explicit
//! labels always win on key collision.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Merge ambient key/value pairs with explicit labels.
///
/// Sources are applied in order, so with several ambient layers the later
/// layer overrides the earlier one before explicit labels are overlaid.
pub fn resolve_labels<I, K, V>(ambient: I, explicit: &HashMap<String, String>) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = HashMap::with_capacity(explicit.len());
    for (k, v) in ambient {
        if let Some(decoded) = decode_value(v.as_ref()) {
            out.insert(k.as_ref().to_string(), decoded);
        }
    }
    for (k, v) in explicit {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Strict percent-decoding (path style: `+` stays literal).
///
/// Returns `None` when a `%` is not followed by two hex digits or when the
/// decoded bytes are not UTF-8.
pub fn decode_value(raw: &str) -> Option<String> {
    let mut it = raw.bytes();
    while let Some(b) = it.next() {
        if b == b'%' {
            let hi = it.next()?;
            let lo = it.next()?;
            if !hi.is_ascii_hexdigit() || !lo.is_ascii_hexdigit() {
                return None;
            }
        }
    }
    percent_decode_str(raw).decode_utf8().ok().map(|s| s.into_owned())
}
