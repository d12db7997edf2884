//! Slash-delimited field paths for validation diagnostics.
//!
//! Paths are rooted at `/` and grow one segment per nesting level:
//! `/`, `/apple`, `/apple/key101`, `/items/0`. They exist purely so that a
//! rejected record tells its owner *which field* broke determinism instead
//! of a shrug-shaped "something in there is unserializable".

/// The root path of every traversal.
pub const ROOT: &str = "/";

/// Append a child segment to a path.
///
/// The root path already ends with the separator, so `/` + `wallet` is
/// `/wallet`, while `/wallet` + `chain` is `/wallet/chain`.
pub fn child(path: &str, key: &str) -> String {
    if path.ends_with('/') {
        format!("{path}{key}")
    } else {
        format!("{path}/{key}")
    }
}
