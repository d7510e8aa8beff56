//! Balanced JSON object scanner.
//!
//! A small state machine over the bytes of a possibly truncated JSON text:
//! `{`/`}` adjust a depth counter only in [`ScanState::Default`]; quotes
//! toggle [`ScanState::InString`]; a backslash inside a string moves to
//! [`ScanState::Escaped`] for exactly one byte. All structural characters are
//! ASCII, so byte offsets always land on `char` boundaries.

/// Lexical state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Default,
    InString,
    Escaped,
}

/// Return the first balanced object starting exactly at byte `start`.
///
/// `None` when `start` is out of range, does not point at `{`, or the object
/// has not been closed yet (the text is still growing).
#[must_use]
pub fn extract_balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut state = ScanState::Default;
    let mut depth: usize = 0;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        state = match (state, byte) {
            (ScanState::Default, b'"') | (ScanState::Escaped, _) => ScanState::InString,
            (ScanState::Default, b'{') => {
                depth += 1;
                ScanState::Default
            }
            (ScanState::Default, b'}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
                ScanState::Default
            }
            (ScanState::InString, b'\\') => ScanState::Escaped,
            (ScanState::InString, b'"') => ScanState::Default,
            (current, _) => current,
        };
    }
    None
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod tests;
