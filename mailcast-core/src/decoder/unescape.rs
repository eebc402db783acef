//! In-place compaction of the SNS `Message` string.
//!
//! SNS string-encodes the SES event once, so the raw `Message` text looks
//! like `"{\"eventType\":\"Send\", ...}\n"`. Rather than running a full JSON
//! string decoder, the webhook has always applied a narrower rule set,
//! which this module reproduces byte for byte:
//!
//! - one leading and one trailing `"` are stripped when present;
//! - a backslash is dropped;
//! - a backslash followed by `n` drops the `n` as well (the newline escape
//!   disappears, it does not become a newline);
//! - a backslash followed by a second backslash keeps the second one.
//!
//! Lookahead is bounded by the full buffer, not the quote-stripped end.

/// Compact `raw` in place and return the view holding the unescaped text.
///
/// The bytes past the returned view are left in an unspecified state.
pub fn unescape_in_place(raw: &mut [u8]) -> &[u8] {
    let len = raw.len();
    if len == 0 {
        return raw;
    }

    let start = usize::from(raw[0] == b'"');
    let mut end = len;
    if raw[len - 1] == b'"' {
        end -= 1;
    }
    if end <= start {
        return &raw[..0];
    }

    let mut removed = 0;
    let mut i = start;
    while i < end {
        if raw[i] == b'\\' {
            removed += 1;
            if i + 1 < len && raw[i + 1] == b'n' {
                i += 1;
                removed += 1;
            }
            if i + 1 < len && raw[i + 1] == b'\\' {
                i += 1;
                raw[i - removed] = raw[i];
            }
        } else {
            raw[i - removed] = raw[i];
        }
        i += 1;
    }

    let stop = end.saturating_sub(removed).max(start);
    &raw[start..stop]
}
