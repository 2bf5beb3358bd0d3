//! Search ids: the lowercase, URL-safe keys fragments are indexed by.

use std::borrow::Cow;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Convert a symbol label into its search id.
///
/// The label is lowercased; ASCII letters and digits are kept and every
/// other byte becomes `_` followed by its two hex digits.
///
/// ```
/// use doxysearch::index::slug::search_id;
///
/// assert_eq!(search_id("makeInstance"), "makeinstance");
/// assert_eq!(search_id("main.cpp"), "main_2ecpp");
/// ```
pub fn search_id(label: &str) -> String {
    let lowered = label.to_lowercase();
    let mut id = String::with_capacity(lowered.len());
    for byte in lowered.bytes() {
        if byte.is_ascii_alphanumeric() {
            id.push(byte as char);
        } else {
            id.push('_');
            id.push(HEX[usize::from(byte >> 4)] as char);
            id.push(HEX[usize::from(byte & 0x0f)] as char);
        }
    }
    id
}

/// Whether `key` is the search id of `label`.
pub fn is_consistent(key: &str, label: &str) -> bool {
    key == search_id(label)
}

/// Decode the HTML entities Doxygen writes into labels and scopes.
///
/// Unknown entities are left untouched.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&#39;", '\''),
            ("&apos;", '\''),
        ]
        .into_iter()
        .find(|(entity, _)| rest.starts_with(entity));

        match decoded {
            Some((entity, ch)) => {
                out.push(ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
