//! Tag-aware grapheme replacement
//!
//! Replacements are applied textually, one entry at a time, so a later and
//! shorter grapheme could otherwise land inside markup produced for an
//! earlier one (`Vanu` inside `<phoneme ph="…">Vanus</phoneme>`). Every byte
//! of the text is classified as part of an opening tag, part of a closing
//! tag, or plain text, and an occurrence is only replaced when it is plain
//! text and the next tag to its right is an opening tag (or there is none).

/// Classification of one byte of markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMarker {
    /// Outside any tag
    Text,
    /// Inside `<…>`
    Open,
    /// Inside `</…>`
    Close,
}

/// Classify every byte of `text`
///
/// `<`, `/` and `>` are ASCII, so scanning bytes is safe for UTF-8 input:
/// continuation bytes never match them. A `<` that is never closed marks the
/// rest of the text as an opening tag.
pub fn scan_tags(text: &str) -> Vec<TagMarker> {
    let bytes = text.as_bytes();
    let mut markers = vec![TagMarker::Text; bytes.len()];
    let mut current = TagMarker::Open;
    let mut in_tag = false;
    let mut after_lt = false;

    for (i, &b) in bytes.iter().enumerate() {
        if after_lt {
            after_lt = false;
            current = if b == b'/' {
                TagMarker::Close
            } else {
                TagMarker::Open
            };
            markers[i - 1] = current;
        }

        if in_tag {
            markers[i] = current;
        }

        if !in_tag && b == b'<' {
            in_tag = true;
            after_lt = true;
            markers[i] = current;
        }

        if b == b'>' {
            in_tag = false;
            markers[i] = current;
        }
    }

    markers
}

/// Index of the `>` closing a tag that starts at byte `start`
///
/// A tag is `<` or `</` followed by an ASCII letter and runs to the next
/// `>`, with no `<` in between. Returns `None` for anything else, such as
/// the `<` in `<3` or `a < b`.
pub fn tag_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }

    let mut name = start + 1;
    if bytes.get(name) == Some(&b'/') {
        name += 1;
    }
    if !bytes.get(name).map_or(false, u8::is_ascii_alphabetic) {
        return None;
    }

    let offset = bytes[name..].iter().position(|&b| b == b'<' || b == b'>')?;
    let end = name + offset;
    (bytes[end] == b'>').then_some(end)
}

/// Whether the occurrence `start..end` may be replaced
fn is_eligible(markers: &[TagMarker], start: usize, end: usize) -> bool {
    if markers[start..end].iter().any(|m| *m != TagMarker::Text) {
        return false;
    }

    match markers[end..].iter().find(|m| **m != TagMarker::Text) {
        Some(TagMarker::Close) => false,
        _ => true,
    }
}

/// Replace every eligible occurrence of `needle` in `text`
///
/// Occurrences are found left to right without overlap; an ineligible one is
/// skipped and the search resumes right after it.
pub fn replace_grapheme(text: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() || !text.contains(needle) {
        return text.to_string();
    }

    let markers = scan_tags(text);
    let mut out = String::with_capacity(text.len() + replacement.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = text[search..].find(needle) {
        let start = search + found;
        let end = start + needle.len();

        if is_eligible(&markers, start, end) {
            out.push_str(&text[copied..start]);
            out.push_str(replacement);
            copied = end;
        }
        search = end;
    }

    out.push_str(&text[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_tags() {
        use TagMarker::*;
        let markers = scan_tags("a<b>c</b>");
        assert_eq!(
            markers,
            vec![Text, Open, Open, Open, Text, Close, Close, Close, Close]
        );
    }

    #[test]
    fn test_unclosed_tag_marks_rest_open() {
        let markers = scan_tags("x < y");
        assert_eq!(markers[0], TagMarker::Text);
        assert!(markers[2..].iter().all(|m| *m == TagMarker::Open));
    }

    #[test]
    fn test_tag_end() {
        assert_eq!(tag_end("<b>x", 0), Some(2));
        assert_eq!(tag_end("x</b>", 1), Some(4));
        assert_eq!(tag_end("<phoneme ph=\"a\">", 0), Some(15));
        assert_eq!(tag_end("<3", 0), None);
        assert_eq!(tag_end("a < b", 2), None);
        assert_eq!(tag_end("<b <i>", 0), None);
        assert_eq!(tag_end("<b", 0), None);
        assert_eq!(tag_end("b>", 0), None);
    }

    #[test]
    fn test_replace_all_plain_occurrences() {
        assert_eq!(replace_grapheme("a b a", "a", "X"), "X b X");
    }

    #[test]
    fn test_not_found_is_unchanged() {
        assert_eq!(replace_grapheme("hello", "bye", "X"), "hello");
    }

    #[test]
    fn test_does_not_deep_replace() {
        let s = replace_grapheme("Vanu Vanus", "Vanus", "<phoneme>Vanus</phoneme>");
        let t = replace_grapheme(&s, "Vanu", "<phoneme>Vanu</phoneme>");
        assert_eq!(t, "<phoneme>Vanu</phoneme> <phoneme>Vanus</phoneme>");
    }

    #[test]
    fn test_skips_ineligible_and_continues() {
        let text = "<phoneme ph=\"x\">Vanus</phoneme> Vanu";
        let out = replace_grapheme(text, "Vanu", "V");
        assert_eq!(out, "<phoneme ph=\"x\">Vanus</phoneme> V");
    }

    #[test]
    fn test_never_replaces_inside_tag() {
        let text = "<phoneme ph=\"x\">a</phoneme> phoneme";
        let out = replace_grapheme(text, "phoneme", "P");
        assert_eq!(out, "<phoneme ph=\"x\">a</phoneme> P");
    }

    #[test]
    fn test_multibyte_text() {
        let out = replace_grapheme("Ala Mhigo – Ala", "Ala", "<p>Ala</p>");
        assert_eq!(out, "<p>Ala</p> Mhigo – <p>Ala</p>");
    }
}
