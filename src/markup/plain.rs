//! Flatten speech markup back into plain text
//!
//! Used by synthesizers that cannot read SSML. Aliases survive because they
//! were substituted as text; phoneme nodes fall back to their literal.

use once_cell::sync::Lazy;
use regex::Regex;

/// Any tag, opening or closing
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Entities produced by the rewriter and the common XML ones
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(amp|lt|gt|quot|apos);").expect("valid entity regex"));

/// Strip all tags from `markup` and decode basic entities
pub fn to_plain_text(markup: &str) -> String {
    let stripped = TAG.replace_all(markup, "");
    ENTITY
        .replace_all(&stripped, |caps: &regex::Captures| {
            let decoded = match &caps[1] {
                "amp" => "&",
                "lt" => "<",
                "gt" => ">",
                "quot" => "\"",
                _ => "'",
            };
            decoded.to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_envelope_and_phonemes() {
        let markup = "<speak version=\"1.0\" xml:lang=\"en-US\"><phoneme ph=\"bɔldˈɛˈsiɑn\">Baldesion</phoneme> Arsenal</speak>";
        assert_eq!(to_plain_text(markup), "Baldesion Arsenal");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(to_plain_text("<speak>Fish &amp; Chips</speak>"), "Fish & Chips");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(to_plain_text("nothing to do"), "nothing to do");
    }
}
