//! Pronunciation lexicon (PLS) document parsing
//!
//! Only the parts of the format the rewriter needs are read: every
//! `<lexeme>` element with its `<grapheme>`, `<phoneme>` and `<alias>`
//! children. Element names are matched by local name, so documents with or
//! without the PLS namespace (or with a prefix) parse the same way.

use super::Lexeme;
use crate::{LexivoxError, Result};
use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Which child of a `<lexeme>` is currently collecting text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Grapheme,
    Phoneme,
    Alias,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"grapheme" => Some(Field::Grapheme),
            b"phoneme" => Some(Field::Phoneme),
            b"alias" => Some(Field::Alias),
            _ => None,
        }
    }
}

/// A `<lexeme>` element as read from the document, before validation
#[derive(Debug, Default)]
struct RawLexeme {
    graphemes: Vec<String>,
    phonemes: Vec<String>,
    alias: Option<String>,
}

impl RawLexeme {
    fn push(&mut self, field: Field, text: String) {
        match field {
            Field::Grapheme => self.graphemes.push(text),
            Field::Phoneme => self.phonemes.push(text),
            Field::Alias => {
                if self.alias.is_none() {
                    self.alias = Some(text);
                }
            }
        }
    }

    /// Validate into a lexeme, or `None` when the rule has to be dropped
    fn finish(self) -> Option<Lexeme> {
        let graphemes: Vec<String> = self
            .graphemes
            .into_iter()
            .filter(|g| !g.is_empty())
            .collect();

        if graphemes.is_empty() || self.phonemes.len() != 1 {
            return None;
        }

        let phoneme = normalize_phoneme(&self.phonemes[0]);
        if phoneme.is_empty() {
            return None;
        }

        Some(Lexeme {
            graphemes,
            phoneme,
            alias: self.alias.filter(|a| !a.is_empty()),
        })
    }
}

/// Normalize a phoneme string for downstream SSML readers
///
/// Colons become the IPA length mark, whitespace and hyphens are removed and
/// the `ʤ` ligature is spelled out as `d͡ʒ`. Several speech engines reject
/// these characters inside a `ph` attribute.
pub fn normalize_phoneme(phoneme: &str) -> String {
    let mut out = String::with_capacity(phoneme.len());
    for ch in phoneme.chars() {
        match ch {
            ':' => out.push('ː'),
            '-' => {}
            'ʤ' => out.push_str("d͡ʒ"),
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Result of parsing a lexicon document
#[derive(Debug, Default)]
pub struct ParsedLexicon {
    /// Rules that survived validation, in document order
    pub lexemes: Vec<Lexeme>,

    /// Number of `<lexeme>` elements dropped for lacking a usable phoneme
    pub dropped: usize,
}

/// Parse a pronunciation lexicon document
///
/// Fails with `MalformedDictionary` when the document has no root element or
/// is not well-formed XML. Rules without exactly one phoneme are dropped and
/// only counted.
pub fn parse_lexicon(source: &str) -> Result<ParsedLexicon> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedLexicon::default();
    let mut saw_root = false;
    let mut depth = 0usize;
    let mut current: Option<RawLexeme> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| LexivoxError::MalformedDictionary(format!("XML error: {}", e)))?;

        match event {
            Event::Start(e) => {
                saw_root = true;
                depth += 1;
                let name = e.local_name();
                if name.as_ref() == b"lexeme" {
                    current = Some(RawLexeme::default());
                } else if current.is_some() {
                    field = Field::from_name(name.as_ref());
                    text.clear();
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                let name = e.local_name();
                if name.as_ref() == b"lexeme" {
                    parsed.dropped += 1;
                } else if let (Some(lexeme), Some(f)) =
                    (current.as_mut(), Field::from_name(name.as_ref()))
                {
                    lexeme.push(f, String::new());
                }
            }
            Event::Text(t) => {
                if field.is_some() {
                    let unescaped = t.unescape().map_err(|e| {
                        LexivoxError::MalformedDictionary(format!("Bad text content: {}", e))
                    })?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(c) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                let name = e.local_name();
                if name.as_ref() == b"lexeme" {
                    if let Some(raw) = current.take() {
                        match raw.finish() {
                            Some(lexeme) => parsed.lexemes.push(lexeme),
                            None => parsed.dropped += 1,
                        }
                    }
                    field = None;
                } else if let (Some(f), Some(lexeme)) = (field, current.as_mut()) {
                    if Field::from_name(name.as_ref()) == Some(f) {
                        lexeme.push(f, text.trim().to_string());
                        field = None;
                        text.clear();
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(LexivoxError::MalformedDictionary(
            "document has no root element".to_string(),
        ));
    }
    if depth > 0 {
        return Err(LexivoxError::MalformedDictionary(format!(
            "document ends with {} unclosed elements",
            depth
        )));
    }

    debug!(
        "Parsed lexicon: {} rules kept, {} dropped",
        parsed.lexemes.len(),
        parsed.dropped
    );

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<lexicon version="1.0" xmlns="http://www.w3.org/2005/01/pronunciation-lexicon" alphabet="ipa" xml:lang="en">
    <lexeme>
        <grapheme>Bahamut</grapheme>
        <phoneme>bɑhɑmɪt</phoneme>
        <alias>Bahamoot</alias>
    </lexeme>
    <lexeme>
        <grapheme>Eorzea</grapheme>
        <grapheme>Eorzean</grapheme>
        <phoneme>eɪ ɔr:zɪː-ə</phoneme>
    </lexeme>
    <lexeme>
        <grapheme>Nophoneme</grapheme>
    </lexeme>
</lexicon>"#;

    #[test]
    fn test_normalize_phoneme() {
        assert_eq!(normalize_phoneme("eɪ ɔr:zɪː-ə"), "eɪɔrːzɪːə");
        assert_eq!(normalize_phoneme("ʤæ"), "d͡ʒæ");
        assert_eq!(normalize_phoneme(" - : "), "ː");
        assert_eq!(normalize_phoneme("  -- "), "");
    }

    #[test]
    fn test_parse_keeps_valid_rules() {
        let parsed = parse_lexicon(PLS).unwrap();
        assert_eq!(parsed.lexemes.len(), 2);
        assert_eq!(parsed.dropped, 1);

        let bahamut = &parsed.lexemes[0];
        assert_eq!(bahamut.graphemes, vec!["Bahamut"]);
        assert_eq!(bahamut.phoneme, "bɑhɑmɪt");
        assert_eq!(bahamut.alias.as_deref(), Some("Bahamoot"));

        let eorzea = &parsed.lexemes[1];
        assert_eq!(eorzea.graphemes, vec!["Eorzea", "Eorzean"]);
        assert_eq!(eorzea.phoneme, "eɪɔrːzɪːə");
        assert!(eorzea.alias.is_none());
    }

    #[test]
    fn test_parse_without_namespace() {
        let doc = "<lexicon><lexeme><grapheme>G&apos;raha</grapheme><phoneme>ɡɹɑhɑ</phoneme><alias/></lexeme></lexicon>";
        let parsed = parse_lexicon(doc).unwrap();
        assert_eq!(parsed.lexemes.len(), 1);
        assert_eq!(parsed.lexemes[0].graphemes, vec!["G'raha"]);
        assert!(parsed.lexemes[0].alias.is_none());
    }

    #[test]
    fn test_two_phonemes_drop_rule() {
        let doc = "<lexicon><lexeme><grapheme>a</grapheme><phoneme>x</phoneme><phoneme>y</phoneme></lexeme></lexicon>";
        let parsed = parse_lexicon(doc).unwrap();
        assert!(parsed.lexemes.is_empty());
        assert_eq!(parsed.dropped, 1);
    }

    #[test]
    fn test_empty_phoneme_after_normalization_is_dropped() {
        let doc = "<lexicon><lexeme><grapheme>a</grapheme><phoneme> - </phoneme></lexeme></lexicon>";
        let parsed = parse_lexicon(doc).unwrap();
        assert!(parsed.lexemes.is_empty());
        assert_eq!(parsed.dropped, 1);
    }

    #[test]
    fn test_no_root_is_malformed() {
        assert!(matches!(
            parse_lexicon(""),
            Err(LexivoxError::MalformedDictionary(_))
        ));
        assert!(matches!(
            parse_lexicon("<?xml version=\"1.0\"?>"),
            Err(LexivoxError::MalformedDictionary(_))
        ));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        assert!(matches!(
            parse_lexicon("<lexicon><lexeme></lexicon>"),
            Err(LexivoxError::MalformedDictionary(_))
        ));
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        assert!(matches!(
            parse_lexicon("<lexicon><lexeme>"),
            Err(LexivoxError::MalformedDictionary(_))
        ));
    }
}
